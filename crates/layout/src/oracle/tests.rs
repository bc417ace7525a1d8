use super::*;
use tl_core::model::RankDirection;

fn node(id: &str, width: f64, height: f64) -> SizedNode {
    SizedNode {
        id: id.to_string(),
        width,
        height,
    }
}

fn request(nodes: Vec<SizedNode>, edges: &[(&str, &str)], direction: RankDirection) -> OracleRequest {
    OracleRequest {
        nodes,
        edges: edges
            .iter()
            .map(|(s, t)| (s.to_string(), t.to_string()))
            .collect(),
        direction,
        spacing: Spacing {
            node: 100.0,
            rank: 150.0,
            edge: 30.0,
            margin: 50.0,
        },
    }
}

#[test]
fn chain_is_ranked_top_to_bottom() {
    let req = request(
        vec![
            node("a", 180.0, 50.0),
            node("b", 180.0, 50.0),
            node("c", 180.0, 50.0),
        ],
        &[("a", "b"), ("b", "c")],
        RankDirection::TopToBottom,
    );
    let layout = LayeredOracle::default().layout(&req).unwrap();

    assert_eq!(layout.len(), 3);
    assert_eq!(layout["a"].y, 75.0);
    assert_eq!(layout["b"].y, 275.0);
    assert_eq!(layout["c"].y, 475.0);
    assert!(layout.values().all(|p| p.x == 140.0));
    assert_eq!(layout["a"].width, 180.0);
}

#[test]
fn siblings_share_a_rank_without_overlap() {
    let req = request(
        vec![
            node("root", 250.0, 80.0),
            node("left", 180.0, 50.0),
            node("right", 180.0, 50.0),
        ],
        &[("root", "left"), ("root", "right")],
        RankDirection::TopToBottom,
    );
    let layout = LayeredOracle::default().layout(&req).unwrap();

    assert_eq!(layout["left"].y, layout["right"].y);
    let gap = (layout["left"].x - layout["right"].x).abs();
    assert!(gap >= 180.0 + 100.0);
    assert!(layout["root"].y < layout["left"].y);
}

#[test]
fn cycles_and_self_loops_still_place_every_node() {
    let req = request(
        vec![
            node("a", 10.0, 10.0),
            node("b", 10.0, 10.0),
            node("c", 10.0, 10.0),
        ],
        &[("a", "b"), ("b", "c"), ("c", "a"), ("b", "b"), ("a", "ghost")],
        RankDirection::TopToBottom,
    );
    let layout = LayeredOracle::default().layout(&req).unwrap();
    assert_eq!(layout.len(), 3);
}

#[test]
fn horizontal_and_reversed_directions() {
    let nodes = vec![node("a", 180.0, 50.0), node("b", 180.0, 50.0)];

    let lr = LayeredOracle::default()
        .layout(&request(nodes.clone(), &[("a", "b")], RankDirection::LeftToRight))
        .unwrap();
    assert!(lr["a"].x < lr["b"].x);
    assert_eq!(lr["a"].y, lr["b"].y);

    let bt = LayeredOracle::default()
        .layout(&request(nodes, &[("a", "b")], RankDirection::BottomToTop))
        .unwrap();
    assert!(bt["a"].y > bt["b"].y);
}

#[test]
fn duplicate_ids_keep_the_first_size() {
    let req = request(
        vec![node("a", 10.0, 10.0), node("a", 99.0, 99.0)],
        &[],
        RankDirection::TopToBottom,
    );
    let layout = LayeredOracle::default().layout(&req).unwrap();
    assert_eq!(layout.len(), 1);
    assert_eq!(layout["a"].width, 10.0);
}

#[test]
fn invalid_geometry_is_rejected() {
    let mut req = request(vec![node("a", 10.0, 10.0)], &[], RankDirection::TopToBottom);
    req.spacing.rank = f64::NAN;
    assert!(LayeredOracle::default().layout(&req).is_err());

    let req = request(vec![node("a", -1.0, 10.0)], &[], RankDirection::TopToBottom);
    let err = LayeredOracle::default().layout(&req).unwrap_err();
    assert!(err.message.contains("\"a\""));
}

#[test]
fn empty_request_yields_empty_layout() {
    let req = request(Vec::new(), &[], RankDirection::TopToBottom);
    assert!(LayeredOracle::default().layout(&req).unwrap().is_empty());
}

#[test]
fn closures_act_as_oracles() {
    let failing = |_: &OracleRequest| -> Result<OracleLayout, OracleError> {
        Err(OracleError::new("boom"))
    };
    let req = request(Vec::new(), &[], RankDirection::TopToBottom);
    assert_eq!(failing.layout(&req).unwrap_err().to_string(), "layout oracle failed: boom");
}
