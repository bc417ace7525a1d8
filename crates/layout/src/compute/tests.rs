use super::*;
use crate::oracle::{LayeredOracle, OracleError, OracleLayout, Placement};
use tl_core::graph::materialize;
use tl_core::model::{Edge, LayoutConfig};
use tl_core::sample::{SampleShape, generate};

fn request_for(shape: SampleShape) -> LayoutRequest {
    let dataset = generate(shape);
    let graph = materialize(&dataset);
    LayoutRequest::from_dataset(&dataset, &graph.edges, LayoutConfig::default())
}

fn large_shape() -> SampleShape {
    SampleShape {
        categories: 5,
        subcategories_per_category: 5,
        leaves_per_subcategory: 10,
        explicit_edges: 300,
        intra_tier_relationships: 10,
        cross_tier_relationships: 5,
    }
}

fn run_inline<O: LayoutOracle + ?Sized>(
    request: LayoutRequest,
    oracle: &O,
    cancel: &CancelToken,
) -> (Result<ComputedLayout, ComputeError>, Vec<Progress>) {
    let mut seen = Vec::new();
    let result = {
        let mut sink = |p: Progress| seen.push(p);
        compute_guarded(
            request,
            oracle,
            &ProgressSchedule::default(),
            cancel,
            &mut sink,
        )
    };
    (result, seen)
}

fn phase_rank(phase: Phase) -> u8 {
    match phase {
        Phase::Initializing => 0,
        Phase::RegisteringNodes => 1,
        Phase::RegisteringEdges => 2,
        Phase::Solving => 3,
        Phase::Extracting => 4,
    }
}

#[test]
fn progress_is_monotonic_and_follows_the_schedule() {
    let request = request_for(large_shape());
    assert_eq!(request.node_count(), 280);
    let (result, seen) = run_inline(request, &LayeredOracle::default(), &CancelToken::new());
    let layout = result.expect("layout should succeed");
    assert_eq!(layout.positions.len(), 280);

    assert_eq!(seen[0].phase, Phase::Initializing);
    assert_eq!(seen[0].fraction, 0.0);
    for pair in seen.windows(2) {
        assert!(pair[0].fraction <= pair[1].fraction, "{pair:?}");
        assert!(phase_rank(pair[0].phase) <= phase_rank(pair[1].phase));
    }
    assert!(seen.iter().all(|p| (0.0..=1.0).contains(&p.fraction)));

    let node_reports: Vec<f64> = seen
        .iter()
        .filter(|p| p.phase == Phase::RegisteringNodes)
        .map(|p| p.fraction)
        .collect();
    assert_eq!(node_reports, vec![100.0 / 280.0 * 0.3, 200.0 / 280.0 * 0.3]);

    let first_edge = seen
        .iter()
        .find(|p| p.phase == Phase::RegisteringEdges)
        .unwrap();
    assert_eq!(first_edge.fraction, 0.4);
    assert_eq!(first_edge.message, "Adding edges...");

    let last = seen.last().unwrap();
    assert_eq!(last.phase, Phase::Extracting);
    assert_eq!(last.fraction, 0.9);
}

#[test]
fn oracle_centers_become_top_left_corners() {
    let mut request = request_for(SampleShape::default());
    request.leaves.truncate(1);
    request.categories.clear();
    request.subcategories.clear();
    let oracle = |req: &OracleRequest| -> Result<OracleLayout, OracleError> {
        Ok(req
            .nodes
            .iter()
            .map(|n| {
                (
                    n.id.clone(),
                    Placement {
                        x: 100.0,
                        y: 100.0,
                        width: n.width,
                        height: n.height,
                    },
                )
            })
            .collect())
    };

    let (result, _) = run_inline(request, &oracle, &CancelToken::new());
    let layout = result.unwrap();
    let leaf = &layout.leaves[0];
    assert_eq!(leaf.position, Some(Position::new(10.0, 75.0)));
    assert_eq!(layout.positions.position_of(&leaf.id), leaf.position);
}

#[test]
fn edges_with_unknown_endpoints_never_reach_the_oracle() {
    let mut request = request_for(SampleShape::default());
    let known = request.edges.len();
    request.edges.push(Edge::new("dangling", "node-0", "ghost", ""));
    request.edges.push(Edge::new("dangling-2", "ghost", "node-0", ""));

    let oracle = move |req: &OracleRequest| -> Result<OracleLayout, OracleError> {
        assert_eq!(req.edges.len(), known);
        LayeredOracle::default().layout(req)
    };
    let (result, _) = run_inline(request, &oracle, &CancelToken::new());
    assert!(result.is_ok());
}

#[test]
fn unplaced_node_is_an_error() {
    let request = request_for(SampleShape::default());
    let oracle = |_: &OracleRequest| -> Result<OracleLayout, OracleError> { Ok(OracleLayout::new()) };
    let (result, _) = run_inline(request, &oracle, &CancelToken::new());
    let err = result.unwrap_err();
    assert_eq!(err, ComputeError::MissingPlacement { id: "node-0".to_string() });
    assert_eq!(err.code(), "MISSING_PLACEMENT");
}

#[test]
fn oracle_failure_and_panic_are_reported() {
    let failing =
        |_: &OracleRequest| -> Result<OracleLayout, OracleError> { Err(OracleError::new("no")) };
    let (result, _) = run_inline(request_for(SampleShape::default()), &failing, &CancelToken::new());
    assert_eq!(result.unwrap_err().code(), "ORACLE_FAILED");

    let panicking = |_: &OracleRequest| -> Result<OracleLayout, OracleError> { panic!("kaboom") };
    let (result, _) = run_inline(request_for(SampleShape::default()), &panicking, &CancelToken::new());
    assert_eq!(result.unwrap_err(), ComputeError::Panicked("kaboom".to_string()));
}

#[test]
fn cancelled_token_stops_before_registration() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let (result, seen) = run_inline(
        request_for(SampleShape::default()),
        &LayeredOracle::default(),
        &cancel,
    );
    assert_eq!(result.unwrap_err(), ComputeError::Cancelled);
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].phase, Phase::Initializing);
}

#[test]
fn elapsed_deadline_times_out_inline() {
    let options = ComputeOptions {
        timeout: Some(Duration::ZERO),
        ..ComputeOptions::default()
    };
    let err = compute(
        request_for(SampleShape::default()),
        Arc::new(LayeredOracle::default()),
        ExecutionStrategy::Inline,
        &options,
        &mut |_: &Progress| {},
    )
    .unwrap_err();
    assert_eq!(err.code(), "TIMED_OUT");
}

#[test]
fn strategies_produce_identical_layouts() {
    let oracle = Arc::new(LayeredOracle::default());
    let options = ComputeOptions::default();
    let background = compute(
        request_for(large_shape()),
        oracle.clone(),
        ExecutionStrategy::Background,
        &options,
        &mut |_: &Progress| {},
    )
    .unwrap();
    let inline = compute(
        request_for(large_shape()),
        oracle,
        ExecutionStrategy::Inline,
        &options,
        &mut |_: &Progress| {},
    )
    .unwrap();
    assert_eq!(background, inline);
}
