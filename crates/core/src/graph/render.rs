#![forbid(unsafe_code)]

use crate::model::{Category, Edge, EdgeClass, LeafNode, Position, Subcategory, Tier, TierNode};
use serde::Serialize;
use std::collections::HashSet;

/// Perpendicular offset applied to each curve of a bidirectional pair.
pub const BIDIRECTIONAL_CURVE_OFFSET: f64 = 20.0;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderNode {
    pub id: String,
    pub position: Position,
    pub label: String,
    pub tier: Tier,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: String,
    pub class: EdgeClass,
    /// A `target -> source` edge exists too.
    pub bidirectional: bool,
    /// Which of the two curves of a bidirectional pair this edge is.
    pub forward: bool,
}

impl RenderEdge {
    pub fn curve_offset(&self) -> f64 {
        match (self.bidirectional, self.forward) {
            (false, _) => 0.0,
            (true, true) => BIDIRECTIONAL_CURVE_OFFSET,
            (true, false) => -BIDIRECTIONAL_CURVE_OFFSET,
        }
    }
}

/// Structural hand-off to the drawing side: positions and hints, no styling.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RenderGraph {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
}

pub fn project(
    leaves: &[LeafNode],
    categories: &[Category],
    subcategories: &[Subcategory],
    edges: &[Edge],
) -> RenderGraph {
    let mut nodes = Vec::with_capacity(leaves.len() + categories.len() + subcategories.len());
    push_nodes(&mut nodes, leaves);
    push_nodes(&mut nodes, categories);
    push_nodes(&mut nodes, subcategories);

    let pairs = bidirectional_pairs(edges);
    let edges = edges
        .iter()
        .map(|edge| {
            let key = (edge.source.as_str(), edge.target.as_str());
            RenderEdge {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                label: edge.label.clone(),
                class: edge.class,
                bidirectional: pairs.contains(&key),
                forward: is_forward(&edge.source, &edge.target),
            }
        })
        .collect();

    RenderGraph { nodes, edges }
}

/// `"{source}-{target}" < "{target}-{source}"`, compared by UTF-16 code
/// unit like the drawing side does, without building either string.
pub fn is_forward(source: &str, target: &str) -> bool {
    joined(source, target).lt(joined(target, source))
}

fn joined<'a>(a: &'a str, b: &'a str) -> impl Iterator<Item = u16> + 'a {
    a.encode_utf16()
        .chain("-".encode_utf16())
        .chain(b.encode_utf16())
}

fn push_nodes<T: TierNode>(out: &mut Vec<RenderNode>, nodes: &[T]) {
    out.extend(nodes.iter().map(|node| RenderNode {
        id: node.id().to_string(),
        position: node.position().unwrap_or_default(),
        label: node.label().to_string(),
        tier: T::TIER,
    }));
}

/// Directed `(source, target)` keys that have a reverse counterpart.
/// Self-loops never pair with themselves.
fn bidirectional_pairs(edges: &[Edge]) -> HashSet<(&str, &str)> {
    let mut seen = HashSet::new();
    let mut pairs = HashSet::new();
    for edge in edges {
        let key = (edge.source.as_str(), edge.target.as_str());
        if key.0 == key.1 {
            continue;
        }
        let reverse = (key.1, key.0);
        seen.insert(key);
        if seen.contains(&reverse) {
            pairs.insert(key);
            pairs.insert(reverse);
        }
    }
    pairs
}
