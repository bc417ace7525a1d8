#![forbid(unsafe_code)]

//! A compact layered (Sugiyama-style) layout:
//!
//! 1. cycle removal by reversing DFS back edges;
//! 2. longest-path rank assignment;
//! 3. barycenter ordering sweeps within ranks;
//! 4. coordinate assignment, each rank centred on the widest one.
//!
//! No dummy nodes are inserted for edges spanning several ranks, so
//! `Spacing::edge` has no effect here.

use super::{LayoutOracle, OracleError, OracleLayout, OracleRequest, Placement, SizedNode};
use std::collections::{HashMap, VecDeque};
use tl_core::model::RankDirection;

pub const DEFAULT_SWEEPS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayeredOracle {
    /// Down+up barycenter passes.
    pub sweeps: usize,
}

impl Default for LayeredOracle {
    fn default() -> Self {
        Self {
            sweeps: DEFAULT_SWEEPS,
        }
    }
}

impl LayoutOracle for LayeredOracle {
    fn layout(&self, request: &OracleRequest) -> Result<OracleLayout, OracleError> {
        check_spacing(request)?;
        let graph = Graph::build(request)?;
        if graph.nodes.is_empty() {
            return Ok(OracleLayout::new());
        }
        let ranks = graph.ranks();
        let mut layers = graph.layers(&ranks);
        graph.order(&mut layers, self.sweeps);
        Ok(place(&graph, &layers, request))
    }
}

fn check_spacing(request: &OracleRequest) -> Result<(), OracleError> {
    let spacing = &request.spacing;
    for (name, value) in [
        ("node", spacing.node),
        ("rank", spacing.rank),
        ("edge", spacing.edge),
        ("margin", spacing.margin),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(OracleError::new(format!(
                "{name} spacing must be a finite non-negative number (got {value})"
            )));
        }
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

/// Index-based acyclic view of the request. Duplicate ids keep their first
/// occurrence; self-loops and edges to unknown ids are ignored.
struct Graph<'a> {
    nodes: Vec<&'a SizedNode>,
    succ: Vec<Vec<usize>>,
    pred: Vec<Vec<usize>>,
}

impl<'a> Graph<'a> {
    fn build(request: &'a OracleRequest) -> Result<Self, OracleError> {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(request.nodes.len());
        let mut nodes = Vec::with_capacity(request.nodes.len());
        for node in &request.nodes {
            if !(node.width.is_finite() && node.width >= 0.0)
                || !(node.height.is_finite() && node.height >= 0.0)
            {
                return Err(OracleError::new(format!(
                    "node {:?} has an invalid size {}x{}",
                    node.id, node.width, node.height
                )));
            }
            if index.contains_key(node.id.as_str()) {
                continue;
            }
            index.insert(node.id.as_str(), nodes.len());
            nodes.push(node);
        }

        let mut out: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        for (source, target) in &request.edges {
            let (Some(&s), Some(&t)) = (index.get(source.as_str()), index.get(target.as_str()))
            else {
                continue;
            };
            if s != t {
                out[s].push(t);
            }
        }

        let mut succ: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        let mut pred: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        for (s, t) in acyclic_edges(&out) {
            succ[s].push(t);
            pred[t].push(s);
        }
        Ok(Self { nodes, succ, pred })
    }

    /// Longest path from the sources.
    fn ranks(&self) -> Vec<usize> {
        let n = self.nodes.len();
        let mut indegree: Vec<usize> = self.pred.iter().map(Vec::len).collect();
        let mut rank = vec![0usize; n];
        let mut queue: VecDeque<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        while let Some(node) = queue.pop_front() {
            for &next in &self.succ[node] {
                rank[next] = rank[next].max(rank[node] + 1);
                indegree[next] -= 1;
                if indegree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }
        rank
    }

    fn layers(&self, ranks: &[usize]) -> Vec<Vec<usize>> {
        let depth = ranks.iter().copied().max().map_or(0, |max| max + 1);
        let mut layers = vec![Vec::new(); depth];
        for (node, &rank) in ranks.iter().enumerate() {
            layers[rank].push(node);
        }
        layers
    }

    fn order(&self, layers: &mut [Vec<usize>], sweeps: usize) {
        let mut slot = vec![0usize; self.nodes.len()];
        for layer in layers.iter() {
            for (i, &node) in layer.iter().enumerate() {
                slot[node] = i;
            }
        }
        for _ in 0..sweeps {
            for r in 1..layers.len() {
                reorder(&mut layers[r], &self.pred, &mut slot);
            }
            for r in (0..layers.len().saturating_sub(1)).rev() {
                reorder(&mut layers[r], &self.succ, &mut slot);
            }
        }
    }
}

/// Edges with DFS back edges reversed, so the result has no cycles.
fn acyclic_edges(out: &[Vec<usize>]) -> Vec<(usize, usize)> {
    let mut state = vec![Visit::New; out.len()];
    let mut edges = Vec::new();
    for root in 0..out.len() {
        if state[root] != Visit::New {
            continue;
        }
        state[root] = Visit::Active;
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            match out[node].get(frame.1).copied() {
                Some(target) => {
                    frame.1 += 1;
                    match state[target] {
                        Visit::Active => edges.push((target, node)),
                        Visit::Done => edges.push((node, target)),
                        Visit::New => {
                            edges.push((node, target));
                            state[target] = Visit::Active;
                            stack.push((target, 0));
                        }
                    }
                }
                None => {
                    state[node] = Visit::Done;
                    stack.pop();
                }
            }
        }
    }
    edges
}

fn reorder(layer: &mut [usize], neighbours: &[Vec<usize>], slot: &mut [usize]) {
    let mut keyed: Vec<(f64, usize)> = layer
        .iter()
        .map(|&node| {
            let around = &neighbours[node];
            let key = if around.is_empty() {
                slot[node] as f64
            } else {
                around.iter().map(|&n| slot[n] as f64).sum::<f64>() / around.len() as f64
            };
            (key, node)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    for (i, (_, node)) in keyed.into_iter().enumerate() {
        layer[i] = node;
        slot[node] = i;
    }
}

fn place(graph: &Graph<'_>, layers: &[Vec<usize>], request: &OracleRequest) -> OracleLayout {
    let spacing = request.spacing;
    let horizontal = request.direction.is_horizontal();
    // (along the rank axis, across it)
    let extent = |node: &SizedNode| {
        if horizontal {
            (node.width, node.height)
        } else {
            (node.height, node.width)
        }
    };

    let thickness: Vec<f64> = layers
        .iter()
        .map(|layer| {
            layer
                .iter()
                .map(|&n| extent(graph.nodes[n]).0)
                .fold(0.0, f64::max)
        })
        .collect();
    let breadth: Vec<f64> = layers
        .iter()
        .map(|layer| {
            let sizes: f64 = layer.iter().map(|&n| extent(graph.nodes[n]).1).sum();
            sizes + spacing.node * layer.len().saturating_sub(1) as f64
        })
        .collect();
    let widest = breadth.iter().copied().fold(0.0, f64::max);
    let total_along = 2.0 * spacing.margin
        + thickness.iter().sum::<f64>()
        + spacing.rank * layers.len().saturating_sub(1) as f64;
    let reversed = matches!(
        request.direction,
        RankDirection::BottomToTop | RankDirection::RightToLeft
    );

    let mut layout = OracleLayout::with_capacity(graph.nodes.len());
    let mut along = spacing.margin;
    for (r, layer) in layers.iter().enumerate() {
        let mut center_along = along + thickness[r] / 2.0;
        if reversed {
            center_along = total_along - center_along;
        }
        let mut cursor = spacing.margin + (widest - breadth[r]) / 2.0;
        for &n in layer {
            let node = graph.nodes[n];
            let across = extent(node).1;
            let center_across = cursor + across / 2.0;
            cursor += across + spacing.node;
            let (x, y) = if horizontal {
                (center_along, center_across)
            } else {
                (center_across, center_along)
            };
            layout.insert(
                node.id.clone(),
                Placement {
                    x,
                    y,
                    width: node.width,
                    height: node.height,
                },
            );
        }
        along += thickness[r] + spacing.rank;
    }
    layout
}
