#![forbid(unsafe_code)]

//! The layout pipeline shared by every execution strategy.

use crate::error::ComputeError;
use crate::oracle::{LayoutOracle, OracleRequest, SizedNode, Spacing};
use crate::progress::{Phase, Progress, ProgressReporter, ProgressSchedule};
use crate::worker::BackgroundJob;
use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tl_core::model::{
    Category, Edge, GraphDataset, LayoutConfig, LayoutPositions, LeafNode, NodePosition, Position,
    Size, Subcategory, TierNode,
};
use tracing::debug;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ComputeState {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

impl ComputeState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ComputeState::Completed | ComputeState::Failed)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionStrategy {
    #[default]
    Background,
    Inline,
}

/// Everything one computation needs, owned so it can move to a worker.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutRequest {
    pub leaves: Vec<LeafNode>,
    pub categories: Vec<Category>,
    pub subcategories: Vec<Subcategory>,
    pub edges: Vec<Edge>,
    pub config: LayoutConfig,
}

impl LayoutRequest {
    /// Nodes from `dataset`, edges from materialization.
    pub fn from_dataset(dataset: &GraphDataset, edges: &[Edge], config: LayoutConfig) -> Self {
        Self {
            leaves: dataset.leaves.clone(),
            categories: dataset.categories.clone(),
            subcategories: dataset.subcategories.clone(),
            edges: edges.to_vec(),
            config,
        }
    }

    pub fn node_count(&self) -> usize {
        self.leaves.len() + self.categories.len() + self.subcategories.len()
    }
}

/// Nodes of every tier with positions set, plus the same positions in
/// cacheable form.
#[derive(Clone, Debug, PartialEq)]
pub struct ComputedLayout {
    pub leaves: Vec<LeafNode>,
    pub categories: Vec<Category>,
    pub subcategories: Vec<Subcategory>,
    pub positions: LayoutPositions,
}

/// Cooperative cancellation, checked between pipeline phases. An optional
/// deadline turns into [`ComputeError::TimedOut`] at the next check.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<(Instant, Duration)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancelled: Arc::default(),
            deadline: Some((Instant::now() + timeout, timeout)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline.map(|(at, _)| at)
    }

    pub fn check(&self) -> Result<(), ComputeError> {
        if self.is_cancelled() {
            return Err(ComputeError::Cancelled);
        }
        match self.deadline {
            Some((at, timeout)) if Instant::now() >= at => Err(ComputeError::TimedOut {
                after_ms: timeout.as_millis(),
            }),
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ComputeOptions {
    pub schedule: ProgressSchedule,
    pub timeout: Option<Duration>,
}

/// Runs the pipeline on the calling thread.
///
/// Reports, in order: initializing (0.0), node registration up to
/// `nodes_end`, edge registration from `edges_start` to `edges_end`, solving,
/// and extraction. Edges whose endpoints are not registered nodes are
/// skipped. Oracle placements are centers; the returned positions are
/// top-left corners.
pub fn compute_layout<O: LayoutOracle + ?Sized>(
    request: LayoutRequest,
    oracle: &O,
    schedule: &ProgressSchedule,
    cancel: &CancelToken,
    sink: &mut dyn FnMut(Progress),
) -> Result<ComputedLayout, ComputeError> {
    let mut progress = ProgressReporter::new(sink);
    progress.report(Phase::Initializing, 0.0, "Initializing layout...");
    cancel.check()?;

    let LayoutRequest {
        mut leaves,
        mut categories,
        mut subcategories,
        edges,
        config,
    } = request;

    let total_nodes = leaves.len() + categories.len() + subcategories.len();
    let mut nodes = Vec::with_capacity(total_nodes);
    let mut registered: HashSet<String> = HashSet::with_capacity(total_nodes);
    let mut register = |id: &str, size: Size| {
        registered.insert(id.to_string());
        nodes.push(SizedNode {
            id: id.to_string(),
            width: size.width,
            height: size.height,
        });
        let done = nodes.len();
        if schedule.reports_at(done) {
            progress.report(
                Phase::RegisteringNodes,
                done as f64 / total_nodes as f64 * schedule.nodes_end,
                format!("Adding nodes... {done}/{total_nodes}"),
            );
        }
    };
    for leaf in &leaves {
        register(leaf.id(), config.size_for(LeafNode::TIER));
    }
    for category in &categories {
        register(category.id(), config.size_for(Category::TIER));
    }
    for subcategory in &subcategories {
        register(subcategory.id(), config.size_for(Subcategory::TIER));
    }
    cancel.check()?;

    progress.report(Phase::RegisteringEdges, schedule.edges_start, "Adding edges...");
    let edge_span = schedule.edges_end - schedule.edges_start;
    let mut oracle_edges = Vec::with_capacity(edges.len());
    let mut skipped = 0usize;
    for (index, edge) in edges.iter().enumerate() {
        if registered.contains(&edge.source) && registered.contains(&edge.target) {
            oracle_edges.push((edge.source.clone(), edge.target.clone()));
        } else {
            skipped += 1;
        }
        if schedule.reports_at(index) {
            progress.report(
                Phase::RegisteringEdges,
                schedule.edges_start + index as f64 / edges.len() as f64 * edge_span,
                format!("Adding edges... {index}/{}", edges.len()),
            );
        }
    }
    if skipped > 0 {
        debug!(skipped, "skipped edges with unregistered endpoints");
    }
    cancel.check()?;

    progress.report(Phase::Solving, schedule.solving, "Calculating layout...");
    let oracle_request = OracleRequest {
        nodes,
        edges: oracle_edges,
        direction: config.direction,
        spacing: Spacing {
            node: config.node_spacing,
            rank: config.rank_spacing,
            edge: config.edge_separation,
            margin: config.margin,
        },
    };
    let placed = oracle.layout(&oracle_request)?;
    cancel.check()?;

    progress.report(Phase::Extracting, schedule.extracting, "Extracting positions...");
    let place = |id: &str| -> Result<NodePosition, ComputeError> {
        let placement = placed
            .get(id)
            .ok_or_else(|| ComputeError::MissingPlacement { id: id.to_string() })?;
        Ok(NodePosition {
            id: id.to_string(),
            position: Position::new(
                placement.x - placement.width / 2.0,
                placement.y - placement.height / 2.0,
            ),
        })
    };
    let positions = LayoutPositions {
        leaf_positions: place_tier(&mut leaves, &place)?,
        category_positions: place_tier(&mut categories, &place)?,
        subcategory_positions: place_tier(&mut subcategories, &place)?,
    };

    Ok(ComputedLayout {
        leaves,
        categories,
        subcategories,
        positions,
    })
}

fn place_tier<T: TierNode>(
    nodes: &mut [T],
    place: &dyn Fn(&str) -> Result<NodePosition, ComputeError>,
) -> Result<Vec<NodePosition>, ComputeError> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes.iter_mut() {
        let entry = place(node.id())?;
        node.set_position(entry.position);
        out.push(entry);
    }
    Ok(out)
}

/// [`compute_layout`] with oracle panics reported as
/// [`ComputeError::Panicked`].
pub(crate) fn compute_guarded<O: LayoutOracle + ?Sized>(
    request: LayoutRequest,
    oracle: &O,
    schedule: &ProgressSchedule,
    cancel: &CancelToken,
    sink: &mut dyn FnMut(Progress),
) -> Result<ComputedLayout, ComputeError> {
    catch_unwind(AssertUnwindSafe(|| {
        compute_layout(request, oracle, schedule, cancel, sink)
    }))
    .unwrap_or_else(|payload| Err(ComputeError::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// One computation with the chosen strategy. `on_progress` runs on the
/// calling thread in both strategies.
pub fn compute<O: LayoutOracle + 'static>(
    request: LayoutRequest,
    oracle: Arc<O>,
    strategy: ExecutionStrategy,
    options: &ComputeOptions,
    on_progress: &mut dyn FnMut(&Progress),
) -> Result<ComputedLayout, ComputeError> {
    match strategy {
        ExecutionStrategy::Background => {
            BackgroundJob::spawn(request, oracle, options.schedule, options.timeout)?
                .wait(on_progress)
        }
        ExecutionStrategy::Inline => {
            let cancel = options
                .timeout
                .map_or_else(CancelToken::new, CancelToken::with_timeout);
            let mut sink = |progress: Progress| on_progress(&progress);
            compute_guarded(request, &*oracle, &options.schedule, &cancel, &mut sink)
        }
    }
}

#[cfg(test)]
mod tests;
