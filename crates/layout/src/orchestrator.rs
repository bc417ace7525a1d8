#![forbid(unsafe_code)]

//! Sequences one layout request: materialize, consult the cache, compute
//! (background first, synchronous on failure), save, hand off.

use crate::compute::{
    ComputeOptions, ComputeState, ComputedLayout, ExecutionStrategy, LayoutRequest, compute,
};
use crate::error::{ComputeError, LayoutError};
use crate::oracle::LayoutOracle;
use crate::progress::{Progress, ProgressSchedule};
use std::sync::Arc;
use std::time::Duration;
use tl_core::graph::{MaterializeOptions, MaterializedGraph, RenderGraph, materialize_with, project};
use tl_core::model::{
    Category, Edge, GraphDataset, LayoutConfig, LayoutPositions, LeafNode, Subcategory,
};
use tl_storage::{Clock, KvStore, LayoutCache, SystemClock};
use tracing::{debug, info, warn};

/// Receives status lines and progress while a layout runs.
pub trait LayoutObserver {
    fn status(&mut self, _message: &str) {}
    fn progress(&mut self, _progress: &Progress) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl LayoutObserver for NoopObserver {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutSource {
    Cache,
    Background,
    Inline,
    SynchronousFallback,
}

impl LayoutSource {
    pub fn as_str(self) -> &'static str {
        match self {
            LayoutSource::Cache => "cache",
            LayoutSource::Background => "background",
            LayoutSource::Inline => "inline",
            LayoutSource::SynchronousFallback => "synchronous_fallback",
        }
    }
}

/// Every node positioned, plus the materialized edges.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionedGraph {
    pub leaves: Vec<LeafNode>,
    pub categories: Vec<Category>,
    pub subcategories: Vec<Subcategory>,
    pub edges: Vec<Edge>,
}

impl PositionedGraph {
    pub fn node_count(&self) -> usize {
        self.leaves.len() + self.categories.len() + self.subcategories.len()
    }

    pub fn render(&self) -> RenderGraph {
        project(
            &self.leaves,
            &self.categories,
            &self.subcategories,
            &self.edges,
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutOutcome {
    pub source: LayoutSource,
    pub positions: LayoutPositions,
    pub graph: PositionedGraph,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrchestratorOptions {
    pub strategy: ExecutionStrategy,
    /// Applies to the primary computation only; the synchronous fallback
    /// always runs to completion.
    pub timeout: Option<Duration>,
    pub schedule: ProgressSchedule,
    pub use_cache: bool,
    pub materialize: MaterializeOptions,
    pub config: LayoutConfig,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            strategy: ExecutionStrategy::Background,
            timeout: None,
            schedule: ProgressSchedule::default(),
            use_cache: true,
            materialize: MaterializeOptions::default(),
            config: LayoutConfig::default(),
        }
    }
}

/// Per-session state, owned by the caller.
#[derive(Clone, Debug)]
pub struct SessionContext {
    dataset: GraphDataset,
    materialized: Option<MaterializedGraph>,
    state: ComputeState,
    outcome: Option<LayoutOutcome>,
}

impl SessionContext {
    pub fn new(dataset: GraphDataset) -> Self {
        Self {
            dataset,
            materialized: None,
            state: ComputeState::Idle,
            outcome: None,
        }
    }

    pub fn dataset(&self) -> &GraphDataset {
        &self.dataset
    }

    pub fn materialized(&self) -> Option<&MaterializedGraph> {
        self.materialized.as_ref()
    }

    pub fn state(&self) -> ComputeState {
        self.state
    }

    pub fn outcome(&self) -> Option<&LayoutOutcome> {
        self.outcome.as_ref()
    }

    /// Forgets the result and state so the next run lays out again. The
    /// materialized edges are kept.
    pub fn reset(&mut self) {
        self.state = ComputeState::Idle;
        self.outcome = None;
    }

    fn complete(&mut self, outcome: LayoutOutcome) -> LayoutOutcome {
        self.state = ComputeState::Completed;
        self.outcome = Some(outcome.clone());
        outcome
    }
}

pub struct Orchestrator<S, O, C = SystemClock> {
    cache: LayoutCache<S, C>,
    oracle: Arc<O>,
    options: OrchestratorOptions,
}

impl<S, O, C> Orchestrator<S, O, C>
where
    S: KvStore,
    O: LayoutOracle + 'static,
    C: Clock,
{
    pub fn new(cache: LayoutCache<S, C>, oracle: Arc<O>, options: OrchestratorOptions) -> Self {
        Self {
            cache,
            oracle,
            options,
        }
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    pub fn cache(&self) -> &LayoutCache<S, C> {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut LayoutCache<S, C> {
        &mut self.cache
    }

    pub fn run(
        &mut self,
        session: &mut SessionContext,
        observer: &mut dyn LayoutObserver,
    ) -> Result<LayoutOutcome, LayoutError> {
        if session.state == ComputeState::Running {
            return Err(LayoutError::AlreadyRunning);
        }
        if let Some(outcome) = &session.outcome {
            debug!(source = outcome.source.as_str(), "session already laid out");
            return Ok(outcome.clone());
        }

        if session.materialized.is_none() {
            let graph = match materialize_with(&session.dataset, self.options.materialize) {
                Ok(graph) => graph,
                Err(err) => {
                    session.state = ComputeState::Failed;
                    return Err(err.into());
                }
            };
            info!(
                edges = graph.edge_count(),
                dropped = graph.dropped_count(),
                "materialized graph edges"
            );
            session.materialized = Some(graph);
        }
        let edges = session
            .materialized
            .as_ref()
            .map(|graph| graph.edges.clone())
            .unwrap_or_default();

        if self.options.use_cache {
            observer.status("Checking cache...");
            if let Some(outcome) = self.from_cache(&session.dataset, &edges) {
                observer.status("Layout loaded from cache");
                return Ok(session.complete(outcome));
            }
        }

        session.state = ComputeState::Running;
        let request =
            LayoutRequest::from_dataset(&session.dataset, &edges, self.options.config.clone());
        match self.compute(request, observer) {
            Ok((computed, source)) => {
                if self.options.use_cache {
                    self.cache.save_dataset(&session.dataset, &computed.positions);
                }
                info!(
                    source = source.as_str(),
                    positions = computed.positions.len(),
                    "layout ready"
                );
                observer.status("Layout complete");
                let ComputedLayout {
                    leaves,
                    categories,
                    subcategories,
                    positions,
                } = computed;
                Ok(session.complete(LayoutOutcome {
                    source,
                    positions,
                    graph: PositionedGraph {
                        leaves,
                        categories,
                        subcategories,
                        edges,
                    },
                }))
            }
            Err(err) => {
                session.state = ComputeState::Failed;
                observer.status("Layout failed");
                Err(err.into())
            }
        }
    }

    /// A cached layout applied to fresh copies of the nodes. An entry that
    /// does not cover every node is treated as a miss and cleared.
    fn from_cache(&mut self, dataset: &GraphDataset, edges: &[Edge]) -> Option<LayoutOutcome> {
        let cached = self.cache.load_dataset(dataset)?;
        let mut leaves = dataset.leaves.clone();
        let mut categories = dataset.categories.clone();
        let mut subcategories = dataset.subcategories.clone();
        if let Err(missing) = cached.apply(&mut leaves, &mut categories, &mut subcategories) {
            warn!(%missing, "cached layout does not cover the graph; clearing");
            self.cache.clear();
            return None;
        }
        let positions = LayoutPositions::capture(&leaves, &categories, &subcategories).ok()?;
        Some(LayoutOutcome {
            source: LayoutSource::Cache,
            positions,
            graph: PositionedGraph {
                leaves,
                categories,
                subcategories,
                edges: edges.to_vec(),
            },
        })
    }

    fn compute(
        &self,
        request: LayoutRequest,
        observer: &mut dyn LayoutObserver,
    ) -> Result<(ComputedLayout, LayoutSource), ComputeError> {
        let options = ComputeOptions {
            schedule: self.options.schedule,
            timeout: self.options.timeout,
        };
        match self.options.strategy {
            ExecutionStrategy::Inline => {
                observer.status("Calculating layout...");
                compute(
                    request,
                    self.oracle.clone(),
                    ExecutionStrategy::Inline,
                    &options,
                    &mut |progress: &Progress| observer.progress(progress),
                )
                .map(|layout| (layout, LayoutSource::Inline))
            }
            ExecutionStrategy::Background => {
                observer.status("Calculating layout in background...");
                let background = compute(
                    request.clone(),
                    self.oracle.clone(),
                    ExecutionStrategy::Background,
                    &options,
                    &mut |progress: &Progress| observer.progress(progress),
                );
                match background {
                    Ok(layout) => Ok((layout, LayoutSource::Background)),
                    Err(err) => {
                        warn!(
                            code = err.code(),
                            error = %err,
                            "background layout failed; computing synchronously"
                        );
                        observer.status("Error calculating layout, trying fallback...");
                        let fallback = ComputeOptions {
                            timeout: None,
                            ..options
                        };
                        compute(
                            request,
                            self.oracle.clone(),
                            ExecutionStrategy::Inline,
                            &fallback,
                            &mut |progress: &Progress| observer.progress(progress),
                        )
                        .map(|layout| (layout, LayoutSource::SynchronousFallback))
                    }
                }
            }
        }
    }
}
