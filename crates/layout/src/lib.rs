#![forbid(unsafe_code)]

//! Layout computation for tiered graphs: an oracle seam, the progress
//! protocol shared by the background and inline paths, and the orchestrator
//! that sequences cache, computation and fallback.

mod compute;
mod error;
pub mod oracle;
mod orchestrator;
mod progress;
mod worker;

pub use compute::{
    CancelToken, ComputeOptions, ComputeState, ComputedLayout, ExecutionStrategy, LayoutRequest,
    compute, compute_layout,
};
pub use error::{ComputeError, LayoutError};
pub use oracle::{
    LayeredOracle, LayoutOracle, OracleError, OracleLayout, OracleRequest, Placement, SizedNode,
    Spacing,
};
pub use orchestrator::{
    LayoutObserver, LayoutOutcome, LayoutSource, NoopObserver, Orchestrator, OrchestratorOptions,
    PositionedGraph, SessionContext,
};
pub use progress::{Phase, Progress, ProgressSchedule};
pub use worker::{BackgroundJob, WORKER_THREAD_NAME, WorkerEvent};
