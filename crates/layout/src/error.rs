#![forbid(unsafe_code)]

use crate::oracle::OracleError;
use tl_core::graph::MaterializeError;

#[derive(Clone, Debug, PartialEq)]
pub enum ComputeError {
    Oracle(OracleError),
    MissingPlacement { id: String },
    Cancelled,
    TimedOut { after_ms: u128 },
    Panicked(String),
    WorkerSpawn(String),
    WorkerDisconnected,
}

impl ComputeError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Oracle(_) => "ORACLE_FAILED",
            Self::MissingPlacement { .. } => "MISSING_PLACEMENT",
            Self::Cancelled => "CANCELLED",
            Self::TimedOut { .. } => "TIMED_OUT",
            Self::Panicked(_) => "PANICKED",
            Self::WorkerSpawn(_) => "WORKER_SPAWN",
            Self::WorkerDisconnected => "WORKER_DISCONNECTED",
        }
    }
}

impl std::fmt::Display for ComputeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Oracle(err) => write!(f, "{err}"),
            Self::MissingPlacement { id } => write!(f, "layout oracle did not place node {id:?}"),
            Self::Cancelled => write!(f, "layout computation cancelled"),
            Self::TimedOut { after_ms } => {
                write!(f, "layout computation timed out after {after_ms}ms")
            }
            Self::Panicked(message) => write!(f, "layout computation panicked: {message}"),
            Self::WorkerSpawn(message) => write!(f, "failed to start layout worker: {message}"),
            Self::WorkerDisconnected => {
                write!(f, "layout worker exited without reporting a result")
            }
        }
    }
}

impl std::error::Error for ComputeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Oracle(err) => Some(err),
            _ => None,
        }
    }
}

impl From<OracleError> for ComputeError {
    fn from(value: OracleError) -> Self {
        Self::Oracle(value)
    }
}

#[derive(Debug)]
pub enum LayoutError {
    Materialize(MaterializeError),
    Compute(ComputeError),
    AlreadyRunning,
}

impl LayoutError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Materialize(err) => err.code(),
            Self::Compute(err) => err.code(),
            Self::AlreadyRunning => "ALREADY_RUNNING",
        }
    }
}

impl std::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Materialize(err) => write!(f, "{err}"),
            Self::Compute(err) => write!(f, "{err}"),
            Self::AlreadyRunning => write!(f, "a layout computation is already running"),
        }
    }
}

impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Materialize(err) => Some(err),
            Self::Compute(err) => Some(err),
            Self::AlreadyRunning => None,
        }
    }
}

impl From<MaterializeError> for LayoutError {
    fn from(value: MaterializeError) -> Self {
        Self::Materialize(value)
    }
}

impl From<ComputeError> for LayoutError {
    fn from(value: ComputeError) -> Self {
        Self::Compute(value)
    }
}
