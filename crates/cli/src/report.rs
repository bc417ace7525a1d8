#![forbid(unsafe_code)]

use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tl_core::graph::{MaterializedGraph, RenderGraph};
use tl_core::model::LayoutPositions;
use tl_layout::{LayoutObserver, LayoutOutcome, Progress};
use tl_storage::CacheInfo;
use tracing::{debug, info};

/// Forwards orchestrator status and progress to the log.
pub(crate) struct LogObserver;

impl LayoutObserver for LogObserver {
    fn status(&mut self, message: &str) {
        info!(status = message, "layout");
    }

    fn progress(&mut self, progress: &Progress) {
        debug!(
            fraction = progress.fraction,
            phase = progress.phase.as_str(),
            "{}",
            progress.message
        );
    }
}

pub(crate) fn ts_ms_to_rfc3339(ts_ms: i64) -> String {
    let nanos = (ts_ms as i128) * 1_000_000i128;
    let dt = OffsetDateTime::from_unix_timestamp_nanos(nanos).unwrap_or(OffsetDateTime::UNIX_EPOCH);
    dt.format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CacheInfoReport {
    pub(crate) exists: bool,
    pub(crate) size_bytes: Option<usize>,
    pub(crate) age_ms: Option<i64>,
    pub(crate) saved_at: Option<String>,
}

impl CacheInfoReport {
    pub(crate) fn new(info: &CacheInfo, now_ms: i64) -> Self {
        Self {
            exists: info.exists,
            size_bytes: info.size_bytes,
            age_ms: info.age_ms,
            saved_at: info.age_ms.map(|age| ts_ms_to_rfc3339(now_ms - age)),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LayoutReport {
    pub(crate) source: &'static str,
    pub(crate) node_count: usize,
    pub(crate) edge_count: usize,
    pub(crate) dropped_relationships: Vec<String>,
    pub(crate) duplicate_names: Vec<String>,
    pub(crate) positions: LayoutPositions,
    pub(crate) graph: RenderGraph,
}

impl LayoutReport {
    pub(crate) fn new(outcome: &LayoutOutcome, materialized: Option<&MaterializedGraph>) -> Self {
        let (dropped_relationships, duplicate_names) = materialized
            .map(|graph| {
                (
                    graph
                        .dropped_relationships
                        .iter()
                        .map(|dropped| dropped.id.clone())
                        .collect(),
                    graph.duplicate_names.clone(),
                )
            })
            .unwrap_or_default();
        Self {
            source: outcome.source.as_str(),
            node_count: outcome.graph.node_count(),
            edge_count: outcome.graph.edges.len(),
            dropped_relationships,
            duplicate_names,
            positions: outcome.positions.clone(),
            graph: outcome.graph.render(),
        }
    }
}
