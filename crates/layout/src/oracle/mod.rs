#![forbid(unsafe_code)]

//! The layout oracle seam: given sized nodes and directed edges, return a
//! center point for every node.

mod layered;

pub use layered::LayeredOracle;

use std::collections::HashMap;
use tl_core::model::RankDirection;

#[derive(Clone, Debug, PartialEq)]
pub struct SizedNode {
    pub id: String,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spacing {
    /// Gap between neighbours within a rank.
    pub node: f64,
    /// Gap between consecutive ranks.
    pub rank: f64,
    pub edge: f64,
    pub margin: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OracleRequest {
    pub nodes: Vec<SizedNode>,
    pub edges: Vec<(String, String)>,
    pub direction: RankDirection,
    pub spacing: Spacing,
}

/// Center point and extent of one node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

pub type OracleLayout = HashMap<String, Placement>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OracleError {
    pub message: String,
}

impl OracleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for OracleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "layout oracle failed: {}", self.message)
    }
}

impl std::error::Error for OracleError {}

/// A layered graph-layout engine. Implementations must be shareable with the
/// background worker thread.
pub trait LayoutOracle: Send + Sync {
    fn layout(&self, request: &OracleRequest) -> Result<OracleLayout, OracleError>;
}

impl<F> LayoutOracle for F
where
    F: Fn(&OracleRequest) -> Result<OracleLayout, OracleError> + Send + Sync,
{
    fn layout(&self, request: &OracleRequest) -> Result<OracleLayout, OracleError> {
        self(request)
    }
}

#[cfg(test)]
mod tests;
