#![forbid(unsafe_code)]

pub mod graph;
pub mod ids;
pub mod model;
pub mod sample;
