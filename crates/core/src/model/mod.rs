#![forbid(unsafe_code)]

mod config;
mod dataset;
mod positions;
mod types;

pub use config::*;
pub use dataset::*;
pub use positions::*;
pub use types::*;
