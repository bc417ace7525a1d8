#![forbid(unsafe_code)]

mod materialize;
mod render;

pub use materialize::*;
pub use render::*;

#[cfg(test)]
mod tests;
