#![forbid(unsafe_code)]

use super::{Size, Tier};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LEAF_SIZE: Size = Size::new(180.0, 50.0);
pub const DEFAULT_SUBCATEGORY_SIZE: Size = Size::new(200.0, 60.0);
pub const DEFAULT_CATEGORY_SIZE: Size = Size::new(250.0, 80.0);
pub const DEFAULT_NODE_SPACING: f64 = 100.0;
pub const DEFAULT_RANK_SPACING: f64 = 150.0;
pub const DEFAULT_EDGE_SEPARATION: f64 = 30.0;
pub const DEFAULT_MARGIN: f64 = 50.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankDirection {
    #[default]
    TopToBottom,
    BottomToTop,
    LeftToRight,
    RightToLeft,
}

impl RankDirection {
    pub fn is_horizontal(self) -> bool {
        matches!(self, RankDirection::LeftToRight | RankDirection::RightToLeft)
    }
}

/// Immutable layout parameters.
///
/// Not part of the cache fingerprint: a layout cached under one config is
/// served back under another as long as the graph summary matches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub leaf_size: Size,
    pub subcategory_size: Size,
    pub category_size: Size,
    pub node_spacing: f64,
    pub rank_spacing: f64,
    pub edge_separation: f64,
    pub margin: f64,
    pub direction: RankDirection,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            leaf_size: DEFAULT_LEAF_SIZE,
            subcategory_size: DEFAULT_SUBCATEGORY_SIZE,
            category_size: DEFAULT_CATEGORY_SIZE,
            node_spacing: DEFAULT_NODE_SPACING,
            rank_spacing: DEFAULT_RANK_SPACING,
            edge_separation: DEFAULT_EDGE_SEPARATION,
            margin: DEFAULT_MARGIN,
            direction: RankDirection::TopToBottom,
        }
    }
}

impl LayoutConfig {
    pub fn size_for(&self, tier: Tier) -> Size {
        match tier {
            Tier::Leaf => self.leaf_size,
            Tier::Subcategory => self.subcategory_size,
            Tier::Category => self.category_size,
        }
    }
}
