#![forbid(unsafe_code)]

use super::{Category, LeafNode, Position, Subcategory, Tier, TierNode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub id: String,
    pub position: Position,
}

/// A complete position assignment, one entry per node, grouped by tier in
/// input order. This is the payload the layout cache stores.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPositions {
    pub leaf_positions: Vec<NodePosition>,
    pub category_positions: Vec<NodePosition>,
    pub subcategory_positions: Vec<NodePosition>,
}

impl LayoutPositions {
    pub fn len(&self) -> usize {
        self.leaf_positions.len() + self.category_positions.len() + self.subcategory_positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn position_of(&self, id: &str) -> Option<Position> {
        self.leaf_positions
            .iter()
            .chain(&self.category_positions)
            .chain(&self.subcategory_positions)
            .find(|entry| entry.id == id)
            .map(|entry| entry.position)
    }

    /// Collects the positions already written on fully positioned nodes.
    pub fn capture(
        leaves: &[LeafNode],
        categories: &[Category],
        subcategories: &[Subcategory],
    ) -> Result<Self, MissingPosition> {
        Ok(Self {
            leaf_positions: capture_tier(leaves)?,
            category_positions: capture_tier(categories)?,
            subcategory_positions: capture_tier(subcategories)?,
        })
    }

    /// Writes positions onto nodes, all or nothing: when any node lacks an
    /// entry the nodes are left untouched.
    pub fn apply(
        &self,
        leaves: &mut [LeafNode],
        categories: &mut [Category],
        subcategories: &mut [Subcategory],
    ) -> Result<(), MissingPosition> {
        let leaf_index = index(&self.leaf_positions);
        let category_index = index(&self.category_positions);
        let subcategory_index = index(&self.subcategory_positions);

        check_tier(leaves, &leaf_index)?;
        check_tier(categories, &category_index)?;
        check_tier(subcategories, &subcategory_index)?;

        write_tier(leaves, &leaf_index);
        write_tier(categories, &category_index);
        write_tier(subcategories, &subcategory_index);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissingPosition {
    pub tier: Tier,
    pub id: String,
}

impl std::fmt::Display for MissingPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "no position for {} node {:?}", self.tier.as_str(), self.id)
    }
}

impl std::error::Error for MissingPosition {}

fn capture_tier<T: TierNode>(nodes: &[T]) -> Result<Vec<NodePosition>, MissingPosition> {
    nodes
        .iter()
        .map(|node| {
            node.position()
                .map(|position| NodePosition {
                    id: node.id().to_string(),
                    position,
                })
                .ok_or_else(|| MissingPosition {
                    tier: T::TIER,
                    id: node.id().to_string(),
                })
        })
        .collect()
}

fn index(entries: &[NodePosition]) -> HashMap<&str, Position> {
    entries
        .iter()
        .map(|entry| (entry.id.as_str(), entry.position))
        .collect()
}

fn check_tier<T: TierNode>(
    nodes: &[T],
    index: &HashMap<&str, Position>,
) -> Result<(), MissingPosition> {
    match nodes.iter().find(|node| !index.contains_key(node.id())) {
        Some(node) => Err(MissingPosition {
            tier: T::TIER,
            id: node.id().to_string(),
        }),
        None => Ok(()),
    }
}

fn write_tier<T: TierNode>(nodes: &mut [T], index: &HashMap<&str, Position>) {
    for node in nodes {
        if let Some(position) = index.get(node.id()) {
            node.set_position(*position);
        }
    }
}
