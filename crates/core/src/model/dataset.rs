#![forbid(unsafe_code)]

use super::{Category, Edge, LeafNode, Relationship, RelationshipKind, Subcategory, Tier};
use crate::ids::{NodeIdError, validate_node_id};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Everything the external data source hands over for one session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphDataset {
    #[serde(alias = "graphNodes")]
    pub leaves: Vec<LeafNode>,
    #[serde(alias = "c1Output")]
    pub categories: Vec<Category>,
    #[serde(alias = "c2Subcategories")]
    pub subcategories: Vec<Subcategory>,
    #[serde(alias = "c2Relationships")]
    pub intra_tier_relationships: Vec<Relationship>,
    #[serde(alias = "crossC1C2Relationships")]
    pub cross_tier_relationships: Vec<Relationship>,
    #[serde(alias = "graphEdges")]
    pub edges: Vec<Edge>,
}

impl GraphDataset {
    pub fn node_count(&self) -> usize {
        self.leaves.len() + self.categories.len() + self.subcategories.len()
    }

    pub fn relationships(&self) -> impl Iterator<Item = (RelationshipKind, &Relationship)> {
        self.intra_tier_relationships
            .iter()
            .map(|rel| (RelationshipKind::IntraTier, rel))
            .chain(
                self.cross_tier_relationships
                    .iter()
                    .map(|rel| (RelationshipKind::CrossTier, rel)),
            )
    }

    /// Strict pre-flight over the input contract. The layout pipeline does
    /// not require it; it tolerates dangling references.
    pub fn validate(&self) -> Result<(), DatasetError> {
        let mut seen: HashMap<&str, Tier> = HashMap::new();
        let tiers = self
            .leaves
            .iter()
            .map(|n| (Tier::Leaf, n.id.as_str()))
            .chain(self.categories.iter().map(|n| (Tier::Category, n.id.as_str())))
            .chain(
                self.subcategories
                    .iter()
                    .map(|n| (Tier::Subcategory, n.id.as_str())),
            );
        for (tier, id) in tiers {
            validate_node_id(id).map_err(|error| DatasetError::InvalidId {
                tier,
                id: id.to_string(),
                error,
            })?;
            if let Some(first) = seen.insert(id, tier) {
                return Err(DatasetError::DuplicateId {
                    id: id.to_string(),
                    first,
                    second: tier,
                });
            }
        }

        let categories: HashSet<&str> = self.categories.iter().map(|c| c.id.as_str()).collect();
        let leaves: HashSet<&str> = self.leaves.iter().map(|n| n.id.as_str()).collect();
        for sub in &self.subcategories {
            if !categories.contains(sub.parent_category_id.as_str()) {
                return Err(DatasetError::UnknownParentCategory {
                    subcategory: sub.id.clone(),
                    category: sub.parent_category_id.clone(),
                });
            }
            if let Some(member) = sub
                .member_node_ids
                .iter()
                .find(|member| !leaves.contains(member.as_str()))
            {
                return Err(DatasetError::UnknownMember {
                    subcategory: sub.id.clone(),
                    member: member.clone(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatasetError {
    InvalidId {
        tier: Tier,
        id: String,
        error: NodeIdError,
    },
    DuplicateId {
        id: String,
        first: Tier,
        second: Tier,
    },
    UnknownParentCategory {
        subcategory: String,
        category: String,
    },
    UnknownMember {
        subcategory: String,
        member: String,
    },
}

impl DatasetError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidId { .. } => "INVALID_ID",
            Self::DuplicateId { .. } => "DUPLICATE_ID",
            Self::UnknownParentCategory { .. } => "UNKNOWN_PARENT_CATEGORY",
            Self::UnknownMember { .. } => "UNKNOWN_MEMBER",
        }
    }
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidId { tier, id, error } => {
                write!(f, "invalid {} id {id:?}: {}", tier.as_str(), error.message())
            }
            Self::DuplicateId { id, first, second } => write!(
                f,
                "duplicate id {id:?} ({} and {})",
                first.as_str(),
                second.as_str()
            ),
            Self::UnknownParentCategory {
                subcategory,
                category,
            } => write!(
                f,
                "subcategory {subcategory:?} references unknown category {category:?}"
            ),
            Self::UnknownMember {
                subcategory,
                member,
            } => write!(
                f,
                "subcategory {subcategory:?} references unknown leaf {member:?}"
            ),
        }
    }
}

impl std::error::Error for DatasetError {}
