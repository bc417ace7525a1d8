#![forbid(unsafe_code)]

use crate::ids::{category_contains_edge_id, member_contains_edge_id};
use crate::model::{Edge, EdgeClass, GraphDataset, RelationshipKind};
use std::collections::HashMap;
use tracing::debug;

pub const CONTAINS_LABEL: &str = "contains";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MaterializeOptions {
    /// Fail on two subcategories sharing a display name instead of letting
    /// the later one win the name lookup.
    pub strict_names: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingEndpoint {
    From,
    To,
    Both,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DroppedRelationship {
    pub id: String,
    pub kind: RelationshipKind,
    pub missing: MissingEndpoint,
}

/// Flat edge list plus what was left out while building it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterializedGraph {
    pub edges: Vec<Edge>,
    pub resolved_relationships: usize,
    pub dropped_relationships: Vec<DroppedRelationship>,
    /// Display names claimed by more than one subcategory.
    pub duplicate_names: Vec<String>,
}

impl MaterializedGraph {
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped_relationships.len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MaterializeError {
    DuplicateSubcategoryName {
        name: String,
        first: String,
        second: String,
    },
}

impl MaterializeError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateSubcategoryName { .. } => "DUPLICATE_SUBCATEGORY_NAME",
        }
    }
}

impl std::fmt::Display for MaterializeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateSubcategoryName {
                name,
                first,
                second,
            } => write!(
                f,
                "subcategory name {name:?} is shared by {first:?} and {second:?}"
            ),
        }
    }
}

impl std::error::Error for MaterializeError {}

/// Lenient materialization: duplicate names are recorded, never fatal.
pub fn materialize(dataset: &GraphDataset) -> MaterializedGraph {
    // Only strict mode reports errors.
    materialize_with(dataset, MaterializeOptions::default()).unwrap_or_default()
}

pub fn materialize_with(
    dataset: &GraphDataset,
    options: MaterializeOptions,
) -> Result<MaterializedGraph, MaterializeError> {
    let mut duplicate_names = Vec::new();
    let mut name_to_id: HashMap<&str, &str> = HashMap::new();
    for sub in &dataset.subcategories {
        if let Some(previous) = name_to_id.insert(sub.label.as_str(), sub.id.as_str()) {
            if options.strict_names {
                return Err(MaterializeError::DuplicateSubcategoryName {
                    name: sub.label.clone(),
                    first: previous.to_string(),
                    second: sub.id.clone(),
                });
            }
            debug!(
                name = %sub.label,
                replaced = previous,
                by = %sub.id,
                "duplicate subcategory name; later subcategory wins"
            );
            if !duplicate_names.contains(&sub.label) {
                duplicate_names.push(sub.label.clone());
            }
        }
    }

    let member_total: usize = dataset
        .subcategories
        .iter()
        .map(|sub| sub.member_node_ids.len())
        .sum();
    let mut edges = Vec::with_capacity(
        dataset.edges.len()
            + dataset.subcategories.len()
            + member_total
            + dataset.intra_tier_relationships.len()
            + dataset.cross_tier_relationships.len(),
    );

    edges.extend(dataset.edges.iter().cloned());

    for sub in &dataset.subcategories {
        edges.push(
            Edge::new(
                category_contains_edge_id(&sub.parent_category_id, &sub.id),
                sub.parent_category_id.clone(),
                sub.id.clone(),
                CONTAINS_LABEL,
            )
            .with_class(EdgeClass::CategoryContains),
        );
    }

    for sub in &dataset.subcategories {
        for member in &sub.member_node_ids {
            edges.push(
                Edge::new(
                    member_contains_edge_id(&sub.id, member),
                    sub.id.clone(),
                    member.clone(),
                    CONTAINS_LABEL,
                )
                .with_class(EdgeClass::MemberContains),
            );
        }
    }

    let mut resolved_relationships = 0usize;
    let mut dropped_relationships = Vec::new();
    for (kind, rel) in dataset.relationships() {
        let source = name_to_id.get(rel.from.as_str());
        let target = name_to_id.get(rel.to.as_str());
        match (source, target) {
            (Some(source), Some(target)) => {
                resolved_relationships += 1;
                edges.push(
                    Edge::new(rel.id.clone(), *source, *target, rel.label.clone())
                        .with_class(EdgeClass::from(kind)),
                );
            }
            (source, target) => {
                let missing = match (source.is_none(), target.is_none()) {
                    (true, true) => MissingEndpoint::Both,
                    (true, false) => MissingEndpoint::From,
                    _ => MissingEndpoint::To,
                };
                debug!(
                    relationship = %rel.id,
                    from = %rel.from,
                    to = %rel.to,
                    ?missing,
                    "dropping relationship with unresolved endpoint"
                );
                dropped_relationships.push(DroppedRelationship {
                    id: rel.id.clone(),
                    kind,
                    missing,
                });
            }
        }
    }

    Ok(MaterializedGraph {
        edges,
        resolved_relationships,
        dropped_relationships,
        duplicate_names,
    })
}
