#![forbid(unsafe_code)]

//! Deterministic synthetic datasets for demos, benchmarks and tests.

use crate::model::{Category, Edge, GraphDataset, LeafNode, Relationship, Subcategory};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleShape {
    pub categories: usize,
    pub subcategories_per_category: usize,
    pub leaves_per_subcategory: usize,
    pub explicit_edges: usize,
    pub intra_tier_relationships: usize,
    pub cross_tier_relationships: usize,
}

impl Default for SampleShape {
    fn default() -> Self {
        Self {
            categories: 3,
            subcategories_per_category: 2,
            leaves_per_subcategory: 5,
            explicit_edges: 10,
            intra_tier_relationships: 4,
            cross_tier_relationships: 0,
        }
    }
}

pub fn subcategory_name(category: usize, index: usize) -> String {
    format!("Subcategory {category}.{index}")
}

pub fn generate(shape: SampleShape) -> GraphDataset {
    let mut dataset = GraphDataset::default();
    let mut leaf_counter = 0usize;

    for c in 0..shape.categories {
        let category_id = format!("cat-{c}");
        dataset
            .categories
            .push(Category::new(category_id.clone(), format!("Category {c}")));

        for s in 0..shape.subcategories_per_category {
            let mut members = Vec::with_capacity(shape.leaves_per_subcategory);
            for _ in 0..shape.leaves_per_subcategory {
                let leaf_id = format!("node-{leaf_counter}");
                dataset
                    .leaves
                    .push(LeafNode::new(leaf_id.clone(), format!("Node {leaf_counter}")));
                members.push(leaf_id);
                leaf_counter += 1;
            }
            dataset.subcategories.push(Subcategory::new(
                format!("sub-{c}-{s}"),
                subcategory_name(c, s),
                category_id.clone(),
                members,
            ));
        }
    }

    let leaf_count = dataset.leaves.len();
    if leaf_count >= 2 {
        for e in 0..shape.explicit_edges {
            let source = e % leaf_count;
            let mut target = (e + leaf_count / 2 + 1) % leaf_count;
            if target == source {
                target = (target + 1) % leaf_count;
            }
            dataset.edges.push(Edge::new(
                format!("edge-{e}"),
                dataset.leaves[source].id.clone(),
                dataset.leaves[target].id.clone(),
                "related",
            ));
        }
    }

    let names: Vec<String> = dataset
        .subcategories
        .iter()
        .map(|sub| sub.label.clone())
        .collect();
    if !names.is_empty() {
        for r in 0..shape.intra_tier_relationships {
            dataset.intra_tier_relationships.push(Relationship::new(
                format!("c2_relationship-{r}"),
                names[r % names.len()].clone(),
                names[(r + 1) % names.len()].clone(),
                "depends on",
            ));
        }
        for r in 0..shape.cross_tier_relationships {
            dataset.cross_tier_relationships.push(Relationship::new(
                format!("cross_c1_c2_rel-{r}"),
                names[r % names.len()].clone(),
                names[(r + names.len() / 2) % names.len()].clone(),
                "influences",
            ));
        }
    }

    dataset
}
