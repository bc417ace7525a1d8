#![forbid(unsafe_code)]

//! Cache keys derived from the shape of the input graph.
//!
//! The default summary covers collection sizes and the first/last leaf id
//! only. Two inputs with equal counts and equal end points share a
//! fingerprint even when the nodes in between were reordered or replaced.
//! Build with the `structural-digest` feature and select
//! [`FingerprintMode::Structural`] to fold every id and label in as well.

use serde::Serialize;
use tl_core::model::{Category, Edge, GraphDataset, LeafNode, Subcategory};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FingerprintMode {
    #[default]
    Summary,
    #[cfg(feature = "structural-digest")]
    Structural,
}

#[derive(Clone, Copy, Debug)]
pub struct FingerprintInput<'a> {
    pub leaves: &'a [LeafNode],
    pub categories: &'a [Category],
    pub subcategories: &'a [Subcategory],
    pub edges: &'a [Edge],
}

impl<'a> FingerprintInput<'a> {
    pub fn new(
        leaves: &'a [LeafNode],
        categories: &'a [Category],
        subcategories: &'a [Subcategory],
        edges: &'a [Edge],
    ) -> Self {
        Self {
            leaves,
            categories,
            subcategories,
            edges,
        }
    }

    /// Keyed on the explicit leaf-to-leaf edges, not the materialized set.
    pub fn from_dataset(dataset: &'a GraphDataset) -> Self {
        Self::new(
            &dataset.leaves,
            &dataset.categories,
            &dataset.subcategories,
            &dataset.edges,
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary<'a> {
    node_count: usize,
    c1_count: usize,
    c2_count: usize,
    edge_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_node_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_node_id: Option<&'a str>,
}

pub fn fingerprint(input: FingerprintInput<'_>, mode: FingerprintMode) -> String {
    match mode {
        FingerprintMode::Summary => summary_fingerprint(input),
        #[cfg(feature = "structural-digest")]
        FingerprintMode::Structural => {
            format!(
                "{}:{}",
                summary_fingerprint(input),
                structural::digest_hex(input)
            )
        }
    }
}

fn summary_fingerprint(input: FingerprintInput<'_>) -> String {
    let summary = Summary {
        node_count: input.leaves.len(),
        c1_count: input.categories.len(),
        c2_count: input.subcategories.len(),
        edge_count: input.edges.len(),
        first_node_id: input.leaves.first().map(|n| n.id.as_str()),
        last_node_id: input.leaves.last().map(|n| n.id.as_str()),
    };
    // A struct of counts and borrowed strs always serializes.
    let text = serde_json::to_string(&summary).unwrap_or_default();
    to_base36(rolling_hash(&text))
}

/// `hash * 31 + unit` over UTF-16 code units, wrapping at 32 bits.
pub(crate) fn rolling_hash(text: &str) -> i32 {
    text.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

pub(crate) fn to_base36(value: i32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let negative = value < 0;
    let mut rest = i64::from(value).unsigned_abs();
    if rest == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while rest > 0 {
        out.push(DIGITS[(rest % 36) as usize]);
        rest /= 36;
    }
    if negative {
        out.push(b'-');
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(feature = "structural-digest")]
mod structural {
    use super::FingerprintInput;
    use sha2::{Digest, Sha256};
    use std::fmt::Write as _;

    pub(super) fn digest_hex(input: FingerprintInput<'_>) -> String {
        let mut hasher = Sha256::new();
        section(
            &mut hasher,
            b"leaves",
            input.leaves.iter().map(|n| [n.id.as_str(), n.label.as_str()]),
        );
        section(
            &mut hasher,
            b"categories",
            input
                .categories
                .iter()
                .map(|n| [n.id.as_str(), n.label.as_str()]),
        );
        section(
            &mut hasher,
            b"subcategories",
            input
                .subcategories
                .iter()
                .map(|n| [n.id.as_str(), n.parent_category_id.as_str()]),
        );
        section(
            &mut hasher,
            b"edges",
            input
                .edges
                .iter()
                .map(|e| [e.source.as_str(), e.target.as_str()]),
        );

        let digest = hasher.finalize();
        let mut out = String::with_capacity(64);
        for b in digest {
            let _ = write!(&mut out, "{:02x}", b);
        }
        out
    }

    fn section<'s>(hasher: &mut Sha256, tag: &[u8], items: impl Iterator<Item = [&'s str; 2]>) {
        hasher.update(tag);
        for [a, b] in items {
            hasher.update(a.as_bytes());
            hasher.update([0x1f]);
            hasher.update(b.as_bytes());
            hasher.update([0x1e]);
        }
    }
}
