#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Top-left corner of a laid-out node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Leaf,
    Subcategory,
    Category,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Leaf => "leaf",
            Tier::Subcategory => "subcategory",
            Tier::Category => "category",
        }
    }
}

/// Anything the layout pipeline positions: one node of one tier.
pub trait TierNode {
    const TIER: Tier;

    fn id(&self) -> &str;
    fn label(&self) -> &str;
    fn position(&self) -> Option<Position>;
    fn set_position(&mut self, position: Position);
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeafNode {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl LeafNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            position: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl Category {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            position: None,
        }
    }
}

/// Tier-2 grouping. `label` is the display name relationships join on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub id: String,
    #[serde(alias = "c2Name")]
    pub label: String,
    #[serde(alias = "c1CategoryId")]
    pub parent_category_id: String,
    #[serde(default, alias = "nodeIds")]
    pub member_node_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl Subcategory {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        parent_category_id: impl Into<String>,
        member_node_ids: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            parent_category_id: parent_category_id.into(),
            member_node_ids,
            position: None,
        }
    }
}

macro_rules! impl_tier_node {
    ($ty:ty, $tier:expr) => {
        impl TierNode for $ty {
            const TIER: Tier = $tier;

            fn id(&self) -> &str {
                &self.id
            }

            fn label(&self) -> &str {
                &self.label
            }

            fn position(&self) -> Option<Position> {
                self.position
            }

            fn set_position(&mut self, position: Position) {
                self.position = Some(position);
            }
        }
    };
}

impl_tier_node!(LeafNode, Tier::Leaf);
impl_tier_node!(Category, Tier::Category);
impl_tier_node!(Subcategory, Tier::Subcategory);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    IntraTier,
    CrossTier,
}

/// Relationship between two subcategories, addressed by display name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    #[serde(alias = "fromC2")]
    pub from: String,
    #[serde(alias = "toC2")]
    pub to: String,
    pub label: String,
}

impl Relationship {
    pub fn new(
        id: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            label: label.into(),
        }
    }
}

/// Where a materialized edge came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeClass {
    #[default]
    Explicit,
    CategoryContains,
    MemberContains,
    IntraTier,
    CrossTier,
}

impl EdgeClass {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeClass::Explicit => "explicit",
            EdgeClass::CategoryContains => "category_contains",
            EdgeClass::MemberContains => "member_contains",
            EdgeClass::IntraTier => "intra_tier",
            EdgeClass::CrossTier => "cross_tier",
        }
    }

    pub fn is_contains(self) -> bool {
        matches!(self, EdgeClass::CategoryContains | EdgeClass::MemberContains)
    }
}

impl From<RelationshipKind> for EdgeClass {
    fn from(value: RelationshipKind) -> Self {
        match value {
            RelationshipKind::IntraTier => EdgeClass::IntraTier,
            RelationshipKind::CrossTier => EdgeClass::CrossTier,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub class: EdgeClass,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            label: label.into(),
            class: EdgeClass::Explicit,
        }
    }

    pub fn with_class(mut self, class: EdgeClass) -> Self {
        self.class = class;
        self
    }
}
