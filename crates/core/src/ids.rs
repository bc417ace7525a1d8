#![forbid(unsafe_code)]

const MAX_NODE_ID_LEN: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, NodeIdError> {
        let value = value.into();
        validate_node_id(&value)?;
        Ok(Self(value))
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeIdError {
    Empty,
    TooLong,
    ContainsControl,
}

impl NodeIdError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "node id must not be empty",
            Self::TooLong => "node id is too long",
            Self::ContainsControl => "node id contains control characters",
        }
    }
}

pub fn validate_node_id(value: &str) -> Result<(), NodeIdError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(NodeIdError::Empty);
    }
    if trimmed.len() > MAX_NODE_ID_LEN {
        return Err(NodeIdError::TooLong);
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(NodeIdError::ContainsControl);
    }
    Ok(())
}

/// Id of the synthetic edge from a category to one of its subcategories.
pub fn category_contains_edge_id(category_id: &str, subcategory_id: &str) -> String {
    format!("c1-{category_id}-to-c2-{subcategory_id}")
}

/// Id of the synthetic edge from a subcategory to one of its member leaves.
pub fn member_contains_edge_id(subcategory_id: &str, leaf_id: &str) -> String {
    format!("c2-{subcategory_id}-to-node-{leaf_id}")
}
