use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Stable identifier of a project, unique across the whole forest.
///
/// The backend sends ids either as JSON numbers or as strings. Both normalize
/// to the textual form, so `1` and `"1"` name the same project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for ProjectId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&ProjectId> for ProjectId {
    fn from(id: &ProjectId) -> Self {
        id.clone()
    }
}

impl From<&ProjectNode> for ProjectId {
    fn from(node: &ProjectNode) -> Self {
        node.id.clone()
    }
}

impl Serialize for ProjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Round-trip numeric ids as numbers so consumers see the backend's shape.
        match self.0.parse::<i64>() {
            Ok(n) if n.to_string() == self.0 => serializer.serialize_i64(n),
            _ => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for ProjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Uint(u64),
            Str(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => Self(n.to_string()),
            RawId::Uint(n) => Self(n.to_string()),
            RawId::Str(s) => Self(s),
        })
    }
}

/// Root-level projects are folders, everything fetched below them is a file.
/// Only affects how a row is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    File,
}

/// Child list of a stored project
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildState {
    /// Never fetched (or the last fetch failed)
    NotLoaded,
    /// Fetch in flight
    Loading,
    /// Fetched; authoritative until the next fetch for this node
    Loaded(Vec<ProjectId>),
}

impl ChildState {
    /// Child ids, empty unless loaded
    pub fn ids(&self) -> &[ProjectId] {
        match self {
            ChildState::Loaded(ids) => ids,
            ChildState::NotLoaded | ChildState::Loading => &[],
        }
    }

    pub fn status(&self) -> LoadStatus {
        match self {
            ChildState::NotLoaded => LoadStatus::NotLoaded,
            ChildState::Loading => LoadStatus::Loading,
            ChildState::Loaded(_) => LoadStatus::Loaded,
        }
    }
}

/// Payload-free summary of [`ChildState`], carried on snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    NotLoaded,
    Loading,
    Loaded,
}

/// A project as stored in the normalized tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectEntry {
    pub id: ProjectId,
    pub name: String,
    pub kind: NodeKind,
    pub created_at: Option<String>,
    /// Parent project (None for roots)
    pub parent: Option<ProjectId>,
    pub children: ChildState,
}

impl ProjectEntry {
    pub fn new(
        id: ProjectId,
        name: String,
        kind: NodeKind,
        created_at: Option<String>,
        parent: Option<ProjectId>,
    ) -> Self {
        Self {
            id,
            name,
            kind,
            created_at,
            parent,
            children: ChildState::NotLoaded,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.children, ChildState::Loaded(_))
    }

    pub fn is_loading(&self) -> bool {
        self.children == ChildState::Loading
    }
}

/// Nested view of a project and its loaded descendants.
///
/// This is what filters operate on and what selection callbacks receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectNode {
    pub id: ProjectId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub children: Vec<ProjectNode>,
    pub load: LoadStatus,
    pub created_at: Option<String>,
}

impl ProjectNode {
    /// Build a node with no loaded children
    pub fn leaf(id: impl Into<ProjectId>, name: &str, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            name: name.to_string(),
            kind,
            children: Vec::new(),
            load: LoadStatus::NotLoaded,
            created_at: None,
        }
    }

    pub fn with_created_at(mut self, created_at: &str) -> Self {
        self.created_at = Some(created_at.to_string());
        self
    }

    pub fn with_children(mut self, children: Vec<ProjectNode>) -> Self {
        self.children = children;
        self.load = LoadStatus::Loaded;
        self
    }

    /// Depth-first search for a node by id
    pub fn find(&self, id: &ProjectId) -> Option<&ProjectNode> {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

/// Find a node by id anywhere in a forest
pub fn find_in_forest<'a>(nodes: &'a [ProjectNode], id: &ProjectId) -> Option<&'a ProjectNode> {
    nodes.iter().find_map(|node| node.find(id))
}
