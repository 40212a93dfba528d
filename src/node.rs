//! Node records
//!
//! A node is one entry of a project's API tree: a folder, an HTTP request, a
//! WebSocket definition, a mock or a markdown document. Only the fields the
//! cache reasons about are typed; the type-specific payload rides along as
//! opaque JSON and is written back untouched.

use crate::types::{NodeId, ProjectId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    Folder,
    Http,
    Websocket,
    HttpMock,
    Markdown,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Folder => "folder",
            NodeType::Http => "http",
            NodeType::Websocket => "websocket",
            NodeType::HttpMock => "httpMock",
            NodeType::Markdown => "markdown",
        }
    }
}

/// Display information shared by every node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub name: String,
    /// Remaining info fields (description, tags, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A stored tree entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    #[serde(default)]
    pub project_id: ProjectId,
    /// Parent node id; empty for root entries
    #[serde(default)]
    pub pid: NodeId,
    pub info: NodeInfo,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub updated_at: String,
    /// Type-specific payload (request definition, mock config, markdown body)
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Node {
    pub fn new(
        id: impl Into<NodeId>,
        project_id: impl Into<ProjectId>,
        pid: impl Into<NodeId>,
        node_type: NodeType,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            pid: pid.into(),
            info: NodeInfo {
                node_type,
                name: name.into(),
                extra: Map::new(),
            },
            is_deleted: false,
            updated_at: String::new(),
            payload: Map::new(),
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.info.node_type
    }

    pub fn is_folder(&self) -> bool {
        self.info.node_type == NodeType::Folder
    }

    /// Counts towards the project's `docNum`
    pub fn is_live_document(&self) -> bool {
        !self.is_deleted && !self.is_folder()
    }

    pub fn is_root(&self) -> bool {
        self.pid.is_empty()
    }

    pub fn mark_deleted(&mut self, timestamp: &str) {
        self.is_deleted = true;
        self.updated_at = timestamp.to_string();
    }

    pub fn mark_restored(&mut self, timestamp: &str) {
        self.is_deleted = false;
        self.updated_at = timestamp.to_string();
    }

    /// Shallow-merge a partial JSON object over this node.
    ///
    /// Top-level keys replace the existing values wholesale (so `info` is
    /// replaced, not merged). The `id` key is ignored: a node never changes
    /// its primary key through a patch.
    pub fn merged(&self, updates: &Map<String, Value>) -> Result<Node, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(fields) = &mut value {
            for (key, update) in updates {
                if key == "id" {
                    continue;
                }
                fields.insert(key.clone(), update.clone());
            }
        }
        serde_json::from_value(value)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Node, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
