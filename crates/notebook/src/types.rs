//! Notebook type definitions.

use notebook_llm::GroundingChunk;
use serde::{Deserialize, Serialize};

/// Kind of location a source points at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Url,
    File,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::File => "file",
        }
    }
}

/// A named reference contributing grounding context to questions.
///
/// Serialized with the camelCase field names of the shared `sources` blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// Opaque identifier, unique within the registry
    pub id: String,

    /// Display name
    pub name: String,

    #[serde(rename = "type")]
    pub source_type: SourceType,

    /// Location reference (URL or file path)
    pub path: String,

    /// Fallback descriptive text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Whether the source is included in the next question's context
    pub is_active: bool,
}

/// Form state for a source that has not been added yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceDraft {
    pub name: String,
    pub source_type: SourceType,
    pub path: String,
    pub content: Option<String>,
}

impl SourceDraft {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Role of the current user. Anything other than `admin` is unprivileged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Other(String),
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        if value == "admin" {
            Role::Admin
        } else {
            Role::Other(value)
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => "admin".to_string(),
            Role::Other(other) => other,
        }
    }
}

/// The signed-in user, as provided by the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub role: Role,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl User {
    pub fn admin() -> Self {
        Self {
            role: Role::Admin,
            name: None,
        }
    }

    pub fn with_role(role: impl Into<String>) -> Self {
        Self {
            role: Role::from(role.into()),
            name: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Raw reply of the answering service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceReply {
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<GroundingChunk>>,
}

impl ServiceReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            links: None,
        }
    }

    pub fn with_links(mut self, links: Vec<GroundingChunk>) -> Self {
        self.links = Some(links);
        self
    }
}

/// A displayable citation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceLink {
    pub uri: String,
    pub label: String,
}

/// Answer to the current question. Held in memory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub links: Vec<ReferenceLink>,
}

impl Answer {
    /// Build the displayable answer from a service reply.
    ///
    /// Entries without a `web` object are dropped; order is preserved and a
    /// missing or empty title falls back to `fallback_label`.
    pub fn from_reply(reply: ServiceReply, fallback_label: &str) -> Self {
        let links = reply
            .links
            .unwrap_or_default()
            .into_iter()
            .filter_map(|chunk| chunk.web)
            .map(|web| ReferenceLink {
                label: web
                    .title
                    .filter(|title| !title.is_empty())
                    .unwrap_or_else(|| fallback_label.to_string()),
                uri: web.uri,
            })
            .collect();

        Self {
            text: reply.text,
            links,
        }
    }
}
