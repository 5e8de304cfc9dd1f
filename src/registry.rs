//! Entity registry: the closed set of item kinds and their backing collections.
//!
//! Every public type token resolves to exactly one collection. The set is an
//! exhaustive enum rather than a runtime map so an unregistered token is a
//! single typed failure path, not a map miss.

use crate::error::AppError;

/// Code snippet subtypes, addressable flat (`/api/python`) or nested
/// (`/api/codes/python`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    Python,
    Javascript,
    Html,
    Css,
    Other,
}

impl CodeKind {
    pub const ALL: [CodeKind; 5] = [
        CodeKind::Python,
        CodeKind::Javascript,
        CodeKind::Html,
        CodeKind::Css,
        CodeKind::Other,
    ];

    /// Case-sensitive exact match on the subtype token.
    pub fn from_token(token: &str) -> Result<Self, AppError> {
        match token {
            "python" => Ok(CodeKind::Python),
            "javascript" => Ok(CodeKind::Javascript),
            "html" => Ok(CodeKind::Html),
            "css" => Ok(CodeKind::Css),
            "other" => Ok(CodeKind::Other),
            _ => Err(AppError::InvalidType(token.to_string())),
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            CodeKind::Python => "python",
            CodeKind::Javascript => "javascript",
            CodeKind::Html => "html",
            CodeKind::Css => "css",
            CodeKind::Other => "other",
        }
    }
}

/// The nine registered item kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Files,
    Notes,
    Projects,
    Contacts,
    Code(CodeKind),
}

impl ItemKind {
    pub const ALL: [ItemKind; 9] = [
        ItemKind::Files,
        ItemKind::Notes,
        ItemKind::Projects,
        ItemKind::Contacts,
        ItemKind::Code(CodeKind::Python),
        ItemKind::Code(CodeKind::Javascript),
        ItemKind::Code(CodeKind::Html),
        ItemKind::Code(CodeKind::Css),
        ItemKind::Code(CodeKind::Other),
    ];

    /// Resolve a flat path token. Code subtype tokens are accepted directly,
    /// so `/api/python` and `/api/codes/python` hit the same collection.
    pub fn from_token(token: &str) -> Result<Self, AppError> {
        match token {
            "files" => Ok(ItemKind::Files),
            "notes" => Ok(ItemKind::Notes),
            "projects" => Ok(ItemKind::Projects),
            "contacts" => Ok(ItemKind::Contacts),
            _ => CodeKind::from_token(token).map(ItemKind::Code),
        }
    }

    /// Backing collection name in the document store.
    pub fn collection(&self) -> &'static str {
        match self {
            ItemKind::Files => "files",
            ItemKind::Notes => "notes",
            ItemKind::Projects => "projects",
            ItemKind::Contacts => "contacts",
            ItemKind::Code(CodeKind::Python) => "code_python",
            ItemKind::Code(CodeKind::Javascript) => "code_javascript",
            ItemKind::Code(CodeKind::Html) => "code_html",
            ItemKind::Code(CodeKind::Css) => "code_css",
            ItemKind::Code(CodeKind::Other) => "code_other",
        }
    }
}

/// Collection backing the activity log. Fixed routes, not part of the
/// public type registry.
pub const ACTIVITY_COLLECTION: &str = "activity";

/// Bounded read view of the activity log.
pub const ACTIVITY_LIMIT: i64 = 20;
