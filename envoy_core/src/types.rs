//! Plain system types carried by envoy resources.

use std::fmt::Display;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The kind of account a user represents.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
    /// A regular account
    #[default]
    Normal,
    /// An automation account
    Bot,
    /// An internal account owned by the system
    System,
}

impl UserKind {
    /// Parse a kind from its configuration name. The empty string maps to `Normal`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "" | "normal" => Some(UserKind::Normal),
            "bot" => Some(UserKind::Bot),
            "system" => Some(UserKind::System),
            _ => None,
        }
    }
}

impl Display for UserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserKind::Normal => write!(f, "normal"),
            UserKind::Bot => write!(f, "bot"),
            UserKind::System => write!(f, "system"),
        }
    }
}

/// A provisionable user account.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique handle. Always taken from the key the user was defined under.
    pub handle: String,
    /// Email address
    pub email: String,
    /// Whether the email address has been confirmed
    pub email_confirmed: bool,
    /// Display name
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub name: String,
    /// Login name
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub username: String,
    /// Account kind
    #[serde(default)]
    pub kind: UserKind,
    /// Free-form labels, in definition order
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub labels: IndexMap<String, String>,
}

impl User {
    /// A blank user. Imported emails are considered confirmed unless the
    /// definition says otherwise.
    pub fn new() -> Self {
        Self {
            handle: String::new(),
            email: String::new(),
            email_confirmed: true,
            name: String::new(),
            username: String::new(),
            kind: UserKind::Normal,
            labels: IndexMap::new(),
        }
    }
}

impl Default for User {
    fn default() -> Self {
        Self::new()
    }
}
