//! Tool metadata and timestamps that ride along with a resource.

use std::fmt::Display;

use serde::{Serialize, Serializer};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// How a resource should be merged with one that already exists in the target.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum MergeAlg {
    /// Let the importer decide
    #[default]
    Default,
    /// Leave the existing resource alone
    Skip,
    /// Overwrite the existing resource
    Replace,
    /// Merge, preferring the existing values
    MergeLeft,
    /// Merge, preferring the imported values
    MergeRight,
}

impl MergeAlg {
    /// Parse a merge algorithm from its configuration name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "" | "default" => Some(MergeAlg::Default),
            "skip" => Some(MergeAlg::Skip),
            "replace" => Some(MergeAlg::Replace),
            "mergeleft" | "merge_left" => Some(MergeAlg::MergeLeft),
            "mergeright" | "merge_right" => Some(MergeAlg::MergeRight),
            _ => None,
        }
    }
}

impl Display for MergeAlg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MergeAlg::Default => "default",
            MergeAlg::Skip => "skip",
            MergeAlg::Replace => "replace",
            MergeAlg::MergeLeft => "mergeLeft",
            MergeAlg::MergeRight => "mergeRight",
        };
        write!(f, "{s}")
    }
}

/// Tool-specific settings attached to a single resource definition.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnvoyConfig {
    /// Expression that, when satisfied, skips the resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_if: Option<String>,
    /// What to do when the resource already exists
    pub on_existing: MergeAlg,
}

/// Lifecycle markers of a resource.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Timestamps {
    #[allow(missing_docs)]
    #[serde(serialize_with = "serialize_datetime", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<OffsetDateTime>,
    #[allow(missing_docs)]
    #[serde(serialize_with = "serialize_datetime", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<OffsetDateTime>,
    #[allow(missing_docs)]
    #[serde(serialize_with = "serialize_datetime", skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<OffsetDateTime>,
    #[allow(missing_docs)]
    #[serde(serialize_with = "serialize_datetime", skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<OffsetDateTime>,
    #[allow(missing_docs)]
    #[serde(serialize_with = "serialize_datetime", skip_serializing_if = "Option::is_none")]
    pub suspended_at: Option<OffsetDateTime>,
}

impl Timestamps {
    /// Whether no timestamp is set
    pub fn is_empty(&self) -> bool {
        self.created_at.is_none()
            && self.updated_at.is_none()
            && self.deleted_at.is_none()
            && self.archived_at.is_none()
            && self.suspended_at.is_none()
    }
}

/// Serialize an optional OffsetDateTime as an RFC 3339 string
fn serialize_datetime<S>(v: &Option<OffsetDateTime>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match v {
        Some(v) => s.serialize_str(
            v.format(&Rfc3339)
                .map_err(serde::ser::Error::custom)?
                .as_str(),
        ),
        None => s.serialize_none(),
    }
}
