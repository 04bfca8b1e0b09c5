//! Decoding lifecycle timestamps from a definition.

use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use yaml_peg::NodeRc;

use crate::{error::Result, resource::Timestamps};

use super::node::{decode_scalar, each_map, scalar_value, value_err};

/// Decode `createdAt`, `updatedAt`, `deletedAt`, `archivedAt` and `suspendedAt`
/// from a definition map. Key matching ignores case and underscores. Returns
/// `None` when no timestamp is present.
pub fn decode_timestamps(node: &NodeRc, doc: &str) -> Result<Option<Timestamps>> {
    let mut ts = Timestamps::default();

    each_map(node, doc, |k, v| {
        let key = scalar_value(k).unwrap_or_default().to_lowercase().replace('_', "");
        let field = match key.as_str() {
            "createdat" => &mut ts.created_at,
            "updatedat" => &mut ts.updated_at,
            "deletedat" => &mut ts.deleted_at,
            "archivedat" => &mut ts.archived_at,
            "suspendedat" => &mut ts.suspended_at,
            _ => return Ok(()),
        };

        let raw = decode_scalar(v, &key, doc)?;
        if raw.trim().is_empty() {
            return Ok(());
        }
        *field = Some(OffsetDateTime::parse(raw.trim(), &Rfc3339).map_err(|e| {
            value_err(doc, v, format!("`{raw}` is not an RFC 3339 timestamp: {e}"))
        })?);
        Ok(())
    })?;

    Ok(if ts.is_empty() { None } else { Some(ts) })
}
