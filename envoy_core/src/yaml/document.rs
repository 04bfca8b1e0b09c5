use crate::{error::Result, logging::debug};

use super::{
    node::{is_kind, lookup, parse_documents, shape_err, NodeKind},
    UserSet,
};

/// Key holding user definitions in a document
const USERS_KEY: &str = "users";

/// Decode the user definitions of every document in `doc`.
///
/// Empty documents are skipped; any other document must be a map. Users from
/// all documents end up in one set, in document order.
pub fn decode_document(doc: &str) -> Result<UserSet> {
    let mut users = UserSet::default();

    for (i, root) in parse_documents(doc)?.iter().enumerate() {
        if root.is_null() {
            debug!(document = i, "skipping empty document");
            continue;
        }
        if !is_kind(root, NodeKind::Mapping) {
            return Err(shape_err(
                doc,
                root,
                "document must be a map of resource definitions",
            ));
        }
        if let Some(n) = lookup(root, USERS_KEY) {
            users.decode(&n, doc)?;
        }
    }

    debug!(users = users.len(), "decoded document");
    Ok(users)
}

#[cfg(test)]
mod test {
    use crate::error::EnvoyError;

    use super::*;

    #[test]
    fn users_from_all_documents_are_kept() -> anyhow::Result<()> {
        let doc = r#"
users:
  alice: alice@example.tld
---
roles:
  admins: {}
---
users:
  alice: other@example.tld
  bob:
    email: bob@example.tld
"#;
        let users = decode_document(doc)?;
        let handles = users.iter().map(|u| u.res.handle.as_str()).collect::<Vec<_>>();

        assert_eq!(handles, vec!["alice", "alice", "bob"]);
        Ok(())
    }

    #[test]
    fn document_without_users_is_empty() -> anyhow::Result<()> {
        assert!(decode_document("roles:\n  admins: {}\n")?.is_empty());
        Ok(())
    }

    #[test]
    fn non_map_document_fails() {
        assert!(matches!(
            decode_document("- alice\n"),
            Err(EnvoyError::Shape { .. })
        ));
    }
}
