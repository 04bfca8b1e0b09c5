//! Decoding resource references from map keys.

use lazy_static::lazy_static;
use regex::Regex;
use yaml_peg::NodeRc;

use crate::error::Result;

use super::node::{is_kind, reference_err, scalar_value, shape_err, NodeKind};

lazy_static! {
    static ref HANDLE: Regex =
        Regex::new(r"^[A-Za-z][0-9A-Za-z_\-.]*[A-Za-z0-9]$").expect("handle pattern is valid");
}

/// Whether `v` is usable as a handle
pub fn is_valid_handle(v: &str) -> bool {
    HANDLE.is_match(v)
}

/// Decode a key node into a resource identifier: either a handle or a numeric ID.
///
/// `label` names the resource kind for error messages (`user`, `role`, ...).
pub fn decode_ref(node: &NodeRc, label: &str, doc: &str) -> Result<String> {
    if !is_kind(node, NodeKind::Scalar) {
        return Err(shape_err(
            doc,
            node,
            format!("{label} reference must be a scalar"),
        ));
    }

    let val = scalar_value(node).unwrap_or_default().trim().to_owned();
    if val.is_empty() {
        return Err(reference_err(
            doc,
            node,
            format!("{label} reference must not be empty"),
        ));
    }

    if is_valid_handle(&val) || val.parse::<u64>().map(|id| id > 0).unwrap_or(false) {
        Ok(val)
    } else {
        Err(reference_err(
            doc,
            node,
            format!("`{val}` is not a valid {label} handle or ID"),
        ))
    }
}

#[cfg(test)]
mod test {
    use crate::{error::EnvoyError, yaml::node::parse_documents};

    use super::*;

    fn first_key(doc: &str) -> NodeRc {
        let root = parse_documents(doc).unwrap().remove(0);
        let map = root.as_map().unwrap();
        let (k, _) = map.into_iter().next().unwrap();
        k.clone()
    }

    #[test]
    fn handles_and_ids_are_valid() -> Result<()> {
        let doc = "alice: x\n";
        assert_eq!(decode_ref(&first_key(doc), "user", doc)?, "alice");

        let doc = "ops_team-1: x\n";
        assert_eq!(decode_ref(&first_key(doc), "role", doc)?, "ops_team-1");

        let doc = "4200: x\n";
        assert_eq!(decode_ref(&first_key(doc), "user", doc)?, "4200");
        Ok(())
    }

    #[test]
    fn invalid_handle_is_a_reference_error() {
        let doc = "\"not a handle\": x\n";
        let res = decode_ref(&first_key(doc), "user", doc);

        match res {
            Err(EnvoyError::Reference { message, .. }) => {
                assert!(message.contains("not a valid user handle"))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn handle_pattern() {
        assert!(is_valid_handle("alice"));
        assert!(is_valid_handle("a.b-c_d"));
        assert!(!is_valid_handle("a"));
        assert!(!is_valid_handle("1alice"));
        assert!(!is_valid_handle("alice-"));
    }
}
