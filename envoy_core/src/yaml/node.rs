//! Helpers for walking parsed YAML nodes.
//!
//! Every helper takes the source text alongside the node so errors can point
//! at the offending spot in the document.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use yaml_peg::{parse, repr::RcRepr, NodeRc, Yaml};

use crate::error::{EnvoyError, Location, Result};

/// Lines of context shown around an offending node
const CONTEXT_LINES: usize = 2;

lazy_static! {
    // a block mapping key at the start of a line: quoted, or plain up to `: `
    static ref BLOCK_KEY: Regex =
        Regex::new(r#"^(?:"([^"]*)"|'([^']*)'|([^\s#'"?{\[\-].*?))\s*:(?:\s|$)"#)
            .expect("block key pattern is valid");
}

/// The shape of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Null, boolean, number or string
    Scalar,
    /// A map of key/value pairs
    Mapping,
    /// A list of nodes
    Sequence,
    /// Anything else (unresolved aliases)
    Other,
}

/// Parse every document in `doc`.
pub fn parse_documents(doc: &str) -> Result<Vec<NodeRc>> {
    parse::<RcRepr>(doc).map_err(|e| EnvoyError::Syntax(e.to_string()))
}

/// Classify a node.
pub fn kind(node: &NodeRc) -> NodeKind {
    match node.yaml() {
        Yaml::Null | Yaml::Bool(_) | Yaml::Int(_) | Yaml::Float(_) | Yaml::Str(_) => {
            NodeKind::Scalar
        }
        Yaml::Map(_) => NodeKind::Mapping,
        Yaml::Seq(_) => NodeKind::Sequence,
        _ => NodeKind::Other,
    }
}

/// Whether the node has the given shape.
pub fn is_kind(node: &NodeRc, k: NodeKind) -> bool {
    kind(node) == k
}

/// The textual value of a scalar node. Null reads as the empty string.
pub fn scalar_value(node: &NodeRc) -> Option<String> {
    match node.yaml() {
        Yaml::Null => Some(String::new()),
        Yaml::Bool(v) => Some(v.to_string()),
        Yaml::Int(v) => Some(v.to_string()),
        Yaml::Float(v) => Some(v.to_string()),
        Yaml::Str(v) => Some(v.to_string()),
        _ => None,
    }
}

/// Look up an optional field of a map by name.
pub fn lookup(node: &NodeRc, name: &str) -> Option<NodeRc> {
    if !is_kind(node, NodeKind::Mapping) {
        return None;
    }
    node.get(name).ok().cloned()
}

/// Call `f` with every key/value pair of a map, in document order. Stops at the first error.
///
/// A block map that repeats a key is a shape error pointing at the repeat.
pub fn each_map<F>(node: &NodeRc, doc: &str, mut f: F) -> Result<()>
where
    F: FnMut(&NodeRc, &NodeRc) -> Result<()>,
{
    let map = node
        .as_map()
        .map_err(|_| shape_err(doc, node, "expecting a map"))?;
    if let Some(first) = map.iter().map(|(k, _)| k).min_by_key(|k| k.pos()) {
        reject_repeated_keys(first, doc)?;
    }
    for (k, v) in map {
        f(&k, &v)?;
    }
    Ok(())
}

/// The parser keeps only the last value of a repeated key, so repeats are
/// found in the source text instead: every line of the block at the
/// indentation of the map's keys holds a sibling key. Flow maps (`{a: 1}`)
/// and maps opened by a list dash are not checked.
fn reject_repeated_keys(first: &NodeRc, doc: &str) -> Result<()> {
    let Some(first_key) = scalar_value(first) else {
        return Ok(());
    };
    let Some(before) = doc.get(..first.pos() as usize) else {
        return Ok(());
    };
    let key_line = before.rfind('\n').map_or(0, |i| i + 1);
    let Some((indent, body)) = split_indent(doc[key_line..].lines().next().unwrap_or_default())
    else {
        return Ok(());
    };
    if block_key(body) != Some(first_key.as_str()) {
        return Ok(());
    }

    // the surviving key may be a repeat, so walk back to the top of the block
    let mut start = key_line;
    while start > 0 {
        let prev = doc[..start - 1].rfind('\n').map_or(0, |i| i + 1);
        if let Some((depth, body)) = split_indent(&doc[prev..start - 1]) {
            if depth < indent || ends_block(depth, body) {
                break;
            }
        }
        start = prev;
    }

    let mut seen = HashSet::new();
    let mut offset = start;
    for line in doc[start..].split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        let Some((depth, body)) = split_indent(line) else {
            continue;
        };
        if depth < indent || ends_block(depth, body) {
            break;
        }
        if depth > indent {
            continue;
        }
        let Some(key) = block_key(body) else {
            break;
        };
        if !seen.insert(key) {
            return Err(EnvoyError::Shape {
                message: format!("`{key}` is defined more than once in the same map"),
                location: Location::from_pos(doc, (line_start + depth) as u64, CONTEXT_LINES),
            });
        }
    }
    Ok(())
}

/// Indentation and content of a line; `None` for blank and comment lines.
fn split_indent(line: &str) -> Option<(usize, &str)> {
    let text = line.trim_end();
    let body = text.trim_start();
    if body.is_empty() || body.starts_with('#') {
        return None;
    }
    Some((text.len() - body.len(), body))
}

fn ends_block(depth: usize, body: &str) -> bool {
    depth == 0 && (body.starts_with("---") || body.starts_with("..."))
}

fn block_key(line: &str) -> Option<&str> {
    let caps = BLOCK_KEY.captures(line)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str())
}

/// Call `f` with every element of a sequence, in document order. Stops at the first error.
pub fn each_seq<F>(node: &NodeRc, doc: &str, mut f: F) -> Result<()>
where
    F: FnMut(&NodeRc) -> Result<()>,
{
    let seq = node
        .as_seq()
        .map_err(|_| shape_err(doc, node, "expecting a list"))?;
    for v in seq {
        f(&v)?;
    }
    Ok(())
}

/// Decode a scalar node into a string. `label` names the value in the error message.
pub fn decode_scalar(node: &NodeRc, label: &str, doc: &str) -> Result<String> {
    scalar_value(node).ok_or_else(|| shape_err(doc, node, format!("{label} must be a scalar")))
}

/// Decode a boolean node.
pub fn decode_bool(node: &NodeRc, label: &str, doc: &str) -> Result<bool> {
    match node.yaml() {
        Yaml::Bool(v) => Ok(*v),
        _ => Err(value_err(doc, node, format!("{label} is not a boolean"))),
    }
}

/// Decode an optional scalar field of a map.
pub fn optional_scalar(node: &NodeRc, field_name: &str, doc: &str) -> Result<Option<String>> {
    lookup(node, field_name)
        .map(|v| decode_scalar(&v, &format!("\"{field_name}\""), doc))
        .transpose()
}

/// Decode an optional boolean field of a map.
pub fn optional_bool(node: &NodeRc, field_name: &str, doc: &str) -> Result<Option<bool>> {
    lookup(node, field_name)
        .map(|v| decode_bool(&v, &format!("\"{field_name}\""), doc))
        .transpose()
}

/// Where the node sits in the document
pub fn location(doc: &str, node: &NodeRc) -> Location {
    Location::from_pos(doc, node.pos(), CONTEXT_LINES)
}

/// The node has the wrong shape for its position
pub fn shape_err(doc: &str, node: &NodeRc, message: impl Into<String>) -> EnvoyError {
    EnvoyError::Shape {
        message: message.into(),
        location: location(doc, node),
    }
}

/// The node cannot be used as a reference
pub fn reference_err(doc: &str, node: &NodeRc, message: impl Into<String>) -> EnvoyError {
    EnvoyError::Reference {
        message: message.into(),
        location: location(doc, node),
    }
}

/// The node holds an unusable value
pub fn value_err(doc: &str, node: &NodeRc, message: impl Into<String>) -> EnvoyError {
    EnvoyError::Value {
        message: message.into(),
        location: location(doc, node),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn root(doc: &str) -> NodeRc {
        parse_documents(doc).unwrap().remove(0)
    }

    #[test]
    fn node_kinds_are_classified() {
        let doc = "a: x\nb: [1, 2]\nc: {d: 1}\ne: 12\nf: ~\n";
        let r = root(doc);

        assert_eq!(kind(&r), NodeKind::Mapping);
        assert_eq!(kind(&lookup(&r, "a").unwrap()), NodeKind::Scalar);
        assert_eq!(kind(&lookup(&r, "b").unwrap()), NodeKind::Sequence);
        assert_eq!(kind(&lookup(&r, "c").unwrap()), NodeKind::Mapping);
        assert_eq!(kind(&lookup(&r, "e").unwrap()), NodeKind::Scalar);
        assert_eq!(kind(&lookup(&r, "f").unwrap()), NodeKind::Scalar);
    }

    #[test]
    fn lookup_missing_field_is_none() {
        let r = root("a: x\n");
        assert!(lookup(&r, "b").is_none());
        assert!(lookup(&lookup(&r, "a").unwrap(), "a").is_none());
    }

    #[test]
    fn each_map_keeps_document_order() -> Result<()> {
        let doc = "zed: 1\nalpha: 2\nmid: 3\n";
        let mut keys = vec![];
        each_map(&root(doc), doc, |k, _| {
            keys.push(decode_scalar(k, "key", doc)?);
            Ok(())
        })?;

        assert_eq!(keys, vec!["zed", "alpha", "mid"]);
        Ok(())
    }

    #[test]
    fn repeated_key_in_one_map_is_a_shape_error() {
        let doc = "team: core\nsite: remote\nteam: ops\n";
        let res = each_map(&root(doc), doc, |_, _| Ok(()));

        match res {
            Err(EnvoyError::Shape { message, location }) => {
                assert!(message.contains("`team`"));
                assert_eq!(location.line, 3);
            }
            other => panic!("expected a shape error, got {other:?}"),
        }
    }

    #[test]
    fn repeated_quoted_key_is_found() {
        let doc = "outer:\n  \"a b\": 1\n  # note\n  'a b': 2\n";
        let inner = lookup(&root(doc), "outer").unwrap();
        assert!(matches!(
            each_map(&inner, doc, |_, _| Ok(())),
            Err(EnvoyError::Shape { .. })
        ));
    }

    #[test]
    fn sibling_maps_may_share_keys() -> Result<()> {
        let doc = "a:\n  x: 1\n  y: |\n    x: not a key\nb:\n  x: 2\nc: {x: 3}\n---\na: 4\n";
        let docs = parse_documents(doc)?;
        let r = &docs[0];

        let mut count = 0;
        each_map(r, doc, |_, _| {
            count += 1;
            Ok(())
        })?;
        for name in ["a", "b", "c"] {
            each_map(&lookup(r, name).unwrap(), doc, |_, _| Ok(()))?;
        }
        each_map(&docs[1], doc, |_, _| Ok(()))?;

        assert_eq!(count, 3);
        Ok(())
    }

    #[test]
    fn each_seq_on_map_is_a_shape_error() {
        let doc = "a: 1\n";
        let res = each_seq(&root(doc), doc, |_| Ok(()));
        assert!(matches!(res, Err(EnvoyError::Shape { .. })));
    }

    #[test]
    fn scalars_decode_to_strings() -> Result<()> {
        let doc = "s: text\ni: 42\nb: true\nn: ~\n";
        let r = root(doc);

        assert_eq!(optional_scalar(&r, "s", doc)?, Some("text".to_owned()));
        assert_eq!(optional_scalar(&r, "i", doc)?, Some("42".to_owned()));
        assert_eq!(optional_scalar(&r, "b", doc)?, Some("true".to_owned()));
        assert_eq!(optional_scalar(&r, "n", doc)?, Some("".to_owned()));
        assert_eq!(optional_scalar(&r, "missing", doc)?, None);
        Ok(())
    }

    #[test]
    fn non_scalar_field_reports_location() {
        let doc = "name:\n  - a\n  - b\n";
        let err = optional_scalar(&root(doc), "name", doc).unwrap_err();

        assert!(err.to_string().contains("\"name\" must be a scalar"));
        assert!(err.location().is_some());
    }

    #[test]
    fn bools_must_be_bools() -> Result<()> {
        let doc = "ok: true\nbad: nope\n";
        let r = root(doc);

        assert_eq!(optional_bool(&r, "ok", doc)?, Some(true));
        assert!(matches!(
            optional_bool(&r, "bad", doc),
            Err(EnvoyError::Value { .. })
        ));
        Ok(())
    }

    #[test]
    fn invalid_yaml_is_a_syntax_error() {
        assert!(matches!(
            parse_documents("a: [1, 2\n"),
            Err(EnvoyError::Syntax(_))
        ));
    }
}
