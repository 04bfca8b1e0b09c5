//! Decoding the tool settings section of a definition.

use yaml_peg::NodeRc;

use crate::{
    error::Result,
    resource::{EnvoyConfig, MergeAlg},
};

use super::node::{decode_scalar, each_map, is_kind, lookup, scalar_value, shape_err, value_err, NodeKind};

/// Key holding the tool settings of a definition
pub const ENVOY_CONFIG_KEY: &str = "(envoy)";

/// Decode the `(envoy)` section of a definition map, if there is one.
///
/// ```yaml
/// (envoy):
///   skipIf: missing
///   onExisting: mergeLeft
/// ```
pub fn decode_envoy_config(node: &NodeRc, doc: &str) -> Result<Option<EnvoyConfig>> {
    let cfg_node = match lookup(node, ENVOY_CONFIG_KEY) {
        Some(n) => n,
        None => return Ok(None),
    };

    if !is_kind(&cfg_node, NodeKind::Mapping) {
        return Err(shape_err(
            doc,
            &cfg_node,
            format!("{ENVOY_CONFIG_KEY} configuration must be a map"),
        ));
    }

    let mut cfg = EnvoyConfig::default();
    each_map(&cfg_node, doc, |k, v| {
        match scalar_value(k).unwrap_or_default().to_lowercase().as_str() {
            "skipif" | "skip_if" => {
                cfg.skip_if = Some(decode_scalar(v, "skipIf", doc)?);
            }
            "onexisting" | "on_existing" => {
                let name = decode_scalar(v, "onExisting", doc)?;
                cfg.on_existing = MergeAlg::from_name(&name).ok_or_else(|| {
                    value_err(doc, v, format!("unknown merge algorithm `{name}`"))
                })?;
            }
            _ => (),
        }
        Ok(())
    })?;

    Ok(Some(cfg))
}
