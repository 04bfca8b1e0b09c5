//! Decoding access rules from a resource definition.
//!
//! ```yaml
//! allow:
//!   editors: [read, update]
//! deny:
//!   everyone: delete
//! ```

use yaml_peg::NodeRc;

use crate::{
    error::Result,
    logging::trace,
    resource::{Access, RbacRule, RbacRuleSet},
};

use super::{
    node::{decode_scalar, each_map, each_seq, kind, scalar_value, shape_err, value_err, NodeKind},
    refs::decode_ref,
};

/// Decode the `allow` and `deny` sections of a definition map. Definitions
/// without either section yield an empty rule set.
pub fn decode_rbac(node: &NodeRc, doc: &str) -> Result<RbacRuleSet> {
    let mut rules = vec![];

    each_map(node, doc, |k, v| {
        let access = match scalar_value(k).unwrap_or_default().to_lowercase().as_str() {
            "allow" => Access::Allow,
            "deny" => Access::Deny,
            _ => return Ok(()),
        };

        if !matches!(kind(v), NodeKind::Mapping) {
            return Err(shape_err(
                doc,
                v,
                format!("{access} rules must be a map of roles and operations"),
            ));
        }

        each_map(v, doc, |role, ops| {
            let role = decode_ref(role, "role", doc)?;
            let mut push = |op: &NodeRc| {
                let operation = decode_scalar(op, "operation", doc)?;
                if operation.trim().is_empty() {
                    return Err(value_err(doc, op, "operation must not be empty"));
                }
                trace!(%access, %role, %operation, "decoded access rule");
                rules.push(RbacRule::new(&role, access, operation.trim()));
                Ok(())
            };

            match kind(ops) {
                NodeKind::Scalar => push(ops),
                NodeKind::Sequence => each_seq(ops, doc, push),
                _ => Err(shape_err(
                    doc,
                    ops,
                    "operations must be a single operation or a list of operations",
                )),
            }
        })
    })?;

    Ok(RbacRuleSet(rules))
}
