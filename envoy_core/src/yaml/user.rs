//! Decoding and encoding user definitions.
//!
//! Users are defined under a `users` key, either in shorthand (the value is
//! the email) or in full:
//!
//! ```yaml
//! users:
//!   bob: bob@example.tld
//!   alice:
//!     email: alice@example.tld
//!     name: Alice
//!     roles: [admins, editors]
//!     allow:
//!       editors: [read]
//!     (envoy):
//!       onExisting: skip
//!     createdAt: 2021-01-01T00:00:00Z
//! ```

use yaml_peg::NodeRc;

use crate::{
    error::Result,
    logging::debug,
    resource::{collect_nodes, EnvoyConfig, RbacRuleSet, ResourceNode, Timestamps, UserResource},
    types::{User, UserKind},
};

use super::{
    envoy_config::decode_envoy_config,
    node::{
        decode_scalar, each_map, each_seq, is_kind, kind, lookup, optional_bool, optional_scalar,
        shape_err, value_err, NodeKind,
    },
    rbac::decode_rbac,
    refs::decode_ref,
    timestamps::decode_timestamps,
    MarshalEnvoy,
};

/// One decoded user definition with everything attached to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserDefinition {
    /// The user record
    pub res: User,
    /// Handles of the roles the user belongs to, in definition order
    pub roles: Vec<String>,
    /// Access rules defined on the user
    pub rbac: RbacRuleSet,
    /// Tool settings
    pub envoy_config: Option<EnvoyConfig>,
    /// Lifecycle markers
    pub ts: Option<Timestamps>,
}

/// All user definitions decoded so far, in document order.
///
/// Decoding appends: decoding several documents into the same set keeps
/// every entry, including entries that share a handle. Within one map a
/// repeated handle is rejected, since only one of the entries would survive
/// parsing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserSet(Vec<UserDefinition>);

impl UserSet {
    /// Decode the value of a `users` key and append the definitions.
    pub fn decode(&mut self, node: &NodeRc, doc: &str) -> Result<()> {
        match kind(node) {
            NodeKind::Mapping => each_map(node, doc, |k, v| {
                self.0.push(UserDefinition::decode_entry(k, v, doc)?);
                Ok(())
            }),
            // a list of users carries no keys to take handles from
            NodeKind::Sequence => each_seq(node, doc, |v| {
                Err(shape_err(doc, v, "malformed user definition"))
            }),
            NodeKind::Scalar if node.is_null() => Ok(()),
            _ => Err(shape_err(doc, node, "expecting a map of user definitions")),
        }
    }

    /// Number of definitions
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the definitions
    pub fn iter(&self) -> impl Iterator<Item = &UserDefinition> {
        self.0.iter()
    }
}

impl IntoIterator for UserSet {
    type Item = UserDefinition;
    type IntoIter = std::vec::IntoIter<UserDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Extend<UserDefinition> for UserSet {
    fn extend<T: IntoIterator<Item = UserDefinition>>(&mut self, iter: T) {
        self.0.extend(iter)
    }
}

impl UserDefinition {
    /// Decode one `handle: definition` entry.
    pub fn decode_entry(key: &NodeRc, value: &NodeRc, doc: &str) -> Result<Self> {
        let mut def = UserDefinition::default();

        match kind(value) {
            NodeKind::Scalar => def.res.email = decode_scalar(value, "user email", doc)?,
            NodeKind::Mapping => def.decode_map(value, doc)?,
            _ => {
                return Err(shape_err(
                    doc,
                    value,
                    "malformed user definition: expecting an email or a map",
                ))
            }
        }

        def.res.handle = decode_ref(key, "user", doc)?;
        debug!(handle = %def.res.handle, roles = def.roles.len(), rules = def.rbac.len(), "decoded user");

        Ok(def)
    }

    /// Decode the full (map) form of a definition on top of the current values.
    pub fn decode_map(&mut self, node: &NodeRc, doc: &str) -> Result<()> {
        if !is_kind(node, NodeKind::Mapping) {
            return Err(shape_err(doc, node, "user definition must be a map"));
        }

        decode_user_fields(&mut self.res, node, doc)?;
        self.rbac = decode_rbac(node, doc)?;
        self.envoy_config = decode_envoy_config(node, doc)?;
        self.roles = decode_user_roles(node, doc)?;
        self.ts = decode_timestamps(node, doc)?;

        Ok(())
    }
}

/// Decode the plain fields of a user. A `handle` field is ignored; handles
/// always come from the definition key.
fn decode_user_fields(user: &mut User, node: &NodeRc, doc: &str) -> Result<()> {
    if let Some(email) = optional_scalar(node, "email", doc)? {
        user.email = email;
    }
    if let Some(confirmed) = optional_bool(node, "emailConfirmed", doc)? {
        user.email_confirmed = confirmed;
    }
    if let Some(name) = optional_scalar(node, "name", doc)? {
        user.name = name;
    }
    if let Some(username) = optional_scalar(node, "username", doc)? {
        user.username = username;
    }

    if let Some(k) = lookup(node, "kind") {
        let name = decode_scalar(&k, "\"kind\"", doc)?;
        user.kind = UserKind::from_name(&name)
            .ok_or_else(|| value_err(doc, &k, format!("unknown user kind `{name}`")))?;
    }

    if let Some(labels) = lookup(node, "labels") {
        each_map(&labels, doc, |k, v| {
            user.labels
                .insert(decode_scalar(k, "label", doc)?, decode_scalar(v, "label value", doc)?);
            Ok(())
        })?;
    }

    Ok(())
}

/// Decode the `roles` list of a definition map. A missing (or empty) list
/// yields no roles; anything other than a list of scalars is rejected.
pub fn decode_user_roles(node: &NodeRc, doc: &str) -> Result<Vec<String>> {
    let roles_node = match lookup(node, "roles") {
        Some(n) if !n.is_null() => n,
        _ => return Ok(vec![]),
    };

    if !is_kind(&roles_node, NodeKind::Sequence) {
        return Err(shape_err(doc, &roles_node, "user roles must be a list"));
    }

    let mut roles = vec![];
    each_seq(&roles_node, doc, |v| {
        roles.push(decode_scalar(v, "role", doc)?);
        Ok(())
    })?;
    Ok(roles)
}

impl MarshalEnvoy for UserDefinition {
    fn marshal_envoy(&self) -> Result<Vec<ResourceNode>> {
        let mut rs = UserResource::new(self.res.to_owned(), self.roles.to_owned());
        rs.set_timestamps(self.ts.to_owned());
        rs.set_config(self.envoy_config.to_owned());

        let rules = self.rbac.bind_resource(&rs).collect::<Vec<_>>();
        collect_nodes(rs, rules)
    }
}

impl MarshalEnvoy for UserSet {
    fn marshal_envoy(&self) -> Result<Vec<ResourceNode>> {
        let mut nn = Vec::with_capacity(self.0.len());
        for def in &self.0 {
            nn.extend(def.marshal_envoy()?);
        }
        debug!(users = self.0.len(), nodes = nn.len(), "encoded users");
        Ok(nn)
    }
}
