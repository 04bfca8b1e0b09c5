//! Generic resource nodes produced by encoding decoded definitions.
//!
//! Every decoded definition turns into one primary node plus any number of
//! auxiliary nodes (such as access rules) that point back at it. The nodes
//! only carry identifiers and references; resolving those references into a
//! dependency graph happens further down the pipeline.

mod meta;
mod rbac;
mod user;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use meta::{EnvoyConfig, MergeAlg, Timestamps};
pub use rbac::{Access, RbacRule, RbacRuleResource, RbacRuleSet};
pub use user::UserResource;

/// Resource type of users
pub const USER_RESOURCE_TYPE: &str = "system:user";
/// Resource type of roles
pub const ROLE_RESOURCE_TYPE: &str = "system:role";
/// Resource type of access rules
pub const RBAC_RESOURCE_TYPE: &str = "rbac-rule";

/// An ordered set of values that identify a resource (handle, email, ID).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Identifiers(Vec<String>);

impl Identifiers {
    /// Build a set from the given values, ignoring blanks and repeats.
    pub fn new<I, S>(ii: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut res = Identifiers::default();
        for i in ii {
            res.add(i.as_ref());
        }
        res
    }

    /// Add an identifier. Blank and repeated values are skipped.
    pub fn add(&mut self, i: &str) {
        let i = i.trim();
        if i.is_empty() || self.contains(i) {
            return;
        }
        self.0.push(i.to_owned());
    }

    /// Whether the identifier is part of the set
    pub fn contains(&self, i: &str) -> bool {
        self.0.iter().any(|v| v == i)
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the identifiers in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    /// The first (primary) identifier
    pub fn first(&self) -> Option<&String> {
        self.0.first()
    }
}

/// A reference from one resource to another.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    /// Type of the referenced resource
    pub resource_type: String,
    /// Identifiers that the referenced resource must match
    pub identifiers: Identifiers,
}

impl ResourceRef {
    /// Basic constructor
    pub fn new(resource_type: &str, identifiers: Identifiers) -> Self {
        Self {
            resource_type: resource_type.to_owned(),
            identifiers,
        }
    }
}

/// Behaviour shared by every exportable resource.
pub trait Resource {
    /// The resource type, such as `system:user`
    fn resource_type(&self) -> &'static str;
    /// Values that identify the resource
    fn identifiers(&self) -> &Identifiers;
    /// Other resources this one depends on
    fn refs(&self) -> &[ResourceRef];
}

/// A single exportable node.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResourceNode {
    /// A user account
    User(UserResource),
    /// An access rule bound to some other node
    RbacRule(RbacRuleResource),
}

impl Resource for ResourceNode {
    fn resource_type(&self) -> &'static str {
        match self {
            ResourceNode::User(u) => u.resource_type(),
            ResourceNode::RbacRule(r) => r.resource_type(),
        }
    }

    fn identifiers(&self) -> &Identifiers {
        match self {
            ResourceNode::User(u) => u.identifiers(),
            ResourceNode::RbacRule(r) => r.identifiers(),
        }
    }

    fn refs(&self) -> &[ResourceRef] {
        match self {
            ResourceNode::User(u) => u.refs(),
            ResourceNode::RbacRule(r) => r.refs(),
        }
    }
}

impl From<UserResource> for ResourceNode {
    fn from(val: UserResource) -> Self {
        ResourceNode::User(val)
    }
}

impl From<RbacRuleResource> for ResourceNode {
    fn from(val: RbacRuleResource) -> Self {
        ResourceNode::RbacRule(val)
    }
}

/// Combine a primary node and its auxiliary nodes into one flat list.
///
/// The primary node comes first. The first auxiliary error aborts the whole
/// collection.
pub fn collect_nodes<P, I, N>(primary: P, aux: I) -> Result<Vec<ResourceNode>>
where
    P: Into<ResourceNode>,
    I: IntoIterator<Item = Result<N>>,
    N: Into<ResourceNode>,
{
    let mut nodes = vec![primary.into()];
    for n in aux {
        nodes.push(n?.into());
    }
    Ok(nodes)
}

#[cfg(test)]
mod test {
    use crate::{error::EnvoyError, types::User};

    use super::*;

    #[test]
    fn identifiers_skip_blanks_and_repeats() {
        let ids = Identifiers::new(["alice", "", "alice@x.tld", " alice "]);
        assert_eq!(
            ids.iter().cloned().collect::<Vec<_>>(),
            vec!["alice".to_owned(), "alice@x.tld".to_owned()]
        );
        assert_eq!(ids.first(), Some(&"alice".to_owned()));
    }

    #[test]
    fn collect_nodes_puts_primary_first() -> anyhow::Result<()> {
        let mut user = User::new();
        user.handle = "alice".to_owned();
        let primary = UserResource::new(user, vec![]);
        let rule = RbacRule::new("admins", Access::Allow, "read");
        let aux = vec![rule.bind(&primary)];

        let nodes = collect_nodes(primary, aux)?;

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].resource_type(), USER_RESOURCE_TYPE);
        assert_eq!(nodes[1].resource_type(), RBAC_RESOURCE_TYPE);
        Ok(())
    }

    #[test]
    fn collect_nodes_stops_at_first_error() {
        let primary = UserResource::new(User::new(), vec![]);
        let aux: Vec<Result<RbacRuleResource>> = vec![Err(EnvoyError::Binding {
            resource: USER_RESOURCE_TYPE.to_owned(),
            message: "boom".to_owned(),
        })];

        assert!(collect_nodes(primary, aux).is_err());
    }
}
