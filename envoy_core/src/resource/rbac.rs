//! Access rules attached to resource definitions.

use std::fmt::Display;

use serde::Serialize;

use crate::error::{EnvoyError, Result};

use super::{Identifiers, Resource, ResourceRef, RBAC_RESOURCE_TYPE, ROLE_RESOURCE_TYPE};

/// Whether a rule grants or revokes an operation.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    /// Grant the operation
    Allow,
    /// Revoke the operation
    Deny,
}

impl Display for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Access::Allow => write!(f, "allow"),
            Access::Deny => write!(f, "deny"),
        }
    }
}

/// A single access rule as written in a definition: `role` may (or may not)
/// perform `operation` on the resource the rule is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RbacRule {
    /// Handle of the role the rule applies to
    pub role: String,
    /// Grant or revoke
    pub access: Access,
    /// The operation, such as `read` or `update`
    pub operation: String,
}

impl RbacRule {
    /// Basic constructor
    pub fn new(role: &str, access: Access, operation: &str) -> Self {
        Self {
            role: role.to_owned(),
            access,
            operation: operation.to_owned(),
        }
    }

    /// Bind the rule to a resource, producing an exportable rule node.
    pub fn bind<R: Resource>(&self, res: &R) -> Result<RbacRuleResource> {
        if self.role.is_empty() {
            return Err(EnvoyError::Binding {
                resource: res.resource_type().to_owned(),
                message: format!("{} rule for `{}` has no role", self.access, self.operation),
            });
        }
        if res.identifiers().is_empty() {
            return Err(EnvoyError::Binding {
                resource: res.resource_type().to_owned(),
                message: "resource has no identifiers to bind access rules to".to_owned(),
            });
        }

        let role_ids = Identifiers::new([&self.role]);
        let resource = ResourceRef::new(res.resource_type(), res.identifiers().to_owned());
        let identifiers = Identifiers::new([format!(
            "{}:{}:{}:{}",
            self.access,
            self.role,
            res.identifiers().first().map(String::as_str).unwrap_or_default(),
            self.operation
        )]);

        Ok(RbacRuleResource {
            identifiers,
            refs: vec![
                ResourceRef::new(ROLE_RESOURCE_TYPE, role_ids.clone()),
                resource.clone(),
            ],
            role: role_ids,
            resource,
            access: self.access,
            operation: self.operation.to_owned(),
        })
    }
}

/// All access rules of one definition, in definition order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RbacRuleSet(pub Vec<RbacRule>);

impl RbacRuleSet {
    /// Whether there are no rules
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Bind every rule to the given resource, one node (or error) per rule.
    pub fn bind_resource<'a, R: Resource>(
        &'a self,
        res: &'a R,
    ) -> impl Iterator<Item = Result<RbacRuleResource>> + 'a {
        self.0.iter().map(move |r| r.bind(res))
    }
}

/// The exportable form of an access rule.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RbacRuleResource {
    pub(crate) identifiers: Identifiers,
    pub(crate) refs: Vec<ResourceRef>,
    /// The role the rule applies to
    pub role: Identifiers,
    /// The resource the rule is bound to
    pub resource: ResourceRef,
    /// Grant or revoke
    pub access: Access,
    /// The operation
    pub operation: String,
}

impl Resource for RbacRuleResource {
    fn resource_type(&self) -> &'static str {
        RBAC_RESOURCE_TYPE
    }

    fn identifiers(&self) -> &Identifiers {
        &self.identifiers
    }

    fn refs(&self) -> &[ResourceRef] {
        &self.refs
    }
}
