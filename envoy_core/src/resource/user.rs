use serde::Serialize;

use crate::types::User;

use super::{
    EnvoyConfig, Identifiers, Resource, ResourceRef, Timestamps, ROLE_RESOURCE_TYPE,
    USER_RESOURCE_TYPE,
};

/// The exportable form of a user.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResource {
    pub(crate) identifiers: Identifiers,
    pub(crate) refs: Vec<ResourceRef>,
    /// The user record
    pub res: User,
    /// Handles of the roles the user is a member of
    pub role_membership: Vec<String>,
    /// Lifecycle markers, if any were defined
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<Timestamps>,
    /// Tool settings, if any were defined
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<EnvoyConfig>,
}

impl UserResource {
    /// Wrap a user. The user is identified by handle and email; every role is
    /// recorded as a reference so it is resolved before the user.
    pub fn new(res: User, roles: Vec<String>) -> Self {
        let identifiers = Identifiers::new([res.handle.as_str(), res.email.as_str()]);
        let refs = roles
            .iter()
            .map(|r| ResourceRef::new(ROLE_RESOURCE_TYPE, Identifiers::new([r])))
            .collect();

        Self {
            identifiers,
            refs,
            res,
            role_membership: roles,
            timestamps: None,
            config: None,
        }
    }

    /// Attach lifecycle markers
    pub fn set_timestamps(&mut self, ts: Option<Timestamps>) {
        self.timestamps = ts;
    }

    /// Attach tool settings
    pub fn set_config(&mut self, cfg: Option<EnvoyConfig>) {
        self.config = cfg;
    }
}

impl Resource for UserResource {
    fn resource_type(&self) -> &'static str {
        USER_RESOURCE_TYPE
    }

    fn identifiers(&self) -> &Identifiers {
        &self.identifiers
    }

    fn refs(&self) -> &[ResourceRef] {
        &self.refs
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn user_resource_refs_roles() {
        let mut user = User::new();
        user.handle = "alice".to_owned();
        user.email = "alice@example.tld".to_owned();

        let rs = UserResource::new(user, vec!["admins".to_owned(), "editors".to_owned()]);

        assert!(rs.identifiers().contains("alice"));
        assert!(rs.identifiers().contains("alice@example.tld"));
        assert_eq!(rs.refs().len(), 2);
        assert_eq!(rs.refs()[0].resource_type, ROLE_RESOURCE_TYPE);
        assert!(rs.refs()[1].identifiers.contains("editors"));
    }
}
