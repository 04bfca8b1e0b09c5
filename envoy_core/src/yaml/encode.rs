use indexmap::IndexMap;
use serde::Serialize;

use crate::{
    error::{EnvoyError, Result},
    logging::debug,
    resource::{Access, EnvoyConfig, RbacRule, ResourceNode, Timestamps, USER_RESOURCE_TYPE},
    types::UserKind,
};

use super::{decode_document, UserDefinition};

#[derive(Serialize)]
struct UsersDoc {
    users: IndexMap<String, UserYaml>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserYaml {
    email: String,
    email_confirmed: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    username: String,
    kind: UserKind,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    labels: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    roles: Vec<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    allow: IndexMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    deny: IndexMap<String, Vec<String>>,
    #[serde(rename = "(envoy)", skip_serializing_if = "Option::is_none")]
    envoy: Option<EnvoyConfig>,
    #[serde(flatten)]
    timestamps: Option<Timestamps>,
}

/// Write the user nodes (and the access rules bound to them) back out as a
/// `users` document in full form. Nodes of other types are ignored.
///
/// Fails when two user nodes share a handle, since a document holds one
/// definition per handle and the rules of both would end up on one user.
/// Also fails when a value would not read back unchanged.
pub fn encode_users(nodes: &[ResourceNode]) -> Result<String> {
    let mut users: IndexMap<String, UserYaml> = IndexMap::new();

    for n in nodes {
        if let ResourceNode::User(u) = n {
            if users.contains_key(&u.res.handle) {
                return Err(EnvoyError::Serialize(format!(
                    "user `{}` is defined more than once",
                    u.res.handle
                )));
            }
            users.insert(
                u.res.handle.to_owned(),
                UserYaml {
                    email: u.res.email.to_owned(),
                    email_confirmed: u.res.email_confirmed,
                    name: u.res.name.to_owned(),
                    username: u.res.username.to_owned(),
                    kind: u.res.kind,
                    labels: u.res.labels.to_owned(),
                    roles: u.role_membership.to_owned(),
                    allow: IndexMap::new(),
                    deny: IndexMap::new(),
                    envoy: u.config.to_owned(),
                    timestamps: u.timestamps.to_owned(),
                },
            );
        }
    }

    // rules point at the user they were bound to by the user's primary identifier
    for n in nodes {
        let rule = match n {
            ResourceNode::RbacRule(r) if r.resource.resource_type == USER_RESOURCE_TYPE => r,
            _ => continue,
        };
        let (Some(handle), Some(role)) = (rule.resource.identifiers.first(), rule.role.first())
        else {
            continue;
        };
        if let Some(u) = users.get_mut(handle) {
            let section = match rule.access {
                Access::Allow => &mut u.allow,
                Access::Deny => &mut u.deny,
            };
            section
                .entry(role.to_owned())
                .or_default()
                .push(rule.operation.to_owned());
        }
    }

    let out = UsersDoc { users };
    let yaml =
        yaml_peg::serde::to_string(&out).map_err(|e| EnvoyError::Serialize(e.to_string()))?;
    check_read_back(&out.users, &yaml)?;
    Ok(yaml)
}

/// Strings are written without quotes, so one spelled like another YAML value
/// (`null`, `~`, `true`, `12`) reads back as that value. Decode the output
/// again and refuse it if any user changed on the way.
fn check_read_back(users: &IndexMap<String, UserYaml>, yaml: &str) -> Result<()> {
    let again = decode_document(yaml)
        .map_err(|e| EnvoyError::Serialize(format!("output does not read back: {e}")))?;
    if again.len() != users.len() {
        return Err(EnvoyError::Serialize(format!(
            "output reads back as {} users instead of {}",
            again.len(),
            users.len()
        )));
    }

    for ((handle, want), got) in users.iter().zip(again.iter()) {
        if let Some(field) = changed_field(handle, want, got) {
            return Err(EnvoyError::Serialize(format!(
                "{field} of user `{handle}` would not read back unchanged as plain YAML"
            )));
        }
    }
    debug!(users = users.len(), "encoded output reads back unchanged");
    Ok(())
}

fn changed_field(handle: &str, want: &UserYaml, got: &UserDefinition) -> Option<&'static str> {
    let rules = |access: Access, section: &IndexMap<String, Vec<String>>| {
        section
            .iter()
            .flat_map(|(role, ops)| ops.iter().map(move |op| RbacRule::new(role, access, op)))
            .collect::<Vec<_>>()
    };
    let mut want_rules = rules(Access::Allow, &want.allow);
    want_rules.extend(rules(Access::Deny, &want.deny));

    if got.res.handle != handle {
        Some("handle")
    } else if got.res.email != want.email {
        Some("email")
    } else if got.res.name != want.name {
        Some("name")
    } else if got.res.username != want.username {
        Some("username")
    } else if got.res.email_confirmed != want.email_confirmed || got.res.kind != want.kind {
        Some("kind")
    } else if got.res.labels != want.labels {
        Some("a label")
    } else if got.roles != want.roles {
        Some("a role")
    } else if got.rbac.0 != want_rules {
        Some("an access rule")
    } else if got.envoy_config != want.envoy {
        Some("the (envoy) section")
    } else if got.ts.as_ref() != want.timestamps.as_ref().filter(|t| !t.is_empty()) {
        Some("a timestamp")
    } else {
        None
    }
}
