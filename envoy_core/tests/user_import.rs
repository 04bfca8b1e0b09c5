use anyhow::Result;

use envoy_core::{
    decode_document, encode_users,
    resource::{Resource, ResourceNode, RBAC_RESOURCE_TYPE, ROLE_RESOURCE_TYPE, USER_RESOURCE_TYPE},
    EnvoyError, MarshalEnvoy,
};

const USERS: &str = r#"
users:
  alice: alice@example.tld
  bob:
    email: bob@example.tld
    name: Bob
    roles:
      - admins
      - editors
    allow:
      editors: [read, update]
    (envoy):
      onExisting: replace
    updatedAt: "2022-02-02T02:02:02Z"
  carol:
    email: carol@example.tld
    emailConfirmed: false
"#;

#[test]
fn import_produces_users_and_rules() -> Result<()> {
    let nodes = decode_document(USERS)?.marshal_envoy()?;

    let types = nodes.iter().map(|n| n.resource_type()).collect::<Vec<_>>();
    assert_eq!(
        types,
        vec![
            USER_RESOURCE_TYPE,
            USER_RESOURCE_TYPE,
            RBAC_RESOURCE_TYPE,
            RBAC_RESOURCE_TYPE,
            USER_RESOURCE_TYPE,
        ]
    );

    // bob depends on his roles
    let bob = &nodes[1];
    assert!(bob.identifiers().contains("bob"));
    assert!(bob
        .refs()
        .iter()
        .all(|r| r.resource_type == ROLE_RESOURCE_TYPE));
    assert_eq!(bob.refs().len(), 2);

    // rules point back at bob
    for rule in &nodes[2..4] {
        assert!(rule
            .refs()
            .iter()
            .any(|r| r.resource_type == USER_RESOURCE_TYPE && r.identifiers.contains("bob")));
    }
    Ok(())
}

#[test]
fn nodes_serialize_to_json() -> Result<()> {
    let nodes = decode_document(USERS)?.marshal_envoy()?;
    let json = serde_json::to_value(&nodes)?;

    assert_eq!(json[0]["type"], "user");
    assert_eq!(json[0]["res"]["handle"], "alice");
    assert_eq!(json[0]["res"]["emailConfirmed"], true);
    assert_eq!(json[1]["config"]["onExisting"], "replace");
    assert_eq!(json[1]["timestamps"]["updatedAt"], "2022-02-02T02:02:02Z");
    assert_eq!(json[2]["type"], "rbac_rule");
    assert_eq!(json[2]["access"], "allow");
    assert_eq!(json[4]["res"]["emailConfirmed"], false);
    Ok(())
}

#[test]
fn export_round_trips_scalar_fields_and_roles() -> Result<()> {
    let before = decode_document(USERS)?;
    let yaml = encode_users(&before.marshal_envoy()?)?;
    let after = decode_document(&yaml)?;

    let summary = |set: &envoy_core::UserSet| {
        set.iter()
            .map(|u| {
                (
                    u.res.handle.to_owned(),
                    u.res.email.to_owned(),
                    u.res.email_confirmed,
                    u.roles.to_owned(),
                )
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(summary(&after), summary(&before));
    Ok(())
}

#[test]
fn malformed_entry_reports_where_it_is() {
    let doc = "users:\n  alice:\n    - alice@example.tld\n";

    match decode_document(doc) {
        Err(e @ EnvoyError::Shape { .. }) => {
            let loc = e.location().expect("shape errors carry a location");
            assert!(loc.line >= 2);
            assert!(e.to_string().contains("malformed user definition"));
        }
        other => panic!("expected a shape error, got {other:?}"),
    }
}

#[test]
fn user_nodes_only_for_users() -> Result<()> {
    let nodes = decode_document("users:\n  alice: alice@example.tld\n")?.marshal_envoy()?;

    assert_eq!(nodes.len(), 1);
    assert!(matches!(&nodes[0], ResourceNode::User(u) if u.role_membership.is_empty()));
    Ok(())
}

#[test]
fn repeated_handle_in_one_file_is_reported() {
    let doc = "users:\n  alice: first@x.tld\n  alice: second@x.tld\n";

    match decode_document(doc) {
        Err(e @ EnvoyError::Shape { .. }) => {
            assert_eq!(e.location().map(|l| l.line), Some(3));
            assert!(e.to_string().contains("`alice` is defined more than once"));
        }
        other => panic!("expected a shape error, got {other:?}"),
    }
}

#[test]
fn same_handle_in_two_documents_is_kept_but_not_exported() -> Result<()> {
    let doc = "users:\n  alice: first@x.tld\n---\nusers:\n  alice: second@x.tld\n";
    let set = decode_document(doc)?;
    assert_eq!(set.len(), 2);

    let res = encode_users(&set.marshal_envoy()?);
    assert!(matches!(res, Err(EnvoyError::Serialize(_))));
    Ok(())
}
