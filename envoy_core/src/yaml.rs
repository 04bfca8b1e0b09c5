//! Decode resource definitions from YAML documents and encode them back.

mod document;
mod encode;
pub mod envoy_config;
pub mod node;
pub mod rbac;
pub mod refs;
pub mod timestamps;
pub mod user;

use crate::{error::Result, resource::ResourceNode};

pub use document::decode_document;
pub use encode::encode_users;
pub use user::{UserDefinition, UserSet};

/// Anything that can be turned into a flat list of exportable resource nodes.
pub trait MarshalEnvoy {
    /// Produce the nodes. The first failure aborts and no nodes are returned.
    fn marshal_envoy(&self) -> Result<Vec<ResourceNode>>;
}
