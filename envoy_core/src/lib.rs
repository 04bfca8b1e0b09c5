//!
//! Envoy user import/export
//!
//! Decodes user definitions from YAML configuration documents and turns them
//! into generic resource nodes that the rest of the import/export pipeline
//! can register, order and write out.
#![deny(missing_docs)]

pub use error::{EnvoyError, Location, Result};
pub use yaml::{decode_document, encode_users, MarshalEnvoy, UserDefinition, UserSet};

pub mod error;
pub mod logging;
pub mod project;
pub mod resource;
pub mod types;
pub mod yaml;

#[macro_export]
/// Time the code inside the macro. Write the elapsed time to debug logs.
/// Derived from https://notes.iveselov.info/programming/time_it-a-case-study-in-rust-macros
macro_rules! log_runtime {
    ($context:literal, $($tt:tt)+) => {
        {
            $crate::logging::debug!("{}: starting", $context);
            let timer = std::time::Instant::now();
            let x =
            $(
                $tt
            )+;
            $crate::logging::debug!("{}: {:?}", $context, timer.elapsed());
            x
        }
    }
}
