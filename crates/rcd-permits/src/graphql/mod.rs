//! GraphQL surface of the portal: one schema over the workflow services.

pub mod context;
pub mod errors;
pub mod mutation;
pub mod query;
pub mod schema;
pub mod types;


pub use context::{PortalContext, Viewer};
pub use schema::{build_schema, PortalSchema};
