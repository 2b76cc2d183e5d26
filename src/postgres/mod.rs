// ABOUTME: PostgreSQL utilities module
// ABOUTME: Exports connection management and table introspection

pub mod connection;
pub mod introspect;

pub use connection::{connect_endpoint, Endpoint};
pub use introspect::primary_key_columns;
