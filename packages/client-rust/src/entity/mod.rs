//! Typed entities: read-mostly projections over one record plus the API
//! handle needed for follow-up actions.

pub mod nest;
pub mod node;
pub mod server;
pub mod user;

pub use nest::Nest;
pub use node::Node;
pub use server::ClientServer;
pub use user::User;
