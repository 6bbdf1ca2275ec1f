//! Typed attribute records for every panel resource.
//!
//! All records tolerate missing optional keys: only identity fields are
//! required, everything else defaults. Relationship blocks are `None` unless
//! the request asked for them via `include`.

pub mod catalog;
pub mod node;
pub mod server;
pub mod user;

pub use catalog::{AllocationRecord, EggRecord, LocationRecord, NestRecord};
pub use node::NodeRecord;
pub use server::{
    AppServerRecord, ClientServerRecord, FeatureLimits, Limits, ResourceUsageRecord,
};
pub use user::UserRecord;
