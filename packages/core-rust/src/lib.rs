//! `Roost` Core -- panel wire envelopes, typed record schemas, and request payloads.

pub mod envelope;
pub mod records;
pub mod requests;

pub use envelope::{Envelope, ListDocument, ListMeta, Pagination};
pub use records::{
    AllocationRecord, AppServerRecord, ClientServerRecord, EggRecord, FeatureLimits, Limits,
    LocationRecord, NestRecord, NodeRecord, ResourceUsageRecord, UserRecord,
};
