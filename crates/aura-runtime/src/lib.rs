//! AURA Runtime - the narrow doorway into the proximity core
//!
//! Everything outside the core (radar UI, chat, notifications) talks to
//! exactly two operations: `update_location` and `query_nearby`. Neither
//! ever returns another user's raw coordinates.
//!
//! Per-user ordering: callers are expected to serialize requests for a
//! single user (one request in flight per user), which is how the
//! request/response worker pool upstream behaves. Across different users
//! the service is freely concurrent; all methods take `&self`.

pub mod interest;
pub mod service;
pub mod sweeper;

pub use interest::*;
pub use service::*;
pub use sweeper::*;
