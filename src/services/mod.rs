//! Service layer
//!
//! Command and query objects built once at startup and shared through the
//! application state, plus the Redis cache they use.

pub mod activity;
pub mod bids;
pub mod cache;
pub mod reports;
pub mod teams;

pub use activity::ActivityRecorder;
pub use bids::BidService;
pub use cache::RedisCache;
pub use reports::ReportService;
pub use teams::TeamService;
