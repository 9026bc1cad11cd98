//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod channel_user_notifier;
mod http_community_store;
mod in_memory_community_store;
mod postgres_community_store;
mod tracing_diagnostics;

pub use channel_user_notifier::ChannelUserNotifier;
pub use http_community_store::{HttpCommunityStore, HttpStoreConfig};
pub use in_memory_community_store::InMemoryCommunityStore;
pub use postgres_community_store::PostgresCommunityStore;
pub use tracing_diagnostics::TracingDiagnostics;
