//! Client-side storage
//!
//! Two stores back the client: a session-scoped [`CacheStore`] holding GET
//! responses with a TTL, and a [`DurableStore`] on disk for user, cart, and
//! last-transaction state that must survive restarts.

mod cache;
mod durable;

pub use cache::CacheStore;
pub use durable::DurableStore;
