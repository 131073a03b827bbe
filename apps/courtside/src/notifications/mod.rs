//! Real-time notification delivery: one shared push connection, a
//! per-surface store, and the optimistic read-state flows.

pub mod connection;
pub mod dispatch;
pub mod feed;
pub mod model;
pub mod store;

use std::sync::Arc;

pub use connection::{ConnectionHandle, ConnectionManager, ConnectionState, ReconnectPolicy};
pub use feed::NotificationFeed;
pub use model::{Notification, NotificationId};
pub use store::NotificationStore;

/// Callback invoked with each pushed notification.
///
/// Registered once per connection; see [`ConnectionManager::acquire`].
pub type EventCallback = Arc<dyn Fn(Notification) + Send + Sync>;
