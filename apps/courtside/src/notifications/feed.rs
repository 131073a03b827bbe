use std::sync::Arc;

use tracing::warn;

use crate::api::ApiClient;

use super::EventCallback;
use super::model::{Notification, NotificationId};
use super::store::NotificationStore;

/// Per-surface notification state: one store seeded over REST and fed by
/// the push connection, plus the optimistic read-state flows.
pub struct NotificationFeed {
    api: ApiClient,
    store: Arc<NotificationStore>,
}

impl NotificationFeed {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            store: Arc::new(NotificationStore::new()),
        }
    }

    /// Seed the feed from the REST collaborator. A failed fetch leaves the
    /// feed usable with an empty list rather than blocking the surface.
    pub async fn load(&self) {
        match self.api.fetch_notifications().await {
            Ok(items) => self.store.seed(items),
            Err(err) => {
                warn!(error = %err, "failed to fetch notifications, starting empty");
                self.store.seed(Vec::new());
            }
        }
    }

    /// Callback for [`crate::notifications::ConnectionManager::acquire`],
    /// merging pushed notifications into this feed's store.
    pub fn callback(&self) -> EventCallback {
        let store = Arc::clone(&self.store);
        Arc::new(move |notification: Notification| store.push(notification))
    }

    /// Flip a notification read locally, then persist over REST. The local
    /// flip is optimistic: a failed call is logged and the flip kept, so
    /// local and server state may diverge until the next [`Self::load`].
    pub async fn mark_read(&self, id: &NotificationId) {
        self.store.mark_read(id);
        if let Err(err) = self.api.mark_read(id).await {
            warn!(%id, error = %err, "failed to persist read state");
        }
    }

    /// Bulk variant of [`Self::mark_read`]: one local sweep, one REST call.
    pub async fn mark_all_read(&self) {
        self.store.mark_all_read();
        if let Err(err) = self.api.mark_all_read().await {
            warn!(error = %err, "failed to persist bulk read state");
        }
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.store.snapshot()
    }

    pub fn unread_count(&self) -> usize {
        self.store.unread_count()
    }
}
