use parking_lot::Mutex;

use super::model::{Notification, NotificationId};

/// In-memory notification list for a single consumer surface.
///
/// Ordering is insertion order, newest first, with ids unique within the
/// list. Pushes that arrive before the REST seed completes are buffered and
/// replayed in arrival order once the seed lands, so the two can race in
/// either direction without losing an event.
///
/// Each mounted surface owns its own store; there is no cross-surface
/// sharing, and two stores over the same account may diverge until their
/// next seed.
#[derive(Default)]
pub struct NotificationStore {
    inner: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    items: Vec<Notification>,
    seeded: bool,
    pending: Vec<Notification>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the list fetched over REST, then replay any pushes that
    /// raced ahead of it, in arrival order.
    pub fn seed(&self, items: Vec<Notification>) {
        let mut state = self.inner.lock();
        state.items = items;
        state.seeded = true;
        let pending = std::mem::take(&mut state.pending);
        for notification in pending {
            prepend(&mut state.items, notification);
        }
    }

    /// Merge a pushed notification. Duplicate ids are dropped so an event
    /// applies at most once.
    pub fn push(&self, notification: Notification) {
        let mut state = self.inner.lock();
        if state.seeded {
            prepend(&mut state.items, notification);
        } else {
            state.pending.push(notification);
        }
    }

    /// Flip one notification to read. Returns whether a match existed;
    /// absent ids are a no-op. There is no path back to unread.
    pub fn mark_read(&self, id: &NotificationId) -> bool {
        let mut state = self.inner.lock();
        match state.items.iter_mut().find(|n| &n.id == id) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&self) {
        let mut state = self.inner.lock();
        for notification in &mut state.items {
            notification.read = true;
        }
    }

    /// Unread count is always derived from the current list, never cached.
    pub fn unread_count(&self) -> usize {
        self.inner.lock().items.iter().filter(|n| !n.read).count()
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.inner.lock().items.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn prepend(items: &mut Vec<Notification>, notification: Notification) {
    if items.iter().any(|existing| existing.id == notification.id) {
        return;
    }
    items.insert(0, notification);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(id: &str, read: bool) -> Notification {
        Notification {
            id: NotificationId::from(id),
            message: format!("notification {id}"),
            created_at: None,
            time: None,
            read,
            related_url: None,
        }
    }

    fn ids(store: &NotificationStore) -> Vec<String> {
        store
            .snapshot()
            .iter()
            .map(|n| n.id.as_str().to_string())
            .collect()
    }

    #[test]
    fn pushes_prepend_newest_first() {
        let store = NotificationStore::new();
        store.seed(vec![notification("1", false)]);
        store.push(notification("2", false));
        store.push(notification("3", false));
        assert_eq!(ids(&store), ["3", "2", "1"]);
    }

    #[test]
    fn duplicate_ids_merge_exactly_once() {
        let store = NotificationStore::new();
        store.seed(vec![notification("1", false)]);
        store.push(notification("2", false));
        store.push(notification("2", false));
        assert_eq!(ids(&store), ["2", "1"]);
    }

    #[test]
    fn pushes_before_the_seed_are_replayed_in_arrival_order() {
        let store = NotificationStore::new();
        store.push(notification("a", false));
        store.push(notification("b", false));
        assert!(store.is_empty());

        store.seed(vec![notification("s", false)]);
        assert_eq!(ids(&store), ["b", "a", "s"]);
    }

    #[test]
    fn replayed_pushes_dedupe_against_the_seed() {
        let store = NotificationStore::new();
        store.push(notification("s", false));
        store.seed(vec![notification("s", true)]);
        assert_eq!(ids(&store), ["s"]);
        // The seeded copy wins; the buffered duplicate is dropped.
        assert!(store.snapshot()[0].read);
    }

    #[test]
    fn unread_count_is_derived_from_the_list() {
        let store = NotificationStore::new();
        store.seed(vec![
            notification("1", true),
            notification("2", false),
            notification("3", false),
            notification("4", true),
            notification("5", false),
        ]);
        assert_eq!(store.unread_count(), 3);

        store.mark_read(&NotificationId::from("2"));
        assert_eq!(store.unread_count(), 2);

        store.push(notification("6", false));
        assert_eq!(store.unread_count(), 3);
    }

    #[test]
    fn mark_read_is_a_noop_for_absent_ids() {
        let store = NotificationStore::new();
        store.seed(vec![notification("1", false)]);
        assert!(!store.mark_read(&NotificationId::from("99")));
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn mark_all_read_flips_every_entry() {
        let store = NotificationStore::new();
        store.seed(vec![notification("1", false), notification("2", false)]);
        store.mark_all_read();
        assert_eq!(store.unread_count(), 0);
        assert!(store.snapshot().iter().all(|n| n.read));
    }

    #[test]
    fn reseeding_replaces_the_list() {
        let store = NotificationStore::new();
        store.seed(vec![notification("1", false)]);
        store.seed(vec![notification("2", false), notification("3", false)]);
        assert_eq!(ids(&store), ["2", "3"]);
    }
}
