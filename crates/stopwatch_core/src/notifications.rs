use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, PoisonError, RwLock,
    },
};

use shared::domain::{Notification, NotificationKind};
use tracing::trace;

pub type NotificationHandler = Arc<dyn Fn(&Notification) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Observer registry with one ordered handler list per notification kind.
///
/// Handlers run synchronously on the emitting task, in subscription order.
/// The handler list is snapshotted before dispatch, so a handler may
/// subscribe or unsubscribe without deadlocking; the change applies from the
/// next emission.
#[derive(Default)]
pub struct NotificationHub {
    next_id: AtomicU64,
    handlers: RwLock<HashMap<NotificationKind, Vec<(SubscriptionId, NotificationHandler)>>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, kind: NotificationKind, handler: F) -> SubscriptionId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Subscribes one handler to every notification kind.
    pub fn subscribe_all<F>(&self, handler: F) -> Vec<SubscriptionId>
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let handler: NotificationHandler = Arc::new(handler);
        NotificationKind::ALL
            .into_iter()
            .map(|kind| {
                let handler = Arc::clone(&handler);
                self.subscribe(kind, move |notification| handler(notification))
            })
            .collect()
    }

    /// Returns whether a handler was removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        for list in handlers.values_mut() {
            if let Some(pos) = list.iter().position(|(existing, _)| *existing == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn subscriber_count(&self, kind: NotificationKind) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, Vec::len)
    }

    pub fn emit(&self, notification: &Notification) {
        let handlers: Vec<NotificationHandler> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&notification.kind)
            .map(|list| list.iter().map(|(_, handler)| Arc::clone(handler)).collect())
            .unwrap_or_default();

        trace!(
            kind = %notification.kind,
            subscribers = handlers.len(),
            "dispatching notification"
        );
        for handler in handlers {
            handler(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Mutex, time::Duration};

    use super::*;

    fn started(message: &str) -> Notification {
        Notification::new(NotificationKind::Started, message, Duration::ZERO)
    }

    #[test]
    fn dispatches_only_to_matching_kind() {
        let hub = NotificationHub::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        hub.subscribe(NotificationKind::Stopped, move |n| {
            sink.lock().expect("lock").push(n.message.clone())
        });

        hub.emit(&started("ignored"));
        assert!(seen.lock().expect("lock").is_empty());
    }

    #[test]
    fn unsubscribe_removes_a_single_handler() {
        let hub = NotificationHub::new();
        let count = Arc::new(AtomicU64::new(0));

        let first = {
            let count = Arc::clone(&count);
            hub.subscribe(NotificationKind::Started, move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        {
            let count = Arc::clone(&count);
            hub.subscribe(NotificationKind::Started, move |_| {
                count.fetch_add(10, Ordering::SeqCst);
            });
        }

        assert!(hub.unsubscribe(first));
        assert!(!hub.unsubscribe(first));
        assert_eq!(hub.subscriber_count(NotificationKind::Started), 1);

        hub.emit(&started("x"));
        assert_eq!(count.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn subscribe_all_covers_every_kind() {
        let hub = NotificationHub::new();
        let ids = hub.subscribe_all(|_| {});
        assert_eq!(ids.len(), NotificationKind::ALL.len());
        for kind in NotificationKind::ALL {
            assert_eq!(hub.subscriber_count(kind), 1);
        }
    }

    #[test]
    fn handler_may_subscribe_during_dispatch() {
        let hub = Arc::new(NotificationHub::new());
        let inner = Arc::clone(&hub);
        hub.subscribe(NotificationKind::Reset, move |_| {
            inner.subscribe(NotificationKind::Reset, |_| {});
        });

        hub.emit(&Notification::new(
            NotificationKind::Reset,
            "reset",
            Duration::ZERO,
        ));
        assert_eq!(hub.subscriber_count(NotificationKind::Reset), 2);
    }
}
