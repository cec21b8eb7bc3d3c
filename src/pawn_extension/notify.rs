//! Subscriber lists for ability-system binding notifications.

use std::fmt;

use bevy::prelude::*;

/// Callback run with the world and the pawn whose binding changed.
pub type BindingCallback = Box<dyn Fn(&mut World, Entity) + Send + Sync>;

/// Callbacks keyed by the subscribing entity; each subscriber is kept once.
#[derive(Default)]
pub struct Notifier {
    subscribers: Vec<(Entity, BindingCallback)>,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field(
                "subscribers",
                &self.subscribers.iter().map(|(s, _)| *s).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Notifier {
    /// Adds `callback` for `subscriber`. Returns false, dropping the
    /// callback, when the subscriber is already present.
    pub fn add(&mut self, subscriber: Entity, callback: BindingCallback) -> bool {
        if self.contains(subscriber) {
            return false;
        }
        self.subscribers.push((subscriber, callback));
        true
    }

    /// Whether `subscriber` has a callback registered.
    #[must_use]
    pub fn contains(&self, subscriber: Entity) -> bool {
        self.subscribers.iter().any(|(s, _)| *s == subscriber)
    }

    /// Drops the callback of `subscriber`.
    pub fn remove(&mut self, subscriber: Entity) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(s, _)| *s != subscriber);
        before != self.subscribers.len()
    }

    /// Number of subscribers.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Whether nobody is subscribed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Runs every callback in subscription order.
    pub fn broadcast(&self, world: &mut World, pawn: Entity) {
        for (_, callback) in &self.subscribers {
            callback(world, pawn);
        }
    }

    /// Appends subscribers of `other` that are not already present.
    pub(crate) fn merge(&mut self, other: Self) {
        for (subscriber, callback) in other.subscribers {
            self.add(subscriber, callback);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use rstest::rstest;

    fn counting(counter: &Arc<AtomicUsize>) -> BindingCallback {
        let shared = Arc::clone(counter);
        Box::new(move |_, _| {
            shared.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[rstest]
    fn each_subscriber_is_called_once_per_broadcast() {
        let mut world = World::new();
        let subscriber = world.spawn_empty().id();
        let pawn = world.spawn_empty().id();
        let counter = Arc::new(AtomicUsize::new(0));

        let mut notifier = Notifier::default();
        assert!(notifier.add(subscriber, counting(&counter)));
        assert!(!notifier.add(subscriber, counting(&counter)));
        notifier.broadcast(&mut world, pawn);
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        assert!(notifier.remove(subscriber));
        notifier.broadcast(&mut world, pawn);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(notifier.is_empty());
    }

    #[rstest]
    fn merge_skips_known_subscribers() {
        let mut world = World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        let counter = Arc::new(AtomicUsize::new(0));

        let mut first = Notifier::default();
        first.add(a, counting(&counter));
        let mut second = Notifier::default();
        second.add(a, counting(&counter));
        second.add(b, counting(&counter));
        first.merge(second);
        assert_eq!(first.len(), 2);
    }
}
