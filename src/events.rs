//! Notification registry.
//!
//! Subscribers are grouped by event name and invoked synchronously in
//! registration order. The controller owns one of these rather than
//! being an emitter itself.

use std::collections::HashMap;
use std::fmt;

/// Name of the event emitted whenever the quality level is set.
pub const QUALITY_CHANGE_EVENT: &str = "qualitychange";

/// Handle returned by `Notifier::on`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<P> = Box<dyn FnMut(&P) + Send>;

struct Subscriber<P> {
    id: SubscriptionId,
    handler: Handler<P>,
}

/// Registry of `event name -> ordered subscribers` for payloads of type `P`.
pub struct Notifier<P> {
    subscribers: HashMap<String, Vec<Subscriber<P>>>,
    next_id: u64,
}

impl<P> Notifier<P> {
    pub fn new() -> Self {
        Self {
            subscribers: HashMap::new(),
            next_id: 0,
        }
    }

    /// Register a handler for `event`. Handlers for the same event run in
    /// the order they were registered.
    pub fn on<F>(&mut self, event: &str, handler: F) -> SubscriptionId
    where
        F: FnMut(&P) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        self.subscribers
            .entry(event.to_string())
            .or_default()
            .push(Subscriber {
                id,
                handler: Box::new(handler),
            });
        id
    }

    /// Remove a handler. Returns false if it was not registered for `event`.
    pub fn off(&mut self, event: &str, id: SubscriptionId) -> bool {
        let Some(list) = self.subscribers.get_mut(event) else {
            return false;
        };

        let before = list.len();
        list.retain(|s| s.id != id);
        let removed = list.len() != before;

        if list.is_empty() {
            self.subscribers.remove(event);
        }
        removed
    }

    /// Invoke every handler registered for `event`. Returns how many ran.
    pub fn emit(&mut self, event: &str, payload: &P) -> usize {
        match self.subscribers.get_mut(event) {
            Some(list) => {
                for subscriber in list.iter_mut() {
                    (subscriber.handler)(payload);
                }
                list.len()
            }
            None => 0,
        }
    }
}

impl<P> Default for Notifier<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for Notifier<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<&str, usize> = self
            .subscribers
            .iter()
            .map(|(event, list)| (event.as_str(), list.len()))
            .collect();
        f.debug_struct("Notifier")
            .field("subscribers", &counts)
            .finish()
    }
}
