//! Connection lifecycle listeners
//!
//! A small synchronous pub/sub list: callers register zero-argument
//! effects against a lifecycle event and the connection manager fires
//! them in registration order on state transitions.

/// Lifecycle events a listener can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Fired after a connection is successfully established
    Connected,
    /// Fired after the connection is torn down
    Disconnected,
}

/// Handle returned by [`ListenerRegistry::add`], usable for removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Effect = Box<dyn FnMut() + Send>;

struct Entry {
    id: ListenerId,
    event: Event,
    effect: Effect,
}

/// Ordered registry of (event, effect) pairs
///
/// Registration order is preserved; firing an event invokes every
/// matching effect synchronously, oldest registration first. Duplicate
/// registrations are allowed.
#[derive(Default)]
pub struct ListenerRegistry {
    entries: Vec<Entry>,
    next_id: u64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener for `event`, returning a handle for removal
    pub fn add(&mut self, event: Event, effect: impl FnMut() + Send + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            event,
            effect: Box::new(effect),
        });
        id
    }

    /// Remove a previously registered listener
    ///
    /// Returns false if the handle was already removed or never existed.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() < before
    }

    /// Invoke all effects registered for `event`, in registration order
    pub fn fire(&mut self, event: Event) {
        for entry in self.entries.iter_mut() {
            if entry.event == event {
                (entry.effect)();
            }
        }
    }

    /// Number of registered listeners across all events
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.entries.len())
            .finish()
    }
}
