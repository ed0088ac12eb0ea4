//! Synchronous event fan-out with per-listener fault isolation.
//!
//! Listeners run in registration order. A failing listener is logged
//! and skipped; it never prevents sibling listeners from seeing the
//! event or subsequent events from being dispatched.

use tracing::warn;
use watchsim_types::EventEnvelope;

/// Error type listeners may return.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// A registered event consumer.
pub type Listener = Box<dyn FnMut(&EventEnvelope) -> Result<(), ListenerError> + Send>;

/// Ordered, fault-isolated listener registry.
#[derive(Default)]
pub struct Dispatcher {
    listeners: Vec<(String, Listener)>,
}

impl Dispatcher {
    /// An empty dispatcher.
    pub const fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Register a listener under a label used in failure logs.
    pub fn subscribe<F>(&mut self, label: impl Into<String>, listener: F)
    where
        F: FnMut(&EventEnvelope) -> Result<(), ListenerError> + Send + 'static,
    {
        self.listeners.push((label.into(), Box::new(listener)));
    }

    /// Deliver one envelope to every listener, in registration order.
    pub fn dispatch(&mut self, envelope: &EventEnvelope) {
        for (label, listener) in &mut self.listeners {
            if let Err(error) = listener(envelope) {
                warn!(
                    listener = %label,
                    event = envelope.event.kind(),
                    %error,
                    "listener failed, continuing"
                );
            }
        }
    }

    /// Number of registered listeners.
    pub const fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listeners are registered.
    pub const fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl core::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dispatcher")
            .field(
                "listeners",
                &self
                    .listeners
                    .iter()
                    .map(|(label, _)| label.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::NaiveDate;
    use watchsim_types::SimulationEvent;

    use super::*;

    fn envelope() -> EventEnvelope {
        let time = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        EventEnvelope::new(time, SimulationEvent::NewSecond { second: 0 })
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();
        for name in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            dispatcher.subscribe(name, move |_| {
                order.lock().map_err(|_| "poisoned")?.push(name);
                Ok(())
            });
        }
        dispatcher.dispatch(&envelope());
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn failing_listener_does_not_block_siblings() {
        let seen = Arc::new(Mutex::new(0u32));
        let mut dispatcher = Dispatcher::new();
        dispatcher.subscribe("broken", |_| Err("deliberate failure".into()));
        {
            let seen = Arc::clone(&seen);
            dispatcher.subscribe("healthy", move |_| {
                *seen.lock().map_err(|_| "poisoned")? += 1;
                Ok(())
            });
        }

        dispatcher.dispatch(&envelope());
        dispatcher.dispatch(&envelope());
        assert_eq!(*seen.lock().unwrap(), 2);
    }

    #[test]
    fn empty_dispatcher_is_a_no_op() {
        let mut dispatcher = Dispatcher::new();
        assert!(dispatcher.is_empty());
        dispatcher.dispatch(&envelope());
        assert_eq!(dispatcher.len(), 0);
    }
}
