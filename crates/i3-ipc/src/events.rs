//! Event categories, event payloads and the subscription callback registry
//!
//! Three closed lists must stay in lock-step: [`EventCategory`], [`Event`]
//! and [`Callback`]. Each has exactly one variant per category and converts
//! to its category with an exhaustive `match`, so adding a category without
//! updating the others fails to compile.

use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;
use tracing::trace;

use crate::error::I3Error;
use crate::types::{
    BarConfig, BindingEvent, ModeEvent, OutputEvent, ShutdownEvent, TickEvent, WindowEvent,
    WorkspaceEvent,
};

/// The eight kinds of event a client can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Workspace,
    Output,
    Mode,
    Window,
    BarConfigUpdate,
    Binding,
    Shutdown,
    Tick,
}

impl EventCategory {
    /// Number of categories
    pub const COUNT: usize = 8;

    /// All categories, ordered by their wire index
    pub const ALL: [EventCategory; Self::COUNT] = [
        EventCategory::Workspace,
        EventCategory::Output,
        EventCategory::Mode,
        EventCategory::Window,
        EventCategory::BarConfigUpdate,
        EventCategory::Binding,
        EventCategory::Shutdown,
        EventCategory::Tick,
    ];

    /// Position in [`EventCategory::ALL`], also the low bits of the event type code
    pub fn index(self) -> usize {
        match self {
            EventCategory::Workspace => 0,
            EventCategory::Output => 1,
            EventCategory::Mode => 2,
            EventCategory::Window => 3,
            EventCategory::BarConfigUpdate => 4,
            EventCategory::Binding => 5,
            EventCategory::Shutdown => 6,
            EventCategory::Tick => 7,
        }
    }

    /// Name used in `SUBSCRIBE` payloads
    pub fn subscription_name(self) -> &'static str {
        match self {
            EventCategory::Workspace => "workspace",
            EventCategory::Output => "output",
            EventCategory::Mode => "mode",
            EventCategory::Window => "window",
            EventCategory::BarConfigUpdate => "barconfig_update",
            EventCategory::Binding => "binding",
            EventCategory::Shutdown => "shutdown",
            EventCategory::Tick => "tick",
        }
    }

    /// Parse a subscription name back into a category
    pub fn from_subscription_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.subscription_name() == name)
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.subscription_name())
    }
}

/// A decoded event from i3
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "category", content = "event", rename_all = "snake_case")]
pub enum Event {
    Workspace(WorkspaceEvent),
    Output(OutputEvent),
    Mode(ModeEvent),
    Window(WindowEvent),
    BarConfigUpdate(BarConfig),
    Binding(BindingEvent),
    Shutdown(ShutdownEvent),
    Tick(TickEvent),
}

impl Event {
    pub fn category(&self) -> EventCategory {
        match self {
            Event::Workspace(_) => EventCategory::Workspace,
            Event::Output(_) => EventCategory::Output,
            Event::Mode(_) => EventCategory::Mode,
            Event::Window(_) => EventCategory::Window,
            Event::BarConfigUpdate(_) => EventCategory::BarConfigUpdate,
            Event::Binding(_) => EventCategory::Binding,
            Event::Shutdown(_) => EventCategory::Shutdown,
            Event::Tick(_) => EventCategory::Tick,
        }
    }
}

/// Handler for one event category
///
/// The argument type of each variant is fixed by its category, so an event
/// can only ever reach a handler written for it.
pub enum Callback {
    Workspace(Box<dyn FnMut(&WorkspaceEvent) + Send>),
    Output(Box<dyn FnMut(&OutputEvent) + Send>),
    Mode(Box<dyn FnMut(&ModeEvent) + Send>),
    Window(Box<dyn FnMut(&WindowEvent) + Send>),
    BarConfigUpdate(Box<dyn FnMut(&BarConfig) + Send>),
    Binding(Box<dyn FnMut(&BindingEvent) + Send>),
    Shutdown(Box<dyn FnMut(&ShutdownEvent) + Send>),
    Tick(Box<dyn FnMut(&TickEvent) + Send>),
}

impl Callback {
    pub fn workspace<F>(f: F) -> Self
    where
        F: FnMut(&WorkspaceEvent) + Send + 'static,
    {
        Callback::Workspace(Box::new(f))
    }

    pub fn output<F>(f: F) -> Self
    where
        F: FnMut(&OutputEvent) + Send + 'static,
    {
        Callback::Output(Box::new(f))
    }

    pub fn mode<F>(f: F) -> Self
    where
        F: FnMut(&ModeEvent) + Send + 'static,
    {
        Callback::Mode(Box::new(f))
    }

    pub fn window<F>(f: F) -> Self
    where
        F: FnMut(&WindowEvent) + Send + 'static,
    {
        Callback::Window(Box::new(f))
    }

    pub fn bar_config_update<F>(f: F) -> Self
    where
        F: FnMut(&BarConfig) + Send + 'static,
    {
        Callback::BarConfigUpdate(Box::new(f))
    }

    pub fn binding<F>(f: F) -> Self
    where
        F: FnMut(&BindingEvent) + Send + 'static,
    {
        Callback::Binding(Box::new(f))
    }

    pub fn shutdown<F>(f: F) -> Self
    where
        F: FnMut(&ShutdownEvent) + Send + 'static,
    {
        Callback::Shutdown(Box::new(f))
    }

    pub fn tick<F>(f: F) -> Self
    where
        F: FnMut(&TickEvent) + Send + 'static,
    {
        Callback::Tick(Box::new(f))
    }

    pub fn category(&self) -> EventCategory {
        match self {
            Callback::Workspace(_) => EventCategory::Workspace,
            Callback::Output(_) => EventCategory::Output,
            Callback::Mode(_) => EventCategory::Mode,
            Callback::Window(_) => EventCategory::Window,
            Callback::BarConfigUpdate(_) => EventCategory::BarConfigUpdate,
            Callback::Binding(_) => EventCategory::Binding,
            Callback::Shutdown(_) => EventCategory::Shutdown,
            Callback::Tick(_) => EventCategory::Tick,
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback").field(&self.category()).finish()
    }
}

/// Currently installed callback per category
///
/// Only the client's queue drain writes to this, never `subscribe` itself,
/// so a new callback takes effect exactly where its acknowledgment sat in
/// the message stream.
#[derive(Debug, Default)]
pub(crate) struct CallbackRegistry {
    slots: [Option<Callback>; EventCategory::COUNT],
}

impl CallbackRegistry {
    /// Install a callback, replacing any previous one for its category
    pub(crate) fn install(&mut self, callback: Callback) {
        let category = callback.category();
        trace!(%category, "Installing event callback");
        self.slots[category.index()] = Some(callback);
    }

    pub(crate) fn is_installed(&self, category: EventCategory) -> bool {
        self.slots[category.index()].is_some()
    }

    /// Run the installed callback for `event`
    ///
    /// # Errors
    ///
    /// Returns `I3Error::BadMessage` if no callback is installed for the
    /// event's category: i3 only sends events the client subscribed to.
    pub(crate) fn dispatch(&mut self, event: &Event) -> Result<EventCategory, I3Error> {
        let category = event.category();
        let slot = self.slots[category.index()].as_mut();

        match (slot, event) {
            (Some(Callback::Workspace(f)), Event::Workspace(e)) => f(e),
            (Some(Callback::Output(f)), Event::Output(e)) => f(e),
            (Some(Callback::Mode(f)), Event::Mode(e)) => f(e),
            (Some(Callback::Window(f)), Event::Window(e)) => f(e),
            (Some(Callback::BarConfigUpdate(f)), Event::BarConfigUpdate(e)) => f(e),
            (Some(Callback::Binding(f)), Event::Binding(e)) => f(e),
            (Some(Callback::Shutdown(f)), Event::Shutdown(e)) => f(e),
            (Some(Callback::Tick(f)), Event::Tick(e)) => f(e),
            (None, _) => {
                return Err(I3Error::bad_message(format!(
                    "Received \"{}\" event, but not subscribed to it!",
                    category
                )))
            }
            // `install` files every callback under its own category
            (Some(callback), _) => {
                return Err(I3Error::bad_message(format!(
                    "Callback for \"{}\" stored in the \"{}\" slot",
                    callback.category(),
                    category
                )))
            }
        }

        Ok(category)
    }
}

/// Entry in the client's ordered event queue
#[derive(Debug)]
pub(crate) enum QueueItem {
    /// An event, or the decode failure to report when it is reached
    Event(Result<Event, I3Error>),
    /// A callback whose subscription was acknowledged at this point
    Install(Callback),
}

/// FIFO of events and callback installs, in the order i3 sent them
#[derive(Debug, Default)]
pub(crate) struct EventQueue {
    items: VecDeque<QueueItem>,
}

impl EventQueue {
    pub(crate) fn push(&mut self, item: QueueItem) {
        trace!(queued = self.len() + 1, "Queueing i3 event");
        self.items.push_back(item);
    }

    pub(crate) fn pop(&mut self) -> Option<QueueItem> {
        self.items.pop_front()
    }

    /// Remove and return the earliest pending install for `category`
    pub(crate) fn take_install(&mut self, category: EventCategory) -> Option<Callback> {
        let position = self.items.iter().position(
            |item| matches!(item, QueueItem::Install(callback) if callback.category() == category),
        )?;

        match self.items.remove(position) {
            Some(QueueItem::Install(callback)) => Some(callback),
            _ => None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn tick(first: bool) -> Event {
        Event::Tick(TickEvent {
            first,
            payload: None,
        })
    }

    #[test]
    fn test_category_index_matches_all_order() {
        for (position, category) in EventCategory::ALL.into_iter().enumerate() {
            assert_eq!(category.index(), position);
            assert_eq!(
                EventCategory::from_subscription_name(category.subscription_name()),
                Some(category)
            );
        }
        assert_eq!(
            EventCategory::BarConfigUpdate.subscription_name(),
            "barconfig_update"
        );
        assert_eq!(EventCategory::from_subscription_name("restart"), None);
    }

    #[test]
    fn test_dispatch_without_callback_is_bad_message() {
        let mut registry = CallbackRegistry::default();

        let err = registry.dispatch(&tick(false)).unwrap_err();
        assert!(matches!(err, I3Error::BadMessage { .. }));
        assert!(err.to_string().contains("tick"));
    }

    #[test]
    fn test_install_replaces_previous_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CallbackRegistry::default();

        let first = Arc::clone(&seen);
        registry.install(Callback::tick(move |_| first.lock().unwrap().push("first")));
        let second = Arc::clone(&seen);
        registry.install(Callback::tick(move |_| second.lock().unwrap().push("second")));

        assert!(registry.is_installed(EventCategory::Tick));
        assert!(!registry.is_installed(EventCategory::Window));
        assert_eq!(
            registry.dispatch(&tick(true)).unwrap(),
            EventCategory::Tick
        );
        assert_eq!(*seen.lock().unwrap(), vec!["second"]);
    }

    #[test]
    fn test_take_install_picks_earliest_for_category() {
        let mut queue = EventQueue::default();
        queue.push(QueueItem::Event(Ok(tick(true))));
        queue.push(QueueItem::Install(Callback::mode(|_| {})));
        queue.push(QueueItem::Install(Callback::tick(|_| {})));
        queue.push(QueueItem::Install(Callback::tick(|_| {})));

        let callback = queue.take_install(EventCategory::Tick).unwrap();
        assert_eq!(callback.category(), EventCategory::Tick);
        assert_eq!(queue.len(), 3);
        assert!(queue.take_install(EventCategory::Shutdown).is_none());

        assert!(matches!(queue.pop(), Some(QueueItem::Event(Ok(_)))));
        assert!(
            matches!(queue.pop(), Some(QueueItem::Install(cb)) if cb.category() == EventCategory::Mode)
        );
    }
}
