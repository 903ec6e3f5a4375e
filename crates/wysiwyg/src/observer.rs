//! Per-editor event listeners and field watchers.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Change,
    BeforeCommand,
    AfterCommand,
    Destruct,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    Change { old: String, new: String },
    BeforeCommand { command: String },
    AfterCommand { command: String },
    Destruct,
}

impl EditorEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            EditorEvent::Change { .. } => EventKind::Change,
            EditorEvent::BeforeCommand { .. } => EventKind::BeforeCommand,
            EditorEvent::AfterCommand { .. } => EventKind::AfterCommand,
            EditorEvent::Destruct => EventKind::Destruct,
        }
    }
}

type Listener = Box<dyn FnMut(&EditorEvent)>;
type Watcher = Box<dyn FnMut(&Value)>;

#[derive(Default)]
pub struct Observer {
    listeners: HashMap<EventKind, Vec<Listener>>,
    watchers: HashMap<String, Vec<Watcher>>,
}

impl Observer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, kind: EventKind, listener: impl FnMut(&EditorEvent) + 'static) {
        self.listeners
            .entry(kind)
            .or_default()
            .push(Box::new(listener));
    }

    /// Registers `watcher` to run with the new value after `field` is set.
    pub fn watch(&mut self, field: &str, watcher: impl FnMut(&Value) + 'static) {
        self.watchers
            .entry(field.to_string())
            .or_default()
            .push(Box::new(watcher));
    }

    /// Calls every listener of the event's kind in registration order and
    /// returns how many ran.
    pub fn fire(&mut self, event: &EditorEvent) -> usize {
        let Some(listeners) = self.listeners.get_mut(&event.kind()) else {
            return 0;
        };
        for listener in listeners.iter_mut() {
            listener(event);
        }
        tracing::trace!(kind = ?event.kind(), count = listeners.len(), "event fired");
        listeners.len()
    }

    pub(crate) fn changed(&mut self, field: &str, value: &Value) {
        if let Some(watchers) = self.watchers.get_mut(field) {
            for watcher in watchers.iter_mut() {
                watcher(value);
            }
        }
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
        self.watchers.clear();
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("listeners", &self.listeners.values().map(Vec::len).sum::<usize>())
            .field("watchers", &self.watchers.keys().collect::<Vec<_>>())
            .finish()
    }
}
