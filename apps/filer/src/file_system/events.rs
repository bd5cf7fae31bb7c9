//! Change notifications streamed from a Directory to its attached windows.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::item::DirectoryItem;
use crate::ignore_poison::IgnorePoison;
use crate::window::WindowId;

/// One change to a Directory's item set.
#[derive(Debug, Clone, PartialEq)]
pub enum DirEvent {
    ScanStart,
    Add(Vec<DirectoryItem>),
    Remove(Vec<DirectoryItem>),
    Update(Vec<DirectoryItem>),
    ScanEnd,
}

impl DirEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DirEvent::ScanStart => "scan-start",
            DirEvent::Add(_) => "add",
            DirEvent::Remove(_) => "remove",
            DirEvent::Update(_) => "update",
            DirEvent::ScanEnd => "scan-end",
        }
    }
}

/// Per-observer FIFO of pending events.
pub(crate) type EventQueue = Mutex<VecDeque<DirEvent>>;

/// A window's handle on a Directory's notifications.
///
/// Events are queued in production order and consumed lazily with `next_event`.
/// Dropping the subscription stops delivery: the Directory only keeps a weak handle.
#[derive(Debug)]
pub struct Subscription {
    window: WindowId,
    queue: Arc<EventQueue>,
}

impl Subscription {
    pub(crate) fn new(window: WindowId, queue: Arc<EventQueue>) -> Self {
        Self { window, queue }
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    /// Pops the oldest pending event.
    pub fn next_event(&self) -> Option<DirEvent> {
        self.queue.lock_ignore_poison().pop_front()
    }
}
