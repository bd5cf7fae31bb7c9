//! Ownership of the shared primary selection.
//!
//! At most one window owns the selection. The host environment has the final say (a
//! claim can be refused, and another program can take the selection at any time), so
//! every ownership change goes through `SelectionArbiter` and the host together.

use std::path::Path;

use crate::window::WindowId;

/// The host's selection service.
pub trait SelectionHost {
    /// Asks to make `window` the selection owner. Returns false if refused.
    fn claim_selection(&mut self, window: WindowId, timestamp: u32) -> bool;

    /// Gives the selection up.
    fn release_selection(&mut self, timestamp: u32);

    /// Host name for `file://` URIs.
    fn host_name(&self) -> String {
        std::fs::read_to_string("/proc/sys/kernel/hostname")
            .map(|name| name.trim().to_string())
            .ok()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "localhost".to_string())
    }
}

/// Host without a selection service: every claim succeeds.
#[derive(Debug, Default)]
pub struct NullSelectionHost;

impl SelectionHost for NullSelectionHost {
    fn claim_selection(&mut self, _window: WindowId, _timestamp: u32) -> bool {
        true
    }

    fn release_selection(&mut self, _timestamp: u32) {}
}

/// Result of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The window is now the owner. `evicted` lost ownership and must clear its highlight.
    Granted { evicted: Option<WindowId> },
    /// The host refused; the claiming window must clear its own selection.
    Declined,
}

/// Records which window owns the selection.
#[derive(Debug, Default)]
pub struct SelectionArbiter {
    owner: Option<WindowId>,
}

impl SelectionArbiter {
    pub fn owner(&self) -> Option<WindowId> {
        self.owner
    }

    pub fn claim(&mut self, window: WindowId, host: &mut dyn SelectionHost, timestamp: u32) -> ClaimOutcome {
        if !host.claim_selection(window, timestamp) {
            log::debug!("Selection: Host refused claim from {}", window);
            return ClaimOutcome::Declined;
        }
        let evicted = self.owner.replace(window).filter(|&previous| previous != window);
        ClaimOutcome::Granted { evicted }
    }

    /// Gives up ownership if `window` has it. Returns true if it did.
    pub fn release(&mut self, window: WindowId, host: &mut dyn SelectionHost, timestamp: u32) -> bool {
        if self.owner != Some(window) {
            return false;
        }
        self.owner = None;
        host.release_selection(timestamp);
        true
    }

    /// Someone else took the selection. Returns the window that must clear its highlight.
    pub fn selection_lost(&mut self) -> Option<WindowId> {
        self.owner.take()
    }

    /// Must be called before a window goes away.
    pub fn window_destroyed(&mut self, window: WindowId, host: &mut dyn SelectionHost, timestamp: u32) {
        self.release(window, host, timestamp);
    }
}

/// Formats the owner's selection can be requested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionTarget {
    /// Space-separated absolute paths
    String,
    /// Space-separated `file://host/path` URIs
    UriList,
}

/// Renders the selected `names` inside `dir` for a requester.
pub fn selection_payload(dir: &Path, names: &[&str], target: SelectionTarget, host_name: &str) -> String {
    names
        .iter()
        .map(|name| {
            let path = dir.join(name);
            match target {
                SelectionTarget::String => path.display().to_string(),
                SelectionTarget::UriList => format!("file://{}{}", host_name, path.display()),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
