//! Navigation events backed by a `tokio::sync::broadcast` channel.
//!
//! [`NavigationBus`] carries the signals the portfolio UI reacts to: the
//! active category changed, the view changed, scroll to a project, or the
//! owner asked for the add-category form. Subscribers hold explicit
//! receivers; nothing is dispatched through globals.

use folio_core::navigation::View;
use folio_core::types::DbId;
use serde::Serialize;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// NavigationEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum NavigationEvent {
    CategoryChanged { category: String },
    ViewChanged { view: View },
    /// Centre this project in the grid.
    ScrollTo { project_id: DbId },
    /// The owner asked to open the add-category form.
    AddCategoryRequested,
}

// ---------------------------------------------------------------------------
// NavigationBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 64;

/// Fan-out channel for [`NavigationEvent`]s.
///
/// Receivers that fall more than the capacity behind observe
/// `RecvError::Lagged` and skip the oldest events.
pub struct NavigationBus {
    sender: broadcast::Sender<NavigationEvent>,
}

impl NavigationBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to every current subscriber. Dropped when nobody listens.
    pub fn publish(&self, event: NavigationEvent) {
        tracing::debug!(event = ?event, "Navigation event");
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NavigationEvent> {
        self.sender.subscribe()
    }
}

impl Default for NavigationBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
