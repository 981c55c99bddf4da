//! Cached listing of submitted line items.

use std::{fmt, sync::Arc};

use chrono::TimeZone;
use shared::domain::PurchaseOrderLine;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    columns::{sorted_lines, DisplayRow, SortColumn, SortOrder},
    notice::{Notice, Notifier, LISTING_LOAD_ERROR_MESSAGE},
    OrderService, RequestError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingPhase {
    Uninitialized,
    Loading,
    Populated,
    LoadError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Populated { count: usize },
    /// The fetch failed; the previously held lines are still displayed.
    LoadError(String),
    /// A newer refresh started while this one was in flight; its reply was dropped.
    Superseded,
}

struct ListingState {
    phase: ListingPhase,
    lines: Vec<PurchaseOrderLine>,
    sort: Option<SortOrder>,
    generation: u64,
}

pub struct OrderListing {
    service: Arc<dyn OrderService>,
    notifier: Notifier,
    state: Mutex<ListingState>,
}

fn load_error_text(err: &RequestError) -> String {
    match err {
        RequestError::Application(app) => match &app.message {
            Some(message) => format!("{LISTING_LOAD_ERROR_MESSAGE} ({message})"),
            None => LISTING_LOAD_ERROR_MESSAGE.to_string(),
        },
        _ => LISTING_LOAD_ERROR_MESSAGE.to_string(),
    }
}

impl OrderListing {
    pub fn new(service: Arc<dyn OrderService>, notifier: Notifier) -> Self {
        Self {
            service,
            notifier,
            state: Mutex::new(ListingState {
                phase: ListingPhase::Uninitialized,
                lines: Vec::new(),
                sort: None,
                generation: 0,
            }),
        }
    }

    /// Fetches the full listing and replaces the cache on success.
    ///
    /// Each call takes a new generation; only the reply of the most recent
    /// call is applied. The lock is released while the request is in flight.
    pub async fn refresh(&self) -> RefreshOutcome {
        let generation = {
            let mut state = self.state.lock().await;
            state.generation += 1;
            state.phase = ListingPhase::Loading;
            state.generation
        };
        debug!(generation, "listing: refresh started");

        let result = self.service.fetch_order_details().await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!(
                generation,
                latest = state.generation,
                "listing: discarding superseded reply"
            );
            return RefreshOutcome::Superseded;
        }

        match result {
            Ok(lines) => {
                let count = lines.len();
                state.lines = lines;
                state.phase = ListingPhase::Populated;
                info!(generation, count, "listing: populated");
                RefreshOutcome::Populated { count }
            }
            Err(err) => {
                state.phase = ListingPhase::LoadError;
                let text = load_error_text(&err);
                warn!(generation, %err, kept = state.lines.len(), "listing: refresh failed");
                drop(state);
                self.notifier.publish(Notice::Error(text.clone()));
                RefreshOutcome::LoadError(text)
            }
        }
    }

    pub async fn phase(&self) -> ListingPhase {
        self.state.lock().await.phase
    }

    /// Lines in the order the server reported them.
    pub async fn lines(&self) -> Vec<PurchaseOrderLine> {
        self.state.lock().await.lines.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.lines.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.lines.is_empty()
    }

    /// Display ordering under `sort`, independent of the held sort state.
    pub async fn render(&self, sort: Option<SortOrder>) -> Vec<PurchaseOrderLine> {
        let state = self.state.lock().await;
        sorted_lines(&state.lines, sort)
    }

    pub async fn sort(&self) -> Option<SortOrder> {
        self.state.lock().await.sort
    }

    pub async fn set_sort(&self, sort: Option<SortOrder>) {
        self.state.lock().await.sort = sort;
    }

    /// Header click on `column`; replaces any other active criterion.
    pub async fn toggle_sort(&self, column: SortColumn) -> Option<SortOrder> {
        let mut state = self.state.lock().await;
        state.sort = SortOrder::toggle(state.sort, column);
        state.sort
    }

    /// Formatted rows under the held sort state.
    pub async fn display_rows<Tz>(&self, tz: &Tz) -> Vec<DisplayRow>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let state = self.state.lock().await;
        sorted_lines(&state.lines, state.sort)
            .iter()
            .map(|line| DisplayRow::from_line(line, tz))
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/listing_tests.rs"]
mod tests;
