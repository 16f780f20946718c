//! Result Panel Controller
//!
//! The side panel shows either one monitor's history or the outcome of a
//! bulk trigger, never both. Every transition bumps a generation counter;
//! async completions carry the [`PanelTicket`] they started with and are
//! dropped if the panel has moved on since.

use crate::bulk::BulkOutcome;
use crate::model::{ResultRecord, SelectionKey};

/// Shown when a history fetch fails; the cause is only logged
pub const RESULTS_FAILED_MESSAGE: &str = "Failed to fetch results";

/// Shown when a bulk trigger fails
pub const BULK_FAILED_MESSAGE: &str = "Failed to trigger monitors";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelMode {
    #[default]
    Closed,
    SingleMonitor,
    BulkResults,
}

/// Generation of the panel at the time an async operation started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelTicket(u64);

/// Counts shown above bulk results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BulkSummary {
    pub triggered_count: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelState {
    mode: PanelMode,
    target: Option<SelectionKey>,
    records: Option<Vec<ResultRecord>>,
    summary: Option<BulkSummary>,
    loading: bool,
    error: Option<String>,
    generation: u64,
}

/// What the renderer should draw for the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelView<'a> {
    Closed,
    Loading {
        target: &'a SelectionKey,
    },
    Failed {
        target: Option<&'a SelectionKey>,
        message: &'a str,
    },
    NoResults {
        target: &'a SelectionKey,
    },
    Monitor {
        target: &'a SelectionKey,
        records: &'a [ResultRecord],
    },
    Bulk {
        records: &'a [ResultRecord],
        summary: BulkSummary,
    },
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> PanelMode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.mode != PanelMode::Closed
    }

    /// The monitor whose history is shown; `None` outside single-monitor mode
    pub fn target(&self) -> Option<&SelectionKey> {
        self.target.as_ref()
    }

    pub fn records(&self) -> Option<&[ResultRecord]> {
        self.records.as_deref()
    }

    pub fn summary(&self) -> Option<BulkSummary> {
        self.summary
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Ticket for the current generation
    pub fn ticket(&self) -> PanelTicket {
        PanelTicket(self.generation)
    }

    pub fn is_current(&self, ticket: PanelTicket) -> bool {
        ticket.0 == self.generation
    }

    fn advance(&mut self) -> PanelTicket {
        self.generation += 1;
        self.records = None;
        self.summary = None;
        self.error = None;
        self.loading = false;
        PanelTicket(self.generation)
    }

    /// Show `target` with its history fetch in flight. Any earlier fetch is
    /// superseded.
    pub fn open_single(&mut self, target: SelectionKey) -> PanelTicket {
        let ticket = self.advance();
        tracing::debug!("Panel opening {} (generation {})", target, ticket.0);
        self.mode = PanelMode::SingleMonitor;
        self.target = Some(target);
        self.loading = true;
        ticket
    }

    /// Apply a history fetch started by [`open_single`](Self::open_single).
    /// Returns false if the ticket is stale.
    pub fn complete_single(
        &mut self,
        ticket: PanelTicket,
        outcome: crate::Result<Vec<ResultRecord>>,
    ) -> bool {
        if !self.is_current(ticket) || self.mode != PanelMode::SingleMonitor {
            tracing::warn!(
                "Discarding stale result fetch (generation {}, panel at {})",
                ticket.0,
                self.generation
            );
            return false;
        }

        self.loading = false;
        match outcome {
            Ok(records) => {
                tracing::debug!("Panel received {} records", records.len());
                self.records = Some(records);
            }
            Err(e) => {
                let target = self
                    .target
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                tracing::error!("Fetching results for {} failed: {}", target, e);
                self.error = Some(RESULTS_FAILED_MESSAGE.to_string());
            }
        }
        true
    }

    /// Show a bulk trigger outcome, replacing whatever the panel held
    pub fn open_bulk(&mut self, outcome: BulkOutcome) {
        self.advance();
        self.mode = PanelMode::BulkResults;
        self.target = None;
        self.summary = Some(BulkSummary {
            triggered_count: outcome.triggered_count,
            succeeded: outcome.succeeded(),
            failed: outcome.failed(),
        });
        self.records = Some(outcome.records);
    }

    /// Apply a bulk outcome unless the panel changed after `ticket` was taken
    pub fn complete_bulk(
        &mut self,
        ticket: PanelTicket,
        outcome: crate::Result<BulkOutcome>,
    ) -> bool {
        if !self.is_current(ticket) {
            tracing::warn!(
                "Discarding bulk outcome: panel changed since trigger started (generation {}, panel at {})",
                ticket.0,
                self.generation
            );
            return false;
        }

        match outcome {
            Ok(outcome) => self.open_bulk(outcome),
            Err(e) => {
                tracing::error!("Showing bulk trigger failure: {}", e);
                self.advance();
                self.mode = PanelMode::BulkResults;
                self.target = None;
                self.error = Some(BULK_FAILED_MESSAGE.to_string());
            }
        }
        true
    }

    /// Close the panel and drop everything it held. Closing a closed panel is
    /// a no-op; returns whether anything changed.
    pub fn close(&mut self) -> bool {
        if self.mode == PanelMode::Closed {
            return false;
        }
        self.advance();
        self.mode = PanelMode::Closed;
        self.target = None;
        tracing::debug!("Panel closed (generation {})", self.generation);
        true
    }

    pub fn view(&self) -> PanelView<'_> {
        match self.mode {
            PanelMode::Closed => PanelView::Closed,
            PanelMode::SingleMonitor => {
                let Some(target) = self.target.as_ref() else {
                    return PanelView::Closed;
                };
                if self.loading {
                    PanelView::Loading { target }
                } else if let Some(message) = self.error.as_deref() {
                    PanelView::Failed {
                        target: Some(target),
                        message,
                    }
                } else {
                    match self.records.as_deref() {
                        Some(records) if !records.is_empty() => {
                            PanelView::Monitor { target, records }
                        }
                        _ => PanelView::NoResults { target },
                    }
                }
            }
            PanelMode::BulkResults => {
                if let Some(message) = self.error.as_deref() {
                    PanelView::Failed {
                        target: None,
                        message,
                    }
                } else {
                    PanelView::Bulk {
                        records: self.records.as_deref().unwrap_or_default(),
                        summary: self.summary.unwrap_or_default(),
                    }
                }
            }
        }
    }
}
