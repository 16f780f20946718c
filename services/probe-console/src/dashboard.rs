//! Dashboard controller
//!
//! One [`Dashboard`] per session owns the API client and the state handle.
//! Its methods are the actions the renderer binds to: filter controls,
//! selection, bulk trigger, and the result panel. Network calls happen with
//! the state lock released; completions re-acquire it and are checked
//! against the ticket taken when the action started.

use std::sync::Arc;

use crate::api::{HttpMonitorApi, MonitorApi};
use crate::bulk::{self, BulkPlan};
use crate::config::Config;
use crate::directory::fetch_directory;
use crate::io::ReqwestHttpClient;
use crate::model::{MonitorKind, ResultRecord, SelectionKey, Tag};
use crate::state::{new_state_handle, DashboardView, StateHandle};
use crate::ConsoleError;

/// Clears `bulk_in_flight` if a trigger is abandoned before it completes,
/// e.g. when the caller's future is dropped by a timeout
struct InFlightGuard {
    state: Option<StateHandle>,
}

impl InFlightGuard {
    fn new(state: StateHandle) -> Self {
        Self { state: Some(state) }
    }

    /// The trigger completed and cleared the flag itself
    fn disarm(mut self) {
        self.state = None;
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        tracing::warn!("Bulk trigger abandoned before completion");
        if let Ok(mut guard) = state.try_write() {
            guard.bulk_in_flight = false;
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    state.write().await.bulk_in_flight = false;
                });
            }
            Err(_) => tracing::error!("No runtime to clear the bulk trigger flag"),
        }
    }
}

pub struct Dashboard {
    api: Arc<dyn MonitorApi>,
    state: StateHandle,
    cancel_key: String,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("cancel_key", &self.cancel_key)
            .finish()
    }
}

impl Dashboard {
    pub fn new(api: Arc<dyn MonitorApi>) -> Self {
        Self {
            api,
            state: new_state_handle(),
            cancel_key: crate::config::ConsoleConfig::default().cancel_key,
        }
    }

    /// Build a dashboard talking HTTP to the configured API
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let http = Arc::new(ReqwestHttpClient::with_timeout(
            config.api.request_timeout(),
        )?);
        let api = HttpMonitorApi::new(&config.api.base_url, http)?;
        Ok(Self::new(Arc::new(api)).with_cancel_key(config.console.cancel_key.clone()))
    }

    pub fn with_cancel_key(mut self, key: impl Into<String>) -> Self {
        self.cancel_key = key.into();
        self
    }

    pub fn state(&self) -> StateHandle {
        Arc::clone(&self.state)
    }

    /// Snapshot for the rendering layer
    pub async fn view(&self) -> DashboardView {
        self.state.read().await.view()
    }

    /// Fetch both monitor lists and replace the directory
    ///
    /// On failure the directory is emptied and the panel closed so nothing
    /// stale stays on screen. Selection is left alone. A load overtaken by a
    /// later one returns `Ok` whatever its own outcome.
    pub async fn load(&self) -> crate::Result<()> {
        let ticket = self.state.write().await.directory.begin_load();
        tracing::debug!("Loading monitor directory");

        let outcome = fetch_directory(self.api.as_ref()).await;
        let failure = outcome.as_ref().err().map(ToString::to_string);

        let mut state = self.state.write().await;
        let applied = state.directory.finish_load(ticket, outcome);
        match failure {
            None => Ok(()),
            Some(reason) if applied => {
                state.panel.close();
                Err(ConsoleError::DirectoryLoad(reason))
            }
            // A newer load owns the directory now; its outcome is the one
            // that counts.
            Some(_) => Ok(()),
        }
    }

    pub async fn set_search_term(&self, term: &str) {
        self.state.write().await.filter.set_search_term(term);
    }

    /// Flip a `key:value` tag filter
    ///
    /// Only tags some loaded monitor carries can be switched on. A selected
    /// tag can always be switched off, even after a reload dropped it.
    pub async fn toggle_tag(&self, tag: &str) -> crate::Result<bool> {
        let parsed: Tag = tag.parse()?;
        let flattened = parsed.to_string();

        let mut state = self.state.write().await;
        if !state.filter.is_tag_selected(&flattened)
            && !state.directory.entries().any(|(_, item)| item.has_tag(&parsed))
        {
            tracing::warn!("No monitor carries tag {}", flattened);
            return Err(ConsoleError::InvalidTag(flattened));
        }
        let selected = state.filter.toggle_tag(&flattened);
        tracing::debug!(
            "Tag filter {} {}",
            flattened,
            if selected { "on" } else { "off" }
        );
        Ok(selected)
    }

    /// Reset search term and tag filters
    pub async fn clear_filters(&self) {
        self.state.write().await.filter.clear();
    }

    pub async fn toggle_selection(&self, kind: MonitorKind, name: &str) -> bool {
        self.state
            .write()
            .await
            .selection
            .toggle(SelectionKey::new(kind, name))
    }

    /// Select every monitor passing the tag filter. The search term is not
    /// applied.
    pub async fn select_all(&self) -> usize {
        let mut state = self.state.write().await;
        let candidates = state.select_all_candidates();
        let added = state.selection.select_all(candidates);
        tracing::debug!(
            "Select all added {} monitors ({} selected)",
            added,
            state.selection.len()
        );
        added
    }

    pub async fn clear_selection(&self) {
        self.state.write().await.selection.clear();
    }

    /// Re-run the selected monitors, one call per kind, and show the outcome
    /// in the panel
    ///
    /// A no-op when nothing is selected or a trigger is already running. The
    /// selection survives both success and failure.
    pub async fn trigger_bulk(&self) -> crate::Result<()> {
        let (plan, ticket) = {
            let mut state = self.state.write().await;
            if state.bulk_in_flight {
                tracing::warn!("Bulk trigger already in progress");
                return Ok(());
            }
            if state.selection.is_empty() {
                tracing::debug!("Bulk trigger with empty selection ignored");
                return Ok(());
            }
            let plan = BulkPlan::from_selection(&state.selection, &state.directory);
            if plan.is_empty() {
                tracing::warn!("None of the selected monitors are in the directory");
                return Ok(());
            }
            state.bulk_in_flight = true;
            (plan, state.panel.ticket())
        };
        let in_flight = InFlightGuard::new(self.state());

        let outcome = bulk::execute(self.api.as_ref(), &plan).await;
        let failure = match &outcome {
            Ok(_) => None,
            Err(ConsoleError::BulkTrigger(reason)) => Some(reason.clone()),
            Err(e) => Some(e.to_string()),
        };

        let mut state = self.state.write().await;
        state.bulk_in_flight = false;
        in_flight.disarm();
        state.panel.complete_bulk(ticket, outcome);
        match failure {
            None => Ok(()),
            Some(reason) => Err(ConsoleError::BulkTrigger(reason)),
        }
    }

    /// Open the panel on one monitor and fetch its history
    ///
    /// A later call supersedes this one: if it starts before this fetch
    /// returns, this fetch's result is discarded.
    pub async fn open_monitor(&self, kind: MonitorKind, name: &str) -> crate::Result<()> {
        let ticket = self
            .state
            .write()
            .await
            .panel
            .open_single(SelectionKey::new(kind, name));

        let outcome: crate::Result<Vec<ResultRecord>> = match kind {
            MonitorKind::Probe => self
                .api
                .probe_results(name)
                .await
                .map(|results| results.into_iter().map(ResultRecord::from).collect()),
            MonitorKind::Story => self
                .api
                .story_results(name)
                .await
                .map(|results| results.into_iter().map(ResultRecord::from).collect()),
        };
        let failure = outcome.as_ref().err().map(ToString::to_string);

        self.state
            .write()
            .await
            .panel
            .complete_single(ticket, outcome);
        match failure {
            None => Ok(()),
            Some(reason) => Err(ConsoleError::ResultFetch {
                kind,
                name: name.to_string(),
                reason,
            }),
        }
    }

    /// Close the panel; returns false if it was already closed
    pub async fn close_panel(&self) -> bool {
        self.state.write().await.panel.close()
    }

    /// Global keystroke handler: the cancel key closes the panel
    pub async fn handle_key(&self, key: &str) -> bool {
        if key != self.cancel_key {
            return false;
        }
        self.close_panel().await
    }
}
