//! Monitor Directory: the probe and story lists and their load status
//!
//! The two lists are kept apart; merged views are derived by the filter
//! module. A load replaces both lists at once and only when both listing
//! calls succeed.

use crate::api::MonitorApi;
use crate::model::{MonitorItem, MonitorKind, SelectionKey};

/// Message shown in place of the grid when the directory cannot be loaded
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load monitors";

/// Load status of the directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loading,
    Loaded,
    Failed(String),
}

/// Identifies one call to [`Directory::begin_load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug)]
pub struct Directory {
    probes: Vec<MonitorItem>,
    stories: Vec<MonitorItem>,
    status: LoadStatus,
    generation: u64,
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}

impl Directory {
    /// An empty directory awaiting its first load
    pub fn new() -> Self {
        Self {
            probes: Vec::new(),
            stories: Vec::new(),
            status: LoadStatus::Loading,
            generation: 0,
        }
    }

    pub fn probes(&self) -> &[MonitorItem] {
        &self.probes
    }

    pub fn stories(&self) -> &[MonitorItem] {
        &self.stories
    }

    pub fn items(&self, kind: MonitorKind) -> &[MonitorItem] {
        match kind {
            MonitorKind::Probe => &self.probes,
            MonitorKind::Story => &self.stories,
        }
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn is_loaded(&self) -> bool {
        self.status == LoadStatus::Loaded
    }

    /// Total number of monitors across both kinds
    pub fn len(&self) -> usize {
        self.probes.len() + self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Probes first, then stories, each paired with its kind
    pub fn entries(&self) -> impl Iterator<Item = (MonitorKind, &MonitorItem)> {
        self.probes
            .iter()
            .map(|item| (MonitorKind::Probe, item))
            .chain(self.stories.iter().map(|item| (MonitorKind::Story, item)))
    }

    /// Resolve a selection key back to the monitor it names
    pub fn find(&self, key: &SelectionKey) -> Option<&MonitorItem> {
        self.items(key.kind).iter().find(|item| item.name == key.name)
    }

    /// Mark the directory as loading; only the returned ticket's completion
    /// will be applied
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.status = LoadStatus::Loading;
        LoadTicket(self.generation)
    }

    /// Apply the outcome of a load. Returns false for a superseded ticket.
    ///
    /// On failure both lists are cleared so no stale monitors remain visible.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        outcome: crate::Result<(Vec<MonitorItem>, Vec<MonitorItem>)>,
    ) -> bool {
        if ticket.0 != self.generation {
            tracing::warn!(
                "Discarding directory load {} superseded by load {}",
                ticket.0,
                self.generation
            );
            return false;
        }

        match outcome {
            Ok((probes, stories)) => {
                tracing::info!(
                    "Directory loaded: {} probes, {} stories",
                    probes.len(),
                    stories.len()
                );
                self.probes = probes;
                self.stories = stories;
                self.status = LoadStatus::Loaded;
            }
            Err(e) => {
                tracing::error!("Directory load failed: {}", e);
                self.probes.clear();
                self.stories.clear();
                self.status = LoadStatus::Failed(LOAD_FAILED_MESSAGE.to_string());
            }
        }
        true
    }
}

/// Fetch both listings concurrently. Fails if either call fails.
pub async fn fetch_directory(
    api: &dyn MonitorApi,
) -> crate::Result<(Vec<MonitorItem>, Vec<MonitorItem>)> {
    tokio::try_join!(api.list_probes(), api.list_stories())
}
