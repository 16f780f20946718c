//! Dashboard state shared between the controller and the renderer

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::directory::{Directory, LoadStatus};
use crate::filter::{self, TagFilterState, TagVocabulary};
use crate::model::{MonitorItem, MonitorKind, SelectionKey};
use crate::panel::PanelState;
use crate::selection::SelectionTracker;

/// Everything the dashboard knows, owned in one place
#[derive(Debug, Default)]
pub struct DashboardState {
    pub directory: Directory,
    pub filter: TagFilterState,
    pub selection: SelectionTracker,
    pub panel: PanelState,
    pub bulk_in_flight: bool,
}

/// What the monitor grid should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridStatus {
    Loading,
    LoadFailed(String),
    NoMonitorsConfigured,
    NoMatches,
    Showing { visible: usize, total: usize },
}

/// A monitor card as the renderer sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleMonitor {
    pub kind: MonitorKind,
    pub item: MonitorItem,
    pub selected: bool,
}

impl VisibleMonitor {
    pub fn key(&self) -> SelectionKey {
        SelectionKey::new(self.kind, self.item.name.clone())
    }
}

/// Owned snapshot of everything the rendering layer consumes
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub grid: GridStatus,
    pub monitors: Vec<VisibleMonitor>,
    pub vocabulary: TagVocabulary,
    pub filter: TagFilterState,
    pub selected_count: usize,
    pub bulk_in_flight: bool,
    pub panel: PanelState,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys of every monitor passing the tag filter, search term ignored
    pub fn select_all_candidates(&self) -> Vec<SelectionKey> {
        filter::tag_filtered(&self.directory, &self.filter.selected_tags)
            .iter()
            .map(|entry| entry.key())
            .collect()
    }

    pub fn grid_status(&self, visible: usize) -> GridStatus {
        match self.directory.status() {
            LoadStatus::Loading => GridStatus::Loading,
            LoadStatus::Failed(message) => GridStatus::LoadFailed(message.clone()),
            LoadStatus::Loaded if self.directory.is_empty() => GridStatus::NoMonitorsConfigured,
            LoadStatus::Loaded if visible == 0 => GridStatus::NoMatches,
            LoadStatus::Loaded => GridStatus::Showing {
                visible,
                total: self.directory.len(),
            },
        }
    }

    pub fn view(&self) -> DashboardView {
        let loaded = self.directory.is_loaded();
        let monitors: Vec<VisibleMonitor> = if loaded {
            filter::visible(&self.directory, &self.filter)
                .into_iter()
                .map(|entry| VisibleMonitor {
                    kind: entry.kind,
                    item: entry.item.clone(),
                    selected: self.selection.contains(&entry.key()),
                })
                .collect()
        } else {
            Vec::new()
        };
        let vocabulary = if loaded {
            filter::tag_vocabulary(self.directory.entries().map(|(_, item)| item))
        } else {
            TagVocabulary::new()
        };

        DashboardView {
            grid: self.grid_status(monitors.len()),
            monitors,
            vocabulary,
            filter: self.filter.clone(),
            selected_count: self.selection.len(),
            bulk_in_flight: self.bulk_in_flight,
            panel: self.panel.clone(),
        }
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<DashboardState>>;

pub fn new_state_handle() -> StateHandle {
    Arc::new(RwLock::new(DashboardState::new()))
}
