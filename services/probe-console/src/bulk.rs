//! Bulk Trigger Workflow
//!
//! The selection is split into one cohort per monitor kind. Each cohort is
//! re-run with the tags every one of its members shares; the two trigger
//! calls run concurrently and their records are concatenated in completion
//! order. If either call fails the whole trigger fails and any records
//! already received are dropped.

use std::collections::BTreeMap;

use futures::stream::{FuturesUnordered, StreamExt};

use crate::api::MonitorApi;
use crate::directory::Directory;
use crate::model::{BulkTriggerResponse, MonitorItem, MonitorKind, ResultRecord};
use crate::selection::SelectionTracker;
use crate::ConsoleError;

/// Tags carried with the same value by every item. Empty input yields an
/// empty map.
pub fn common_tags<'a>(items: impl IntoIterator<Item = &'a MonitorItem>) -> BTreeMap<String, String> {
    let mut items = items.into_iter();
    let Some(first) = items.next() else {
        return BTreeMap::new();
    };
    let mut common = first.tags.clone();
    for item in items {
        common.retain(|key, value| item.tags.get(key) == Some(&*value));
        if common.is_empty() {
            break;
        }
    }
    common
}

/// One trigger call: all selected monitors of a kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cohort {
    pub kind: MonitorKind,
    pub members: Vec<String>,
    pub tags: BTreeMap<String, String>,
}

/// The trigger calls a selection resolves to, probes before stories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkPlan {
    pub cohorts: Vec<Cohort>,
}

impl BulkPlan {
    /// Partition the selection by kind and compute each cohort's tag filter
    ///
    /// Keys that no longer resolve in the directory are skipped.
    pub fn from_selection(selection: &SelectionTracker, directory: &Directory) -> Self {
        let mut cohorts = Vec::new();
        for kind in [MonitorKind::Probe, MonitorKind::Story] {
            let members: Vec<&MonitorItem> = selection
                .iter()
                .filter(|key| key.kind == kind)
                .filter_map(|key| {
                    let found = directory.find(key);
                    if found.is_none() {
                        tracing::debug!("Selected {} is no longer in the directory", key);
                    }
                    found
                })
                .collect();
            if members.is_empty() {
                continue;
            }

            let tags = common_tags(members.iter().copied());
            if tags.is_empty() {
                tracing::warn!(
                    "{} selected {} monitors share no tags; triggering all {}s",
                    members.len(),
                    kind,
                    kind
                );
            }
            cohorts.push(Cohort {
                kind,
                members: members.iter().map(|item| item.name.clone()).collect(),
                tags,
            });
        }
        Self { cohorts }
    }

    pub fn is_empty(&self) -> bool {
        self.cohorts.is_empty()
    }

    pub fn cohort(&self, kind: MonitorKind) -> Option<&Cohort> {
        self.cohorts.iter().find(|c| c.kind == kind)
    }
}

/// Aggregated result of a bulk trigger
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub triggered_count: usize,
    pub records: Vec<ResultRecord>,
}

impl BulkOutcome {
    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.success()).count()
    }

    pub fn failed(&self) -> usize {
        self.records.len() - self.succeeded()
    }
}

async fn trigger_cohort<'a>(
    api: &'a dyn MonitorApi,
    cohort: &'a Cohort,
) -> (&'a Cohort, crate::Result<BulkTriggerResponse>) {
    tracing::debug!(
        "Triggering {} cohort of {} with tags {:?}",
        cohort.kind,
        cohort.members.len(),
        cohort.tags
    );
    let result = match cohort.kind {
        MonitorKind::Probe => api.trigger_probes(&cohort.tags).await,
        MonitorKind::Story => api.trigger_stories(&cohort.tags).await,
    };
    (cohort, result)
}

/// Issue one trigger call per cohort concurrently and join the results
pub async fn execute(api: &dyn MonitorApi, plan: &BulkPlan) -> crate::Result<BulkOutcome> {
    let mut pending: FuturesUnordered<_> = plan
        .cohorts
        .iter()
        .map(|cohort| trigger_cohort(api, cohort))
        .collect();

    let mut outcome = BulkOutcome::default();
    while let Some((cohort, result)) = pending.next().await {
        match result {
            Ok(response) => {
                tracing::debug!(
                    "{} trigger returned {} records",
                    cohort.kind,
                    response.results.len()
                );
                outcome.triggered_count += response.triggered_count;
                outcome.records.extend(response.results);
            }
            Err(e) => {
                tracing::error!(
                    "Bulk trigger of {} cohort {:?} (tags {:?}) failed: {}",
                    cohort.kind,
                    cohort.members,
                    cohort.tags,
                    e
                );
                return Err(ConsoleError::BulkTrigger(format!(
                    "{} trigger failed: {}",
                    cohort.kind, e
                )));
            }
        }
    }

    tracing::info!(
        "Bulk trigger finished: {} triggered, {} records",
        outcome.triggered_count,
        outcome.records.len()
    );
    Ok(outcome)
}
