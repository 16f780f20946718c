//! Data model shared by the directory, filter, selection and panel modules
//!
//! Wire types mirror the JSON payloads of the monitoring API. Result payloads
//! are decoded into the [`ResultRecord`] tagged union at the network boundary.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConsoleError;

/// The two kinds of monitor the backend knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorKind {
    Probe,
    Story,
}

impl MonitorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorKind::Probe => "probe",
            MonitorKind::Story => "story",
        }
    }
}

impl fmt::Display for MonitorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MonitorKind {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "probe" => Ok(MonitorKind::Probe),
            "story" => Ok(MonitorKind::Story),
            other => Err(ConsoleError::InvalidSelectionKey(other.to_string())),
        }
    }
}

/// A monitor as listed by `GET /probes` or `GET /stories`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorItem {
    pub name: String,
    pub status: String,
    pub last_probed: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: BTreeMap<String, String>,
}

impl MonitorItem {
    /// Tags in their flattened `key:value` form
    pub fn flattened_tags(&self) -> impl Iterator<Item = String> + '_ {
        self.tags.iter().map(|(k, v)| format!("{}:{}", k, v))
    }

    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.get(&tag.key).is_some_and(|v| *v == tag.value)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A key/value label, written `key:value` in filter and selection contexts
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.value)
    }
}

impl FromStr for Tag {
    type Err = ConsoleError;

    /// Splits on the first `:`; values may themselves contain colons
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((key, value)) if !key.is_empty() => Ok(Tag::new(key, value)),
            _ => Err(ConsoleError::InvalidTag(s.to_string())),
        }
    }
}

/// Canonical identity of a monitor: `(kind, name)`
///
/// String form is `probe:<name>` / `story:<name>`, so selections survive a
/// directory reload as long as the pair still exists.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SelectionKey {
    pub kind: MonitorKind,
    pub name: String,
}

impl SelectionKey {
    pub fn new(kind: MonitorKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

impl FromStr for SelectionKey {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, name) = s
            .split_once(':')
            .ok_or_else(|| ConsoleError::InvalidSelectionKey(s.to_string()))?;
        let kind = kind
            .parse::<MonitorKind>()
            .map_err(|_| ConsoleError::InvalidSelectionKey(s.to_string()))?;
        Ok(SelectionKey::new(kind, name))
    }
}

/// One execution of a probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub probe_name: String,
    #[serde(rename = "timestamp_started")]
    pub started_at: DateTime<Utc>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

/// Outcome of a single step inside a story run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_name: String,
    #[serde(rename = "timestamp_started")]
    pub started_at: DateTime<Utc>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
}

/// One execution of a story, with ordered step results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryResult {
    pub story_name: String,
    #[serde(rename = "timestamp_started")]
    pub started_at: DateTime<Utc>,
    pub success: bool,
    #[serde(default)]
    pub step_results: Vec<StepResult>,
}

/// A probe or story execution record
///
/// Decoding is structural: a payload carrying `story_name` is a story result,
/// anything else is tried as a probe result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultRecord {
    Story(StoryResult),
    Probe(ProbeResult),
}

impl ResultRecord {
    pub fn kind(&self) -> MonitorKind {
        match self {
            ResultRecord::Probe(_) => MonitorKind::Probe,
            ResultRecord::Story(_) => MonitorKind::Story,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ResultRecord::Probe(r) => &r.probe_name,
            ResultRecord::Story(r) => &r.story_name,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        match self {
            ResultRecord::Probe(r) => r.started_at,
            ResultRecord::Story(r) => r.started_at,
        }
    }

    pub fn success(&self) -> bool {
        match self {
            ResultRecord::Probe(r) => r.success,
            ResultRecord::Story(r) => r.success,
        }
    }
}

impl From<ProbeResult> for ResultRecord {
    fn from(result: ProbeResult) -> Self {
        ResultRecord::Probe(result)
    }
}

impl From<StoryResult> for ResultRecord {
    fn from(result: StoryResult) -> Self {
        ResultRecord::Story(result)
    }
}

/// Body of `POST /{probes,stories}/bulk/trigger`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkTriggerRequest {
    pub tags: BTreeMap<String, String>,
}

/// Response of a bulk trigger call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkTriggerResponse {
    pub triggered_count: usize,
    #[serde(default)]
    pub results: Vec<ResultRecord>,
}
