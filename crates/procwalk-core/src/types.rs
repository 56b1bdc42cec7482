//! Core types for procwalk

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Process instance key - opaque 64-bit identifier, unique within the engine
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceKey(i64);

impl ResourceKey {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    /// The engine reports "no parent" as zero (or omits the field).
    pub const fn is_unset(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ResourceKey {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl FromStr for ResourceKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| Error::InvalidKey(s.to_string()))
    }
}

/// Process instance state as reported by the engine.
///
/// Unknown engine-specific values are kept verbatim in `Other`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum State {
    Active,
    Completed,
    Canceled,
    Incident,
    Other(String),
}

impl State {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Canceled => "CANCELED",
            Self::Incident => "INCIDENT",
            Self::Other(s) => s,
        }
    }

    /// Case-insensitive comparison on the wire form.
    pub fn matches(&self, other: &State) -> bool {
        self.as_str().eq_ignore_ascii_case(other.as_str())
    }

    /// Parse a user-supplied state; rejects anything outside the known set.
    pub fn parse_known(s: &str) -> Result<Self> {
        match State::from(s) {
            Self::Other(_) => Err(Error::UnknownState(s.to_string())),
            known => Ok(known),
        }
    }
}

impl From<&str> for State {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Self::Active,
            "completed" => Self::Completed,
            "canceled" | "cancelled" | "terminated" => Self::Canceled,
            "incident" => Self::Incident,
            _ => Self::Other(s.to_string()),
        }
    }
}

impl From<String> for State {
    fn from(s: String) -> Self {
        State::from(s.as_str())
    }
}

impl From<State> for String {
    fn from(s: State) -> Self {
        s.as_str().to_string()
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State filter for searches; `All` means no state restriction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum StateFilter {
    #[default]
    All,
    Only(State),
}

impl FromStr for StateFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        State::parse_known(s).map(Self::Only)
    }
}

/// A process instance, reduced to what procwalk needs plus display fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInstance {
    pub key: ResourceKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_key: Option<ResourceKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_flow_node_instance_key: Option<ResourceKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_definition_key: Option<ResourceKey>,
    pub state: State,
    pub bpmn_process_id: String,
    pub process_version: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_version_tag: Option<String>,
    pub tenant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub incident: bool,
}

impl ProcessInstance {
    pub fn new(key: impl Into<ResourceKey>) -> Self {
        Self {
            key: key.into(),
            parent_key: None,
            parent_flow_node_instance_key: None,
            process_definition_key: None,
            state: State::Active,
            bpmn_process_id: String::new(),
            process_version: 0,
            process_version_tag: None,
            tenant_id: String::new(),
            start_date: None,
            end_date: None,
            incident: false,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<ResourceKey>) -> Self {
        self.parent_key = Some(parent.into());
        self
    }

    pub fn with_state(mut self, state: State) -> Self {
        self.state = state;
        self
    }

    pub fn with_process(mut self, bpmn_process_id: impl Into<String>, version: i32) -> Self {
        self.bpmn_process_id = bpmn_process_id.into();
        self.process_version = version;
        self
    }

    /// Parent key, with the engine's zero sentinel folded into `None`.
    pub fn parent(&self) -> Option<ResourceKey> {
        self.parent_key.filter(|k| !k.is_unset())
    }

    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }
}

/// A page of process instances returned by a search
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessInstances {
    pub total: i64,
    pub items: Vec<ProcessInstance>,
}

impl ProcessInstances {
    pub fn new(items: Vec<ProcessInstance>) -> Self {
        Self {
            total: items.len() as i64,
            items,
        }
    }

    /// Keep only instances that have a parent.
    pub fn children_only(self) -> Self {
        self.retain(|pi| pi.parent().is_some())
    }

    /// Keep only root instances.
    pub fn parents_only(self) -> Self {
        self.retain(|pi| pi.parent().is_none())
    }

    pub fn with_incidents(self, has_incident: bool) -> Self {
        self.retain(|pi| pi.incident == has_incident)
    }

    fn retain(mut self, keep: impl Fn(&ProcessInstance) -> bool) -> Self {
        self.items.retain(|pi| keep(pi));
        self.total = self.items.len() as i64;
        self
    }

    pub fn keys(&self) -> Path {
        self.items.iter().map(|pi| pi.key).collect()
    }
}

/// Search criteria; unset fields do not restrict the result.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchFilter {
    pub key: Option<ResourceKey>,
    pub bpmn_process_id: Option<String>,
    pub process_version: Option<i32>,
    pub process_version_tag: Option<String>,
    pub state: StateFilter,
    pub parent_key: Option<ResourceKey>,
}

impl SearchFilter {
    pub fn key(mut self, key: ResourceKey) -> Self {
        self.key = Some(key);
        self
    }

    pub fn bpmn_process_id(mut self, id: impl Into<String>) -> Self {
        self.bpmn_process_id = Some(id.into());
        self
    }

    pub fn process_version(mut self, version: i32) -> Self {
        self.process_version = Some(version);
        self
    }

    pub fn process_version_tag(mut self, tag: impl Into<String>) -> Self {
        self.process_version_tag = Some(tag.into());
        self
    }

    pub fn state(mut self, state: StateFilter) -> Self {
        self.state = state;
        self
    }

    pub fn parent_key(mut self, parent: ResourceKey) -> Self {
        self.parent_key = Some(parent);
        self
    }
}

/// Result of a delete call
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStatus {
    pub deleted: i64,
    pub message: String,
}

/// Keys in traversal order.
pub type Path = Vec<ResourceKey>;

/// Fully-fetched instances by key, filled once per traversal call.
pub type Chain = HashMap<ResourceKey, ProcessInstance>;

/// Parent key to ordered child keys. An explored parent always has an entry,
/// even with no children.
pub type Edges = HashMap<ResourceKey, Vec<ResourceKey>>;
