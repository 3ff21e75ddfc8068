//! Tracing model produced by the native graphics tracer
//!
//! The model is loaded once per view session and never mutated. Every event
//! list is stored as an `Arc<[Event]>` so event series share it instead of
//! copying, and the raw JSON is kept verbatim for saving.
//!
//! Wire shape of an event is the tuple `[type, timestamp, value?]`.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use arcscope_common::EventKind;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::domain::{Micros, ModelError, Pid, Tid};

/// Optional payload of an event
#[derive(Debug, Clone, PartialEq)]
pub enum EventValue {
    /// Counter sample or, for CPU activity, the scheduled thread id
    Number(f64),
    /// Custom event payload
    Text(String),
}

/// A single point-in-time occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub timestamp: Micros,
    pub value: Option<EventValue>,
}

impl Event {
    #[must_use]
    pub fn new(kind: EventKind, timestamp: Micros) -> Self {
        Self { kind, timestamp, value: None }
    }

    #[must_use]
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(EventValue::Number(value));
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.value = Some(EventValue::Text(text.into()));
        self
    }

    /// Wire code of the event kind
    #[must_use]
    pub fn code(&self) -> u32 {
        self.kind.code()
    }

    /// Numeric value, if any
    #[must_use]
    pub fn number(&self) -> Option<f64> {
        match self.value {
            Some(EventValue::Number(v)) => Some(v),
            _ => None,
        }
    }

    /// Payload rendered for display
    #[must_use]
    pub fn value_text(&self) -> Option<String> {
        match &self.value {
            Some(EventValue::Number(v)) => Some(format!("{v}")),
            Some(EventValue::Text(s)) => Some(s.clone()),
            None => None,
        }
    }
}

/// Buffers plus free-standing marks of one producer (Android or Chrome)
#[derive(Debug, Clone, PartialEq)]
pub struct EventGroup {
    pub buffers: Vec<Arc<[Event]>>,
    pub global_events: Arc<[Event]>,
}

impl Default for EventGroup {
    fn default() -> Self {
        Self { buffers: Vec::new(), global_events: Arc::from(Vec::new()) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadInfo {
    pub pid: Pid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub title: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// System-wide channels: per-core activity, counters and thread names
#[derive(Debug, Clone, PartialEq)]
pub struct SystemModel {
    pub cpu: Vec<Arc<[Event]>>,
    pub memory: Arc<[Event]>,
    pub threads: BTreeMap<Tid, ThreadInfo>,
}

impl Default for SystemModel {
    fn default() -> Self {
        Self { cpu: Vec::new(), memory: Arc::from(Vec::new()), threads: BTreeMap::new() }
    }
}

/// One Android activity (view) with its own buffers
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub task_id: i64,
    pub activity: String,
    pub buffers: Vec<Arc<[Event]>>,
    pub global_events: Arc<[Event]>,
}

/// Parsed tracing model (immutable, loaded from file)
#[derive(Debug, Clone, PartialEq)]
pub struct TraceModel {
    pub duration: Micros,
    pub android: EventGroup,
    pub chrome: EventGroup,
    pub system: SystemModel,
    pub views: Vec<ViewModel>,
    pub tasks: BTreeMap<String, TaskInfo>,
    raw: JsonValue,
}

// Raw serde shapes; events stay untyped until validated.

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawModel {
    duration: f64,
    android: RawGroup,
    chrome: RawGroup,
    system: RawSystem,
    views: Vec<RawView>,
    tasks: BTreeMap<String, TaskInfo>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawGroup {
    buffers: Vec<Vec<JsonValue>>,
    global_events: Vec<JsonValue>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawSystem {
    cpu: Vec<Vec<JsonValue>>,
    memory: Vec<JsonValue>,
    threads: BTreeMap<String, ThreadInfo>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawView {
    task_id: i64,
    activity: String,
    buffers: Vec<Vec<JsonValue>>,
    global_events: Vec<JsonValue>,
}

impl TraceModel {
    /// Parse a model from its JSON text.
    ///
    /// # Errors
    /// Fails on malformed JSON, unknown event type codes, and timestamps that
    /// go backwards within one event list.
    pub fn from_json_str(content: &str) -> Result<Self, ModelError> {
        let raw: JsonValue = serde_json::from_str(content)?;
        Self::from_value(raw)
    }

    /// Parse a model file.
    ///
    /// # Errors
    /// See [`TraceModel::from_json_str`]; also fails if the file can't be read.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let model = Self::from_json_str(&content)?;
        info!(
            "Loaded tracing model {}: {}us, {} cpus, {} views",
            path.as_ref().display(),
            model.duration,
            model.system.cpu.len(),
            model.views.len()
        );
        Ok(model)
    }

    /// Build a model from an already parsed JSON value.
    ///
    /// # Errors
    /// See [`TraceModel::from_json_str`].
    pub fn from_value(raw: JsonValue) -> Result<Self, ModelError> {
        let parsed: RawModel = serde_json::from_value(raw.clone())?;

        let android = parse_group("android", &parsed.android)?;
        let chrome = parse_group("chrome", &parsed.chrome)?;

        let cpu = parse_lists("system.cpu", &parsed.system.cpu)?;
        let memory = parse_events("system.memory", &parsed.system.memory)?;
        let mut threads = BTreeMap::new();
        for (key, info) in parsed.system.threads {
            let tid = key.parse::<u32>().map_err(|_| ModelError::MalformedEvent {
                list: "system.threads".to_string(),
                index: threads.len(),
                reason: format!("thread id {key:?} is not a number"),
            })?;
            threads.insert(Tid(tid), info);
        }

        let views = parsed
            .views
            .iter()
            .enumerate()
            .map(|(i, view)| {
                let name = format!("views[{i}]");
                Ok(ViewModel {
                    task_id: view.task_id,
                    activity: view.activity.clone(),
                    buffers: parse_lists(&format!("{name}.buffers"), &view.buffers)?,
                    global_events: parse_events(&format!("{name}.global_events"), &view.global_events)?,
                })
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        debug!("Parsed {} thread names, {} tasks", threads.len(), parsed.tasks.len());

        Ok(Self {
            duration: parsed.duration as Micros,
            android,
            chrome,
            system: SystemModel { cpu, memory, threads },
            views,
            tasks: parsed.tasks,
            raw,
        })
    }

    /// The model exactly as it was loaded
    #[must_use]
    pub fn raw(&self) -> &JsonValue {
        &self.raw
    }

    /// Serialize the model verbatim.
    ///
    /// # Errors
    /// Only fails if the retained JSON can't be serialized.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.raw)
    }

    #[must_use]
    pub fn thread(&self, tid: Tid) -> Option<&ThreadInfo> {
        self.system.threads.get(&tid)
    }

    #[must_use]
    pub fn task(&self, task_id: i64) -> Option<&TaskInfo> {
        self.tasks.get(&task_id.to_string())
    }
}

fn parse_group(name: &str, group: &RawGroup) -> Result<EventGroup, ModelError> {
    Ok(EventGroup {
        buffers: parse_lists(&format!("{name}.buffers"), &group.buffers)?,
        global_events: parse_events(&format!("{name}.global_events"), &group.global_events)?,
    })
}

fn parse_lists(name: &str, lists: &[Vec<JsonValue>]) -> Result<Vec<Arc<[Event]>>, ModelError> {
    lists
        .iter()
        .enumerate()
        .map(|(i, list)| parse_events(&format!("{name}[{i}]"), list))
        .collect()
}

/// Validate and convert one event list.
fn parse_events(list: &str, raw: &[JsonValue]) -> Result<Arc<[Event]>, ModelError> {
    let mut events = Vec::with_capacity(raw.len());
    let mut previous: Option<Micros> = None;

    for (index, value) in raw.iter().enumerate() {
        let malformed = |reason: &str| ModelError::MalformedEvent {
            list: list.to_string(),
            index,
            reason: reason.to_string(),
        };

        let fields = value.as_array().ok_or_else(|| malformed("event is not an array"))?;
        if !(2..=3).contains(&fields.len()) {
            return Err(malformed("event must have 2 or 3 fields"));
        }

        let code = fields[0].as_u64().ok_or_else(|| malformed("type is not an integer"))?;
        let code = u32::try_from(code).map_err(|_| malformed("type out of range"))?;
        let kind = EventKind::from_code(code).ok_or_else(|| ModelError::UnknownEventType {
            code,
            list: list.to_string(),
            index,
        })?;

        let timestamp = fields[1]
            .as_i64()
            .or_else(|| fields[1].as_f64().map(|t| t as Micros))
            .ok_or_else(|| malformed("timestamp is not a number"))?;
        if let Some(previous) = previous {
            if timestamp < previous {
                return Err(ModelError::OutOfOrder {
                    list: list.to_string(),
                    index,
                    timestamp,
                    previous,
                });
            }
        }
        previous = Some(timestamp);

        let value = match fields.get(2) {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(s)) => Some(EventValue::Text(s.clone())),
            Some(v) => Some(EventValue::Number(
                v.as_f64().ok_or_else(|| malformed("value is neither number nor string"))?,
            )),
        };

        events.push(Event { kind, timestamp, value });
    }

    Ok(Arc::from(events))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "duration": 1000,
        "android": { "buffers": [[[400, 10], [403, 20], [404, 30]]], "global_events": [[400, 10]] },
        "system": {
            "cpu": [[[1, 0, 42], [0, 500]]],
            "memory": [[10001, 0, 1024.5]],
            "threads": { "42": { "pid": 40, "name": "RenderThread" } }
        },
        "views": [ { "task_id": 7, "activity": "MainActivity", "buffers": [], "global_events": [[600, 50, "mark"]] } ],
        "tasks": { "7": { "title": "Game" } }
    }"#;

    #[test]
    fn test_parse_minimal_model() {
        let model = TraceModel::from_json_str(MINIMAL).unwrap();

        assert_eq!(model.duration, 1000);
        assert_eq!(model.android.buffers.len(), 1);
        assert_eq!(model.android.buffers[0].len(), 3);
        assert_eq!(model.android.buffers[0][1].kind, EventKind::SurfaceFlingerCompositionStart);
        assert!(model.chrome.buffers.is_empty());
        assert_eq!(model.system.cpu[0][0].number(), Some(42.0));
        assert_eq!(model.system.memory[0].number(), Some(1024.5));
        assert_eq!(model.thread(Tid(42)).map(|t| t.pid), Some(Pid(40)));
        assert_eq!(model.views[0].global_events[0].value_text().as_deref(), Some("mark"));
        assert_eq!(model.task(7).map(|t| t.title.as_str()), Some("Game"));
    }

    #[test]
    fn test_rejects_unknown_type() {
        let err = TraceModel::from_json_str(r#"{"system": {"memory": [[10001, 0, 1], [9999, 5, 1]]}}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::UnknownEventType { code: 9999, index: 1, ref list } if list == "system.memory"
        ));
    }

    #[test]
    fn test_rejects_out_of_order() {
        let err = TraceModel::from_json_str(r#"{"chrome": {"buffers": [[[500, 20], [501, 10]]]}}"#)
            .unwrap_err();
        assert!(matches!(err, ModelError::OutOfOrder { timestamp: 10, previous: 20, .. }));
    }

    #[test]
    fn test_rejects_malformed_event() {
        let err = TraceModel::from_json_str(r#"{"chrome": {"global_events": [[500]]}}"#).unwrap_err();
        assert!(matches!(err, ModelError::MalformedEvent { .. }));
    }

    #[test]
    fn test_equal_timestamps_are_allowed() {
        let model =
            TraceModel::from_json_str(r#"{"chrome": {"buffers": [[[500, 10], [501, 10]]]}}"#).unwrap();
        assert_eq!(model.chrome.buffers[0].len(), 2);
    }

    #[test]
    fn test_serialize_verbatim() {
        let model = TraceModel::from_json_str(MINIMAL).unwrap();
        let text = model.to_json_string().unwrap();
        let reloaded = TraceModel::from_json_str(&text).unwrap();
        assert_eq!(model, reloaded);
        assert_eq!(model.raw(), reloaded.raw());
    }
}
