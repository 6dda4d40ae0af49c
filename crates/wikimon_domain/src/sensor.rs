use crate::types::Snapshot;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityCategory {
    Diagnostic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateClass {
    Measurement,
}

/// Resolved state of a sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SensorValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl SensorValue {
    /// Scalars map one-to-one; arrays, objects, booleans and null do not resolve.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float)),
            Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }
}

impl std::fmt::Display for SensorValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// Declarative description of one sensor exposed per instance.
#[derive(Debug, Clone, Copy)]
pub struct SensorDescription {
    pub key: &'static str,
    pub translation_key: &'static str,
    pub entity_category: Option<EntityCategory>,
    pub state_class: Option<StateClass>,
    pub value_fn: fn(&Snapshot) -> Option<SensorValue>,
    pub attr_fn: fn(&Snapshot) -> Option<Map<String, Value>>,
    pub available_fn: fn(&Snapshot) -> bool,
}

fn images_count(snapshot: &Snapshot) -> Option<SensorValue> {
    snapshot.statistic("images").and_then(SensorValue::from_json)
}

fn pages_count(snapshot: &Snapshot) -> Option<SensorValue> {
    snapshot.statistic("pages").and_then(SensorValue::from_json)
}

fn software_version(snapshot: &Snapshot) -> Option<SensorValue> {
    snapshot.general_field("generator").and_then(SensorValue::from_json)
}

fn no_attributes(_: &Snapshot) -> Option<Map<String, Value>> {
    None
}

fn always_available(_: &Snapshot) -> bool {
    true
}

pub static SENSOR_DESCRIPTIONS: [SensorDescription; 3] = [
    SensorDescription {
        key: "images_count",
        translation_key: "images_count",
        entity_category: Some(EntityCategory::Diagnostic),
        state_class: Some(StateClass::Measurement),
        value_fn: images_count,
        attr_fn: no_attributes,
        available_fn: always_available,
    },
    SensorDescription {
        key: "pages_count",
        translation_key: "pages_count",
        entity_category: Some(EntityCategory::Diagnostic),
        state_class: Some(StateClass::Measurement),
        value_fn: pages_count,
        attr_fn: no_attributes,
        available_fn: always_available,
    },
    SensorDescription {
        key: "software_version",
        translation_key: "software_version",
        entity_category: Some(EntityCategory::Diagnostic),
        state_class: None,
        value_fn: software_version,
        attr_fn: no_attributes,
        available_fn: always_available,
    },
];

pub fn description(key: &str) -> Option<&'static SensorDescription> {
    SENSOR_DESCRIPTIONS.iter().find(|d| d.key == key)
}

/// Lowercase and replace spaces with underscores, for unique ids.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}
