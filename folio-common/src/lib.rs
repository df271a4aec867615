//! Content Document model shared by the store, the server and the editor.
//!
//! The document is a JSON object keyed by section name. Only the top level
//! is ever inspected: six sections must be present and truthy for a write to
//! be accepted, everything below them is opaque.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Sections a document must carry before a write is accepted.
pub const REQUIRED_SECTIONS: [&str; 6] = ["hero", "about", "timeline", "skills", "projects", "contact"];

/// Every section the dashboard knows how to edit, in dashboard order.
pub const KNOWN_SECTIONS: [&str; 9] = [
    "settings",
    "hero",
    "about",
    "timeline",
    "skills",
    "github",
    "nowplaying",
    "projects",
    "contact",
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ContentError {
    #[error("content document must be a JSON object")]
    NotAnObject,

    #[error("missing or empty sections: {}", .0.join(", "))]
    MissingSections(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Accepts any JSON value that is an object; shape is not checked.
    pub fn from_value(value: Value) -> Result<Self, ContentError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ContentError::NotAnObject),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn section(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.0.get_mut(name)
    }

    /// Returns the section, inserting an empty object first if it is absent.
    pub fn section_or_insert(&mut self, name: &str) -> &mut Value {
        self.0
            .entry(name.to_string())
            .or_insert_with(|| Value::Object(Map::new()))
    }

    pub fn insert_section(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(name.into(), value)
    }

    pub fn remove_section(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Required sections that are absent or falsy, in declaration order.
    pub fn missing_sections(&self) -> Vec<&'static str> {
        REQUIRED_SECTIONS
            .into_iter()
            .filter(|name| !self.section(name).is_some_and(is_truthy))
            .collect()
    }

    pub fn validate(&self) -> Result<(), ContentError> {
        let missing = self.missing_sections();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ContentError::MissingSections(
                missing.into_iter().map(str::to_string).collect(),
            ))
        }
    }
}

impl TryFrom<Value> for Document {
    type Error = ContentError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        document.into_value()
    }
}

/// JSON truthiness as browsers see it: objects and arrays are always truthy,
/// even when empty.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Validates a candidate write: it must be an object carrying every required
/// section with a truthy value.
pub fn validate_candidate(value: Value) -> Result<Document, ContentError> {
    let document = Document::from_value(value)?;
    document.validate()?;
    Ok(document)
}
