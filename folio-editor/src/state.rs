//! Client-side mirror of the content document.
//!
//! Field and list edits go through [`EditorState::update_section`], which
//! marks the section dirty. Whole-section adoption (staging a file, importing
//! a backup) marks sections directly. Lists are addressed by a section name
//! plus a JSON pointer relative to that section.
use folio_common::{Document, KNOWN_SECTIONS};
use serde_json::{Map, Value, json};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EditError {
    #[error("invalid pointer {0:?}")]
    InvalidPointer(String),

    #[error("nothing at {section}{pointer}")]
    Missing { section: String, pointer: String },

    #[error("{section}{pointer} is not a list")]
    NotAList { section: String, pointer: String },

    #[error("index {index} is out of bounds for a list of {len}")]
    OutOfBounds { index: usize, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// A list inside one section, e.g. `timeline` + `/items`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPath {
    pub section: String,
    pub pointer: String,
}

impl ListPath {
    pub fn new(section: impl Into<String>, pointer: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            pointer: pointer.into(),
        }
    }

    pub fn typing_phrases() -> Self {
        Self::new("hero", "/typing_phrases")
    }

    pub fn about_paragraphs() -> Self {
        Self::new("about", "/paragraphs")
    }

    pub fn about_facts() -> Self {
        Self::new("about", "/facts")
    }

    pub fn timeline_items() -> Self {
        Self::new("timeline", "/items")
    }

    pub fn skill_items() -> Self {
        Self::new("skills", "/items")
    }

    pub fn project_items() -> Self {
        Self::new("projects", "/items")
    }

    pub fn project_tags(project: usize) -> Self {
        Self::new("projects", format!("/items/{project}/tags"))
    }

    pub fn project_links(project: usize) -> Self {
        Self::new("projects", format!("/items/{project}/links"))
    }

    pub fn contact_socials() -> Self {
        Self::new("contact", "/socials")
    }

    /// Placeholder entry the dashboard appends for this list.
    pub fn blank_item(&self) -> Value {
        let tail = self.pointer.rsplit('/').next().unwrap_or_default();
        match (self.section.as_str(), tail) {
            ("hero", "typing_phrases") => json!("New phrase"),
            ("about", "paragraphs") => json!("New paragraph..."),
            ("about", "facts") => json!({"emoji": "📌", "label": "Label", "value": "Value"}),
            ("timeline", "items") => {
                json!({"year": "YEAR", "title": "Title", "description": "Description...", "badge": ""})
            }
            ("skills", "items") => json!({"emoji": "🔧", "name": "New Skill"}),
            ("projects", "items") => json!({
                "emoji": "📦",
                "title": "New Project",
                "description": "Description...",
                "tags": [],
                "links": [],
                "featured": false
            }),
            ("projects", "links") => json!({"label": "Link →", "url": "https://"}),
            ("contact", "socials") => {
                json!({"platform": "website", "label": "🌐 My Site", "url": "https://"})
            }
            _ => Value::Object(Map::new()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EditorState {
    mirror: Document,
    // Insertion order, so a batch save walks sections in the order they were touched.
    dirty: Vec<String>,
}

impl EditorState {
    pub fn new(mirror: Document) -> Self {
        Self {
            mirror,
            dirty: Vec::new(),
        }
    }

    pub fn mirror(&self) -> &Document {
        &self.mirror
    }

    pub fn section(&self, name: &str) -> Option<&Value> {
        self.mirror.section(name)
    }

    /// Swaps in a freshly loaded document and forgets every pending edit.
    pub fn replace_mirror(&mut self, mirror: Document) {
        self.mirror = mirror;
        self.dirty.clear();
    }

    /// Adopts `document` as the mirror, marking dirty every section whose
    /// value differs from the current mirror (including removed ones).
    /// Returns how many sections changed.
    pub fn stage_document(&mut self, document: Document) -> usize {
        let mut changed: Vec<String> = document
            .section_names()
            .filter(|name| self.mirror.section(name) != document.section(name))
            .map(str::to_string)
            .collect();
        changed.extend(
            self.mirror
                .section_names()
                .filter(|name| document.section(name).is_none())
                .map(str::to_string),
        );

        self.mirror = document;
        for name in &changed {
            self.mark_dirty(name);
        }
        changed.len()
    }

    /// Merges a backup into the mirror. Every known section whose value is an
    /// object replaces the mirror's copy and is marked dirty. Other entries
    /// are skipped and sections absent from the backup are left alone.
    /// Sections are taken in dashboard order. Returns how many were taken.
    pub fn import_sections(&mut self, backup: Document) -> usize {
        let mut imported = 0;
        for name in KNOWN_SECTIONS {
            let Some(value) = backup.section(name).filter(|value| value.is_object()) else {
                continue;
            };
            self.mirror.insert_section(name, value.clone());
            self.mark_dirty(name);
            imported += 1;
        }
        imported
    }

    pub fn is_dirty(&self, section: &str) -> bool {
        self.dirty.iter().any(|name| name == section)
    }

    pub fn dirty_sections(&self) -> &[String] {
        &self.dirty
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn mark_dirty(&mut self, section: &str) {
        if !self.is_dirty(section) {
            self.dirty.push(section.to_string());
        }
    }

    pub fn mark_clean(&mut self, section: &str) {
        self.dirty.retain(|name| name != section);
    }

    /// Applies `edit` to a section (created as an empty object if absent) and
    /// marks it dirty when the edit succeeds.
    pub fn update_section<T>(
        &mut self,
        section: &str,
        edit: impl FnOnce(&mut Value) -> Result<T, EditError>,
    ) -> Result<T, EditError> {
        let existed = self.mirror.section(section).is_some();
        match edit(self.mirror.section_or_insert(section)) {
            Ok(result) => {
                self.mark_dirty(section);
                Ok(result)
            }
            Err(e) => {
                if !existed {
                    self.mirror.remove_section(section);
                }
                Err(e)
            }
        }
    }

    /// Sets the value at `pointer` inside `section`, creating intermediate
    /// objects. An empty pointer replaces the whole section.
    pub fn set_field(&mut self, section: &str, pointer: &str, value: Value) -> Result<(), EditError> {
        let tokens = parse_pointer(pointer)?;
        self.update_section(section, |root| {
            let slot = walk_creating(root, &tokens).ok_or_else(|| EditError::Missing {
                section: section.to_string(),
                pointer: pointer.to_string(),
            })?;
            *slot = value;
            Ok(())
        })
    }

    /// Appends to a list, creating it when absent. Returns the new index.
    pub fn push_item(&mut self, list: &ListPath, item: Value) -> Result<usize, EditError> {
        let tokens = parse_pointer(&list.pointer)?;
        self.update_section(&list.section, |root| {
            let slot = walk_creating(root, &tokens).ok_or_else(|| missing(list))?;
            if slot.is_null() {
                *slot = Value::Array(Vec::new());
            }
            let items = slot.as_array_mut().ok_or_else(|| not_a_list(list))?;
            items.push(item);
            Ok(items.len() - 1)
        })
    }

    pub fn push_blank(&mut self, list: &ListPath) -> Result<usize, EditError> {
        self.push_item(list, list.blank_item())
    }

    pub fn remove_item(&mut self, list: &ListPath, index: usize) -> Result<Value, EditError> {
        self.check_index(list, index)?;
        self.update_section(&list.section, |root| {
            let items = list_mut(root, list)?;
            Ok(items.remove(index))
        })
    }

    /// Swaps an item with its neighbour. Moving the first item up or the last
    /// item down does nothing and leaves the section clean.
    pub fn move_item(&mut self, list: &ListPath, index: usize, direction: Direction) -> Result<bool, EditError> {
        let len = self.check_index(list, index)?;
        let target = match direction {
            Direction::Up if index > 0 => index - 1,
            Direction::Down if index + 1 < len => index + 1,
            _ => return Ok(false),
        };

        self.update_section(&list.section, |root| {
            list_mut(root, list)?.swap(index, target);
            Ok(true)
        })
    }

    /// Adds a project tag. Blank tags are ignored.
    pub fn add_tag(&mut self, project: usize, tag: &str) -> Result<bool, EditError> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Ok(false);
        }
        self.check_index(&ListPath::project_items(), project)?;
        self.push_item(&ListPath::project_tags(project), Value::String(tag.to_string()))?;
        Ok(true)
    }

    pub fn list(&self, list: &ListPath) -> Option<&Vec<Value>> {
        self.mirror
            .section(&list.section)?
            .pointer(&list.pointer)?
            .as_array()
    }

    fn check_index(&self, list: &ListPath, index: usize) -> Result<usize, EditError> {
        let len = self.list(list).ok_or_else(|| not_a_list(list))?.len();
        if index < len {
            Ok(len)
        } else {
            Err(EditError::OutOfBounds { index, len })
        }
    }
}

fn missing(list: &ListPath) -> EditError {
    EditError::Missing {
        section: list.section.clone(),
        pointer: list.pointer.clone(),
    }
}

fn not_a_list(list: &ListPath) -> EditError {
    EditError::NotAList {
        section: list.section.clone(),
        pointer: list.pointer.clone(),
    }
}

fn list_mut<'a>(root: &'a mut Value, list: &ListPath) -> Result<&'a mut Vec<Value>, EditError> {
    root.pointer_mut(&list.pointer)
        .and_then(Value::as_array_mut)
        .ok_or_else(|| not_a_list(list))
}

fn parse_pointer(pointer: &str) -> Result<Vec<String>, EditError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let rest = pointer
        .strip_prefix('/')
        .ok_or_else(|| EditError::InvalidPointer(pointer.to_string()))?;
    Ok(rest
        .split('/')
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .collect())
}

/// Follows `tokens` from `root`, turning nulls into objects on the way.
/// Array steps must name an existing index.
fn walk_creating<'a>(root: &'a mut Value, tokens: &[String]) -> Option<&'a mut Value> {
    let mut current = root;
    for token in tokens {
        if current.is_null() {
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Object(map) => map.entry(token.clone()).or_insert(Value::Null),
            Value::Array(items) => items.get_mut(token.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
