//! The unit of state flowing through a pipeline.

use crate::{ContentPart, Message};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Ordered column → value mapping; the exported state of a work item.
pub type Row = IndexMap<String, JsonValue>;

/// One in-flight unit of work: a source row plus everything the pipeline has
/// accumulated for it so far.
///
/// Work items are never mutated in place by the flow controller: every step clones
/// the item before writing, so sibling branches of an explosion never observe each
/// other's changes. `original_index` has no mutator and identifies the source row for
/// the lifetime of the lineage.
///
/// # Examples
///
/// ```
/// use tessera_core::{Row, WorkItem};
/// use serde_json::json;
///
/// let mut row = Row::new();
/// row.insert("industry".to_string(), json!("Kletterhalle"));
///
/// let item = WorkItem::new(7, row);
/// assert_eq!(*item.original_index(), 7);
/// assert_eq!(*item.variation_index(), None);
/// assert_eq!(item.template_context()["industry"], json!("Kletterhalle"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct WorkItem {
    /// Persistent, exportable column values.
    row: Row,
    /// Namespace → most recent value produced under it.
    workspace: IndexMap<String, JsonValue>,
    /// Raw results of prior steps, in step order.
    step_history: Vec<JsonValue>,
    /// Conversation turns replayed into later model calls.
    history: Vec<Message>,
    /// Fragments contributed by plugins for the next model call.
    accumulated_content: Vec<ContentPart>,
    /// Index of the source row.
    original_index: usize,
    /// Explosion branch, if this lineage was exploded.
    variation_index: Option<usize>,
}

impl WorkItem {
    /// Create the initial work item for an ingested row.
    pub fn new(original_index: usize, row: Row) -> Self {
        Self {
            row,
            workspace: IndexMap::new(),
            step_history: Vec::new(),
            history: Vec::new(),
            accumulated_content: Vec::new(),
            original_index,
            variation_index: None,
        }
    }

    /// Same item tagged with an explosion branch.
    pub fn with_variation_index(mut self, variation_index: usize) -> Self {
        self.variation_index = Some(variation_index);
        self
    }

    /// Assign a single column.
    pub fn set_column(&mut self, column: impl Into<String>, value: JsonValue) {
        self.row.insert(column.into(), value);
    }

    /// Shallow-merge the fields of an object into the row.
    pub fn merge_fields(&mut self, fields: &Map<String, JsonValue>) {
        for (key, value) in fields {
            self.row.insert(key.clone(), value.clone());
        }
    }

    /// Record the latest value produced under a namespace.
    pub fn set_workspace(&mut self, namespace: impl Into<String>, value: JsonValue) {
        self.workspace.insert(namespace.into(), value);
    }

    /// Append plugin fragments for the next model call.
    pub fn append_content<I>(&mut self, parts: I)
    where
        I: IntoIterator<Item = ContentPart>,
    {
        self.accumulated_content.extend(parts);
    }

    /// Drop fragments once a model call has consumed them.
    pub fn clear_content(&mut self) {
        self.accumulated_content.clear();
    }

    /// Append conversation turns.
    pub fn extend_history<I>(&mut self, messages: I)
    where
        I: IntoIterator<Item = Message>,
    {
        self.history.extend(messages);
    }

    /// Record a step's raw result.
    pub fn push_step_result(&mut self, value: JsonValue) {
        self.step_history.push(value);
    }

    /// Context visible to templates.
    ///
    /// Row columns are spread at the top level, followed by workspace namespaces that
    /// do not collide with a column. The full row, workspace and step history are also
    /// available as `row`, `workspace` and `steps`, and the lineage identity as
    /// `index` and `variation`.
    pub fn template_context(&self) -> JsonValue {
        let mut context = Map::new();
        for (key, value) in &self.row {
            context.insert(key.clone(), value.clone());
        }
        for (key, value) in &self.workspace {
            if !self.row.contains_key(key) {
                context.insert(key.clone(), value.clone());
            }
        }
        context.insert("row".to_string(), to_object(&self.row));
        context.insert("workspace".to_string(), to_object(&self.workspace));
        context.insert(
            "steps".to_string(),
            JsonValue::Array(self.step_history.clone()),
        );
        context.insert("index".to_string(), JsonValue::from(self.original_index));
        context.insert(
            "variation".to_string(),
            self.variation_index
                .map(JsonValue::from)
                .unwrap_or(JsonValue::Null),
        );
        JsonValue::Object(context)
    }
}

fn to_object(map: &IndexMap<String, JsonValue>) -> JsonValue {
    JsonValue::Object(
        map.iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    )
}
