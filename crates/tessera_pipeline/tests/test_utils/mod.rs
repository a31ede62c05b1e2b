//! Test utilities for pipeline tests.
//!
//! Mock implementations of the collaborator traits and small helpers.

#![allow(dead_code)]

pub mod mocks;

pub use mocks::{Call, CallKind, CommandCall, MemoryStore, MockCommandRunner, MockModelClient, Reply};

use serde_json::Value as JsonValue;
use std::sync::Arc;
use tessera_core::{Row, WorkItem};
use tessera_interface::RuntimeServices;

/// Services over the given mocks.
pub fn services(
    client: Arc<MockModelClient>,
    store: Arc<MemoryStore>,
    commands: Arc<MockCommandRunner>,
) -> RuntimeServices {
    RuntimeServices {
        client,
        store,
        commands,
    }
}

/// Services with a client and default store and command runner.
pub fn services_with(client: Arc<MockModelClient>) -> RuntimeServices {
    services(
        client,
        Arc::new(MemoryStore::default()),
        Arc::new(MockCommandRunner::succeeding()),
    )
}

/// Row from `(column, value)` pairs.
pub fn row(pairs: &[(&str, JsonValue)]) -> Row {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

/// Work item from `(column, value)` pairs.
pub fn item(index: usize, pairs: &[(&str, JsonValue)]) -> WorkItem {
    WorkItem::new(index, row(pairs))
}
