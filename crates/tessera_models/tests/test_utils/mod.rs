//! Test utilities for model client tests.

#![allow(dead_code)]

pub mod mock_client;
pub mod mock_server;

pub use mock_client::{Outcome, ScriptedClient};
pub use mock_server::{MockServer, RecordedRequest};
