//! Core data types for the Tessera generation pipeline.
//!
//! This crate provides the data model shared by every other crate: work items and
//! the packets that flow into them, output strategies, conversation messages,
//! generated artifacts and the placeholder renderer used for prompts and paths.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod artifact;
mod content;
mod generation;
mod media;
mod message;
mod packet;
mod role;
mod strategy;
mod template;
mod work_item;

pub use artifact::{Artifact, ArtifactContent, ArtifactKind, AudioPayload, RawResponse};
pub use content::ContentPart;
pub use generation::GenerationResult;
pub use media::MediaSource;
pub use message::{Message, MessageBuilder};
pub use packet::Packet;
pub use role::Role;
pub use strategy::{OutputMode, OutputStrategy, OutputStrategyBuilder};
pub use template::{lookup, render, render_value};
pub use work_item::{Row, WorkItem};
