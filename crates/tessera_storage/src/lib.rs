//! Artifact persistence for Tessera.
//!
//! Provides the filesystem implementation of
//! [`ArtifactStore`](tessera_interface::ArtifactStore).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod filesystem;

pub use filesystem::FileSystemArtifactStore;
