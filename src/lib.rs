//! miniature - git-backed package loader and publisher
//!
//! Packages live as subtrees of ordinary git repositories and are
//! released as `/`-structured tags. This crate maintains a local mirror
//! cache, resolves version requests against tag names, materializes
//! package trees into target directories, and publishes local changes
//! back as commits and release tags.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fsops;
pub mod git;
pub mod loader;
pub mod manifest;
pub mod publisher;
pub mod resolver;
pub mod tags;
pub mod version;

pub use error::{MiniatureError, MiniatureResult};
