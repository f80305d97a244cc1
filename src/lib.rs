//! Outline Engine - live table-of-contents tracking for editor hosts
//!
//! This crate tracks a host's "current document", re-derives its outline
//! once edits settle, and hands rendered outline models to a host-supplied
//! sink. Extraction is pluggable per document type.

pub mod active;
pub mod config;
pub mod documents;
pub mod engine;
pub mod generators;
pub mod heading;
pub mod locale;
pub mod monitor;
pub mod render;
