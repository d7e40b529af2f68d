// ABOUTME: Extraction pipeline: rule model, compiled definitions, selector resolution,
// ABOUTME: content mutation, generic fallbacks and the root orchestrator.

//! Extraction module.
//!
//! Submodules:
//! - `custom`: rule-file serde model.
//! - `definition`: validated definitions and the domain registry.
//! - `compiled`: selector compilation cache.
//! - `select`: selector and field resolution.
//! - `content`: transforms and clean lists applied to matched regions.
//! - `generic`: rule-free strategies used as fallback.
//! - `root`: per-document orchestration.
//! - `loader`: rule files and the builtin registry.

pub mod compiled;
pub mod content;
pub mod custom;
pub mod definition;
pub mod generic;
pub mod loader;
pub mod root;
pub mod select;
