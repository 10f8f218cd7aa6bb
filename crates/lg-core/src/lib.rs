//! loadguard Core Library
//!
//! This crate decides whether a document engine should fetch a sub-resource
//! (script, image, iframe, ...) it found while loading a page.
//!
//! # Architecture
//!
//! A [`PolicyConfig`] holds an optional whitelist and an optional blacklist of
//! [`Rule`]s. Each rule is either an exact URL or a regular expression. The
//! blacklist always wins over the whitelist, and an empty whitelist allows
//! everything. Rules are checked lazily: a blank rule is only reported when
//! a URL is actually matched against it.
//!
//! [`PolicyFilter`] wraps a [`ResourceLoader`] (the engine's own fetcher) and
//! only forwards requests the policy allows.
//!
//! # Modules
//!
//! - `types`: Rules and verdicts
//! - `matcher`: Single URL / single rule matching
//! - `policy`: Whitelist/blacklist decision and the filtering loader
//! - `loader`: The resource loader seam

pub mod loader;
pub mod matcher;
pub mod policy;
pub mod types;

// Re-export commonly used types
pub use loader::ResourceLoader;
pub use matcher::{url_matches, InvalidRuleError};
pub use policy::{BlankRule, ListKind, PolicyConfig, PolicyFilter};
pub use types::{Rule, RuleKind, Verdict, VerdictReason};
