//! loadguard Rule List Compiler
//!
//! This crate compiles text rule lists and JSON policy files into a
//! [`lg_core::PolicyConfig`].

pub mod parser;

pub use parser::{parse_policy_json, parse_rule_list, ParseError};
