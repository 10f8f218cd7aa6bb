//! Core type definitions for loadguard
//!
//! Rules are what a policy is made of; verdicts are what `explain` reports
//! back about a single URL.

use std::fmt;

use regex::Regex;

// =============================================================================
// Rules
// =============================================================================

/// Source of the pattern produced by compiling an empty expression.
const EMPTY_GROUP: &str = "(?:)";

/// Discriminant of a [`Rule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// Exact string comparison
    Exact,
    /// Regular expression search
    Pattern,
}

/// A single allow/deny criterion.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Matches a URL equal to this string.
    Exact(String),
    /// Matches a URL containing a match of this expression (unanchored).
    Pattern(Regex),
}

impl Rule {
    /// Build an exact-match rule.
    pub fn exact(url: impl Into<String>) -> Self {
        Self::Exact(url.into())
    }

    /// Compile a pattern rule.
    ///
    /// A blank source compiles fine; it is only rejected when matched.
    pub fn pattern(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Self::Pattern)
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            Self::Exact(_) => RuleKind::Exact,
            Self::Pattern(_) => RuleKind::Pattern,
        }
    }

    /// True for an empty string or a pattern with no content.
    ///
    /// `(?:)` counts as blank: it is what an empty expression serializes to
    /// in engines that store patterns as source text.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Exact(url) => url.is_empty(),
            Self::Pattern(re) => {
                let source = re.as_str();
                source.is_empty() || source == EMPTY_GROUP
            }
        }
    }
}

impl From<&str> for Rule {
    fn from(url: &str) -> Self {
        Self::Exact(url.to_string())
    }
}

impl From<String> for Rule {
    fn from(url: String) -> Self {
        Self::Exact(url)
    }
}

impl From<Regex> for Rule {
    fn from(re: Regex) -> Self {
        Self::Pattern(re)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(url) => write!(f, "{url}"),
            Self::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

// =============================================================================
// Verdicts
// =============================================================================

/// Why a URL was allowed or denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictReason {
    /// A blacklist rule matched (wins over any whitelist match)
    Blacklisted,
    /// A whitelist rule matched and no blacklist rule did
    Whitelisted,
    /// A non-empty whitelist is configured and nothing in it matched
    NotWhitelisted,
    /// No whitelist, or an empty one, and no blacklist match
    AllowAll,
}

/// Full diagnostic result for one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub allowed: bool,
    pub reason: VerdictReason,
    /// Indices into the whitelist of every rule that matched
    pub whitelist_matches: Vec<usize>,
    /// Indices into the blacklist of every rule that matched
    pub blacklist_matches: Vec<usize>,
}
