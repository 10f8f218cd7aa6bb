use lg_core::{PolicyConfig, Rule};
use serde::Deserialize;

/// Error type for rule list and policy parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid pattern /{pattern}/ at {location}: {error}")]
    InvalidPattern {
        location: String,
        pattern: String,
        #[source]
        error: regex::Error,
    },
    #[error("Invalid policy JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a text rule list, one rule per line.
///
/// - blank lines and lines starting with `!`, `#` or `[` are skipped
/// - `/source/` is a pattern rule
/// - anything else is an exact URL
///
/// `//` yields a blank pattern. It is kept so the mistake is reported when
/// the rule is first matched.
pub fn parse_rule_list(text: &str) -> Result<Vec<Rule>, ParseError> {
    let mut rules = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || is_comment_line(line) {
            continue;
        }

        let rule = match parse_pattern_literal(line) {
            Some(source) => compile_pattern(source, || format!("line {}", idx + 1))?,
            None => Rule::exact(line),
        };
        rules.push(rule);
    }

    log::debug!("parsed {} rules", rules.len());
    Ok(rules)
}

/// Parse a JSON policy document.
///
/// ```json
/// {
///   "whitelist": ["https://example.com/app.js", { "pattern": "^https://cdn\\." }],
///   "blacklist": [{ "pattern": "analytics" }]
/// }
/// ```
///
/// Both keys are optional. A missing key leaves that list unconfigured.
pub fn parse_policy_json(text: &str) -> Result<PolicyConfig, ParseError> {
    let document: PolicyDocument = serde_json::from_str(text)?;

    Ok(PolicyConfig {
        whitelist: compile_entries(document.whitelist, "whitelist")?,
        blacklist: compile_entries(document.blacklist, "blacklist")?,
    })
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyDocument {
    whitelist: Option<Vec<RuleEntry>>,
    blacklist: Option<Vec<RuleEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RuleEntry {
    Exact(String),
    Pattern { pattern: String },
}

fn compile_entries(entries: Option<Vec<RuleEntry>>, list: &str) -> Result<Option<Vec<Rule>>, ParseError> {
    let Some(entries) = entries else {
        return Ok(None);
    };

    let mut rules = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.into_iter().enumerate() {
        let rule = match entry {
            RuleEntry::Exact(url) => Rule::Exact(url),
            RuleEntry::Pattern { pattern } => compile_pattern(&pattern, || format!("{list}[{idx}]"))?,
        };
        rules.push(rule);
    }
    Ok(Some(rules))
}

fn compile_pattern(source: &str, location: impl FnOnce() -> String) -> Result<Rule, ParseError> {
    Rule::pattern(source).map_err(|error| ParseError::InvalidPattern {
        location: location(),
        pattern: source.to_string(),
        error,
    })
}

fn parse_pattern_literal(line: &str) -> Option<&str> {
    line.strip_prefix('/')?.strip_suffix('/')
}

fn is_comment_line(line: &str) -> bool {
    line.starts_with('!') || line.starts_with('[') || line.starts_with('#')
}
