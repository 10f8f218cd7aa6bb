//! URL / Rule Matching
//!
//! Every rule check in a policy goes through [`url_matches`].

use crate::types::Rule;

/// A blank rule was matched against a URL.
///
/// Blank rules are almost always configuration mistakes (an empty list entry,
/// an empty regex literal), so they are reported instead of treated as a
/// wildcard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRuleError {
    #[error("Invalid rule: tried to match '{url}' against a blank string")]
    BlankString { url: String },
    #[error("Invalid rule: tried to match '{url}' against a blank pattern")]
    BlankPattern { url: String },
}

/// Check a single URL against a single rule.
///
/// Exact rules compare the whole URL. Pattern rules search anywhere in the
/// URL; anchor with `^`/`$` to compare the whole string.
pub fn url_matches(url: &str, rule: &Rule) -> Result<bool, InvalidRuleError> {
    if rule.is_blank() {
        return Err(match rule {
            Rule::Exact(_) => InvalidRuleError::BlankString { url: url.to_string() },
            Rule::Pattern(_) => InvalidRuleError::BlankPattern { url: url.to_string() },
        });
    }

    let matched = match rule {
        Rule::Exact(expected) => url == expected,
        Rule::Pattern(re) => re.is_match(url),
    };

    if matched {
        log::trace!("'{url}' matched rule {rule}");
    }

    Ok(matched)
}
