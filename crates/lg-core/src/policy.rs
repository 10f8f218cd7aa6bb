//! Whitelist / blacklist policy
//!
//! Decision order:
//! 1. any blacklist match denies;
//! 2. a non-empty whitelist allows only URLs that match one of its rules;
//! 3. everything else is allowed (no whitelist, or an empty one).

use std::fmt;

use crate::loader::ResourceLoader;
use crate::matcher::{url_matches, InvalidRuleError};
use crate::types::{Rule, Verdict, VerdictReason};

// =============================================================================
// Configuration
// =============================================================================

/// Which list a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Whitelist,
    Blacklist,
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Whitelist => f.write_str("whitelist"),
            Self::Blacklist => f.write_str("blacklist"),
        }
    }
}

/// Location of a blank rule inside a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlankRule {
    pub list: ListKind,
    pub index: usize,
}

/// Ordered whitelist/blacklist rules.
///
/// `None` means the list is not configured at all, which is different from
/// an empty list: an empty whitelist allows everything, an absent one simply
/// does not take part in the decision.
#[derive(Debug, Clone, Default)]
pub struct PolicyConfig {
    pub whitelist: Option<Vec<Rule>>,
    pub blacklist: Option<Vec<Rule>>,
}

impl PolicyConfig {
    /// The configuration used when a filter is built without one.
    pub fn allow_all() -> Self {
        Self {
            whitelist: Some(Vec::new()),
            blacklist: None,
        }
    }

    pub fn with_whitelist<I, R>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Rule>,
    {
        self.whitelist = Some(rules.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_blacklist<I, R>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Rule>,
    {
        self.blacklist = Some(rules.into_iter().map(Into::into).collect());
        self
    }

    /// Decide whether `url` may be fetched.
    ///
    /// Both lists stop at their first match. A blank rule is only reported
    /// if the scan reaches it.
    pub fn decide(&self, url: &str) -> Result<bool, InvalidRuleError> {
        if let Some(blacklist) = &self.blacklist {
            if let Some(rule) = first_match(url, blacklist)? {
                log::debug!("deny '{url}': blacklisted by {rule}");
                return Ok(false);
            }
        }

        let allowed = match &self.whitelist {
            Some(whitelist) if !whitelist.is_empty() => match first_match(url, whitelist)? {
                Some(rule) => {
                    log::debug!("allow '{url}': whitelisted by {rule}");
                    true
                }
                None => {
                    log::debug!("deny '{url}': not whitelisted");
                    false
                }
            },
            _ => {
                log::debug!("allow '{url}': no whitelist restriction");
                true
            }
        };

        Ok(allowed)
    }

    /// Like [`decide`](Self::decide), but checks every rule in both lists
    /// and reports all matches.
    pub fn explain(&self, url: &str) -> Result<Verdict, InvalidRuleError> {
        let blacklist_matches = all_matches(url, self.blacklist.as_deref())?;
        let whitelist_matches = all_matches(url, self.whitelist.as_deref())?;

        let reason = if !blacklist_matches.is_empty() {
            VerdictReason::Blacklisted
        } else {
            match &self.whitelist {
                Some(whitelist) if !whitelist.is_empty() => {
                    if whitelist_matches.is_empty() {
                        VerdictReason::NotWhitelisted
                    } else {
                        VerdictReason::Whitelisted
                    }
                }
                _ => VerdictReason::AllowAll,
            }
        };

        Ok(Verdict {
            allowed: matches!(reason, VerdictReason::Whitelisted | VerdictReason::AllowAll),
            reason,
            whitelist_matches,
            blacklist_matches,
        })
    }

    /// Every blank rule, whitelist first.
    pub fn blank_rules(&self) -> Vec<BlankRule> {
        let lists = [
            (ListKind::Whitelist, self.whitelist.as_deref()),
            (ListKind::Blacklist, self.blacklist.as_deref()),
        ];

        let mut blanks = Vec::new();
        for (list, rules) in lists {
            for (index, rule) in rules.unwrap_or_default().iter().enumerate() {
                if rule.is_blank() {
                    blanks.push(BlankRule { list, index });
                }
            }
        }
        blanks
    }
}

fn first_match<'r>(url: &str, rules: &'r [Rule]) -> Result<Option<&'r Rule>, InvalidRuleError> {
    for rule in rules {
        if url_matches(url, rule)? {
            return Ok(Some(rule));
        }
    }
    Ok(None)
}

fn all_matches(url: &str, rules: Option<&[Rule]>) -> Result<Vec<usize>, InvalidRuleError> {
    let mut matched = Vec::new();
    for (idx, rule) in rules.unwrap_or_default().iter().enumerate() {
        if url_matches(url, rule)? {
            matched.push(idx);
        }
    }
    Ok(matched)
}

// =============================================================================
// Filter
// =============================================================================

/// A resource loader that only fetches what its policy allows.
pub struct PolicyFilter<L> {
    config: PolicyConfig,
    loader: L,
}

impl<L> PolicyFilter<L> {
    /// Wrap `loader`. Without a configuration every URL is allowed.
    pub fn new(config: Option<PolicyConfig>, loader: L) -> Self {
        Self {
            config: config.unwrap_or_else(PolicyConfig::allow_all),
            loader,
        }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn decide(&self, url: &str) -> Result<bool, InvalidRuleError> {
        self.config.decide(url)
    }
}

impl<L: ResourceLoader> PolicyFilter<L> {
    /// Fetch `url` through the wrapped loader if the policy allows it.
    ///
    /// Returns `Ok(None)` without touching the loader when denied. When
    /// allowed, the loader is called exactly once and its result (which may
    /// itself be `None`) is returned as is.
    pub fn fetch(&self, url: &str, options: &L::Options) -> Result<Option<L::Resource>, InvalidRuleError> {
        if !self.config.decide(url)? {
            return Ok(None);
        }
        Ok(self.loader.fetch(url, options))
    }
}

impl<L: ResourceLoader> ResourceLoader for PolicyFilter<L> {
    type Options = L::Options;
    type Resource = Result<L::Resource, InvalidRuleError>;

    /// Filters can be stacked; an invalid rule surfaces as `Some(Err(..))`.
    fn fetch(&self, url: &str, options: &Self::Options) -> Option<Self::Resource> {
        PolicyFilter::fetch(self, url, options).transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    struct RecordingLoader {
        calls: RefCell<Vec<(String, String)>>,
        decline: bool,
    }

    impl RecordingLoader {
        fn new() -> Self {
            Self { calls: RefCell::new(Vec::new()), decline: false }
        }

        fn declining() -> Self {
            Self { calls: RefCell::new(Vec::new()), decline: true }
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl ResourceLoader for RecordingLoader {
        type Options = String;
        type Resource = String;

        fn fetch(&self, url: &str, options: &String) -> Option<String> {
            self.calls.borrow_mut().push((url.to_string(), options.clone()));
            if self.decline {
                None
            } else {
                Some(format!("body of {url}"))
            }
        }
    }

    fn pattern(source: &str) -> Rule {
        Rule::pattern(source).unwrap()
    }

    #[test]
    fn test_no_config_allows_everything() {
        let filter = PolicyFilter::new(None, RecordingLoader::new());
        for url in ["foo", "https://example.com/a.js", ""] {
            assert_eq!(filter.decide(url), Ok(true));
        }
    }

    #[test]
    fn test_default_config_allows_everything() {
        let config = PolicyConfig::default();
        assert_eq!(config.decide("anything"), Ok(true));
    }

    #[test]
    fn test_empty_whitelist_allows_everything() {
        let config = PolicyConfig::default().with_whitelist(Vec::<Rule>::new());
        assert_eq!(config.decide("foo"), Ok(true));
        assert_eq!(config.decide("bar"), Ok(true));
    }

    #[test]
    fn test_whitelist_only() {
        let config = PolicyConfig::default().with_whitelist([pattern("foo")]);
        assert_eq!(config.decide("foo"), Ok(true));
        assert_eq!(config.decide("bar"), Ok(false));
    }

    #[test]
    fn test_whitelist_checks_later_rules() {
        let config = PolicyConfig::default().with_whitelist(["a", "b", "c"]);
        assert_eq!(config.decide("c"), Ok(true));
        assert_eq!(config.decide("d"), Ok(false));
    }

    #[test]
    fn test_whitelist_and_blacklist() {
        let config = PolicyConfig::default()
            .with_whitelist(["foo"])
            .with_blacklist(["bar"]);
        assert_eq!(config.decide("foo"), Ok(true));
        assert_eq!(config.decide("bar"), Ok(false));
        assert_eq!(config.decide("baz"), Ok(false));
    }

    #[test]
    fn test_blacklist_wins_over_whitelist() {
        let config = PolicyConfig::default()
            .with_whitelist([pattern("foo")])
            .with_blacklist([pattern("foo")]);
        assert_eq!(config.decide("foo"), Ok(false));
    }

    #[test]
    fn test_blacklist_wins_across_rule_kinds() {
        let config = PolicyConfig::default()
            .with_whitelist(["https://ads.example.com/track.js"])
            .with_blacklist([pattern(r"ads\.")]);
        assert_eq!(config.decide("https://ads.example.com/track.js"), Ok(false));
    }

    #[test]
    fn test_blacklist_only() {
        let config = PolicyConfig::default().with_blacklist([pattern("ooba")]);
        assert_eq!(config.decide("foobar"), Ok(false));
        assert_eq!(config.decide("baz"), Ok(true));
    }

    #[test]
    fn test_blacklist_checks_later_rules() {
        let config = PolicyConfig::default().with_blacklist(["blacklist 1", "blacklist 2"]);
        assert_eq!(config.decide("blacklist 2"), Ok(false));
        assert_eq!(config.decide("url"), Ok(true));
    }

    #[test]
    fn test_blank_rule_propagates() {
        let config = PolicyConfig::default().with_whitelist(["foo", ""]);
        assert_eq!(
            config.decide("bar"),
            Err(InvalidRuleError::BlankString { url: "bar".to_string() })
        );

        let config = PolicyConfig::default().with_blacklist([pattern("")]);
        assert_eq!(
            config.decide("bar"),
            Err(InvalidRuleError::BlankPattern { url: "bar".to_string() })
        );
    }

    #[test]
    fn test_blank_rule_not_validated_at_construction() {
        let filter = PolicyFilter::new(
            Some(PolicyConfig::default().with_whitelist([""])),
            RecordingLoader::new(),
        );
        assert_eq!(filter.config().blank_rules().len(), 1);
        assert!(filter.decide("foo").is_err());
    }

    #[test]
    fn test_fetch_returns_loader_result_when_allowed() {
        let filter = PolicyFilter::new(
            Some(PolicyConfig::default().with_whitelist(["foo"])),
            RecordingLoader::new(),
        );

        let actual = filter.fetch("foo", &"referrer".to_string());

        assert_eq!(actual, Ok(Some("body of foo".to_string())));
        assert_eq!(
            *filter.loader().calls.borrow(),
            vec![("foo".to_string(), "referrer".to_string())]
        );
    }

    #[test]
    fn test_fetch_skips_loader_when_denied() {
        let filter = PolicyFilter::new(
            Some(PolicyConfig::default().with_whitelist(["foo"]).with_blacklist(["bar"])),
            RecordingLoader::new(),
        );

        assert_eq!(filter.fetch("bar", &String::new()), Ok(None));
        assert_eq!(filter.fetch("baz", &String::new()), Ok(None));
        assert_eq!(filter.loader().call_count(), 0);
    }

    #[test]
    fn test_fetch_passes_through_declined_loader() {
        let filter = PolicyFilter::new(None, RecordingLoader::declining());

        assert_eq!(filter.fetch("foo", &String::new()), Ok(None));
        assert_eq!(filter.loader().call_count(), 1);
    }

    #[test]
    fn test_fetch_propagates_invalid_rule() {
        let filter = PolicyFilter::new(
            Some(PolicyConfig::default().with_blacklist([""])),
            RecordingLoader::new(),
        );

        assert!(filter.fetch("foo", &String::new()).is_err());
        assert_eq!(filter.loader().call_count(), 0);
    }

    #[test]
    fn test_filters_stack() {
        let inner = PolicyFilter::new(
            Some(PolicyConfig::default().with_blacklist(["inner"])),
            RecordingLoader::new(),
        );
        let outer = PolicyFilter::new(Some(PolicyConfig::default().with_blacklist(["outer"])), &inner);

        assert_eq!(outer.fetch("outer", &String::new()), Ok(None));
        assert_eq!(outer.fetch("inner", &String::new()), Ok(None));
        assert_eq!(outer.fetch("ok", &String::new()), Ok(Some(Ok("body of ok".to_string()))));
        assert_eq!(inner.loader().call_count(), 1);
    }

    #[test]
    fn test_explain_reports_every_match() {
        let config = PolicyConfig::default()
            .with_whitelist([pattern("example"), pattern("nomatch"), pattern(r"\.js$")])
            .with_blacklist([pattern("ads"), pattern("track")]);

        let verdict = config.explain("https://ads.example.com/track.js").unwrap();
        assert!(!verdict.allowed);
        assert_eq!(verdict.reason, VerdictReason::Blacklisted);
        assert_eq!(verdict.whitelist_matches, vec![0, 2]);
        assert_eq!(verdict.blacklist_matches, vec![0, 1]);

        let verdict = config.explain("https://cdn.example.com/lib.js").unwrap();
        assert!(verdict.allowed);
        assert_eq!(verdict.reason, VerdictReason::Whitelisted);

        let verdict = config.explain("https://other.test/").unwrap();
        assert_eq!(verdict.reason, VerdictReason::NotWhitelisted);
    }

    #[test]
    fn test_explain_agrees_with_decide() {
        let configs = [
            PolicyConfig::default(),
            PolicyConfig::allow_all(),
            PolicyConfig::default().with_whitelist(["foo"]).with_blacklist(["bar"]),
            PolicyConfig::default().with_blacklist([pattern("ooba")]),
            PolicyConfig::default().with_whitelist([pattern("foo")]).with_blacklist([pattern("foo")]),
        ];

        for config in &configs {
            for url in ["foo", "bar", "baz", "foobar"] {
                assert_eq!(config.explain(url).unwrap().allowed, config.decide(url).unwrap());
            }
        }
    }

    #[test]
    fn test_explain_reaches_blank_rules_decide_skips() {
        let config = PolicyConfig::default().with_blacklist(["foo", ""]);
        assert_eq!(config.decide("foo"), Ok(false));
        assert!(config.explain("foo").is_err());
    }

    #[test]
    fn test_blank_rules() {
        let config = PolicyConfig::default()
            .with_whitelist([Rule::exact("a"), Rule::exact("")])
            .with_blacklist([pattern("(?:)"), pattern("b")]);

        assert_eq!(
            config.blank_rules(),
            vec![
                BlankRule { list: ListKind::Whitelist, index: 1 },
                BlankRule { list: ListKind::Blacklist, index: 0 },
            ]
        );
    }

    #[test]
    fn test_config_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PolicyConfig>();
        assert_send_sync::<PolicyFilter<()>>();
    }
}
