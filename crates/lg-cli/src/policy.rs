use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use clap::Args;

use lg_compiler::{parse_policy_json, parse_rule_list};
use lg_core::{PolicyConfig, Rule};

#[derive(Debug, Args)]
pub struct PolicyArgs {
    /// JSON policy file with optional "whitelist" / "blacklist" arrays
    #[arg(short, long)]
    pub policy: Option<PathBuf>,

    /// Whitelist rule list, one rule per line (replaces the policy's whitelist)
    #[arg(short, long)]
    pub whitelist: Option<PathBuf>,

    /// Blacklist rule list, one rule per line (replaces the policy's blacklist)
    #[arg(short, long)]
    pub blacklist: Option<PathBuf>,
}

/// Load the policy described by the command line.
///
/// `None` when no file was given at all; the filter then allows everything.
pub fn load_policy(args: &PolicyArgs) -> Result<Option<PolicyConfig>, String> {
    let policy = match &args.policy {
        Some(path) => {
            let text = read_text(path)?;
            let config = parse_policy_json(&text)
                .map_err(|e| format!("Invalid policy '{}': {}", path.display(), e))?;
            Some(config)
        }
        None => None,
    };

    let whitelist = args.whitelist.as_deref().map(load_rule_list).transpose()?;
    let blacklist = args.blacklist.as_deref().map(load_rule_list).transpose()?;

    Ok(merge_policy(policy, whitelist, blacklist))
}

/// Apply rule-list overrides on top of a policy file.
pub fn merge_policy(
    policy: Option<PolicyConfig>,
    whitelist: Option<Vec<Rule>>,
    blacklist: Option<Vec<Rule>>,
) -> Option<PolicyConfig> {
    if policy.is_none() && whitelist.is_none() && blacklist.is_none() {
        return None;
    }

    let mut config = policy.unwrap_or_default();
    if whitelist.is_some() {
        config.whitelist = whitelist;
    }
    if blacklist.is_some() {
        config.blacklist = blacklist;
    }
    Some(config)
}

fn load_rule_list(path: &Path) -> Result<Vec<Rule>, String> {
    let text = read_text(path)?;
    parse_rule_list(&text).map_err(|e| format!("Invalid rule list '{}': {}", path.display(), e))
}

fn read_text(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path.display(), e))
}

/// URLs from the command line, or from stdin when the only argument is `-`.
pub fn read_urls(args: &[String]) -> Result<Vec<String>, String> {
    if args.len() != 1 || args[0] != "-" {
        return Ok(args.to_vec());
    }

    let mut urls = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line.map_err(|e| format!("Failed to read stdin: {}", e))?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            urls.push(trimmed.to_string());
        }
    }
    Ok(urls)
}
