//! loadguard CLI
//!
//! CLI tool for checking URLs against a resource policy and fetching the ones
//! it allows.

mod http;
mod policy;

use std::time::Duration;

use clap::{Parser, Subcommand};

use lg_core::{PolicyConfig, PolicyFilter, Rule, Verdict};

use crate::http::{wait_with_timeout, HttpFetchOptions, HttpLoader};
use crate::policy::{load_policy, read_urls, PolicyArgs};

#[derive(Parser)]
#[command(name = "lg-cli")]
#[command(about = "loadguard resource policy tools")]
struct Cli {
    /// Log every decision (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print allow/deny for each URL
    Check {
        #[command(flatten)]
        policy: PolicyArgs,

        /// Check every rule and list the ones that matched
        #[arg(short, long)]
        explain: bool,

        /// URLs to check, or `-` to read them from stdin
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Load a policy and report blank rules
    Validate {
        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Fetch the URLs the policy allows
    Fetch {
        #[command(flatten)]
        policy: PolicyArgs,

        /// Seconds to wait for each response before aborting it
        #[arg(short, long, default_value_t = 30)]
        timeout: u64,

        /// Referer header sent with every request
        #[arg(long)]
        referrer: Option<String>,

        /// Accept header sent with every request
        #[arg(long)]
        accept: Option<String>,

        /// URLs to fetch, or `-` to read them from stdin
        #[arg(required = true)]
        urls: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let result = match cli.command {
        Commands::Check {
            policy,
            explain,
            urls,
        } => cmd_check(&policy, explain, &urls),
        Commands::Validate { policy } => cmd_validate(&policy),
        Commands::Fetch {
            policy,
            timeout,
            referrer,
            accept,
            urls,
        } => cmd_fetch(
            &policy,
            Duration::from_secs(timeout),
            HttpFetchOptions { referrer, accept },
            &urls,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_check(args: &PolicyArgs, explain: bool, urls: &[String]) -> Result<(), String> {
    let config = load_policy(args)?.unwrap_or_else(PolicyConfig::allow_all);
    let urls = read_urls(urls)?;

    for url in &urls {
        if explain {
            let verdict = config.explain(url).map_err(|e| e.to_string())?;
            println!("{}\t{}\t{}", label(verdict.allowed), url, describe(&config, &verdict));
        } else {
            let allowed = config.decide(url).map_err(|e| e.to_string())?;
            println!("{}\t{}", label(allowed), url);
        }
    }

    Ok(())
}

fn cmd_validate(args: &PolicyArgs) -> Result<(), String> {
    let Some(config) = load_policy(args)? else {
        println!("No policy given: every URL is allowed");
        return Ok(());
    };

    println!("Policy:");
    println!("  Whitelist:   {}", list_summary(config.whitelist.as_deref()));
    println!("  Blacklist:   {}", list_summary(config.blacklist.as_deref()));

    let blanks = config.blank_rules();
    if blanks.is_empty() {
        println!("Policy is valid");
        return Ok(());
    }

    for blank in &blanks {
        println!("  {}[{}] is blank", blank.list, blank.index);
    }
    Err(format!("{} blank rule(s) would fail when matched", blanks.len()))
}

fn cmd_fetch(
    args: &PolicyArgs,
    timeout: Duration,
    options: HttpFetchOptions,
    urls: &[String],
) -> Result<(), String> {
    let urls = read_urls(urls)?;
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to start runtime: {}", e))?;
    let filter = PolicyFilter::new(load_policy(args)?, HttpLoader::new(runtime.handle().clone()));

    let mut failures = 0usize;
    for url in &urls {
        let pending = match filter.fetch(url, &options).map_err(|e| e.to_string())? {
            Some(pending) => pending,
            None => {
                println!("skip\t{}", url);
                continue;
            }
        };

        match runtime.block_on(wait_with_timeout(pending, timeout)) {
            Ok(body) => println!("ok\t{}\t{} bytes", url, body.len()),
            Err(e) => {
                println!("fail\t{}\t{}", url, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(format!("{} of {} fetches failed", failures, urls.len()));
    }
    Ok(())
}

fn label(allowed: bool) -> &'static str {
    if allowed {
        "allow"
    } else {
        "deny"
    }
}

fn list_summary(rules: Option<&[Rule]>) -> String {
    match rules {
        None => "not configured".to_string(),
        Some([]) => "empty (allows everything)".to_string(),
        Some(rules) => format!("{} rules", rules.len()),
    }
}

fn describe(config: &PolicyConfig, verdict: &Verdict) -> String {
    let whitelist = matched_rules(config.whitelist.as_deref(), &verdict.whitelist_matches);
    let blacklist = matched_rules(config.blacklist.as_deref(), &verdict.blacklist_matches);
    format!("{:?} whitelist=[{}] blacklist=[{}]", verdict.reason, whitelist, blacklist)
}

fn matched_rules(rules: Option<&[Rule]>, indices: &[usize]) -> String {
    let rules = rules.unwrap_or_default();
    indices
        .iter()
        .filter_map(|&idx| rules.get(idx))
        .map(Rule::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
