//! except CLI: driving adapter for exception rule sets.
//!
//! Subcommands:
//! - `eval <config> --path <path> [--method M] [--header k=v...] [--query k=v...] [--trace]`
//! - `check <config>`: validate that a config loads
//! - `info`: print registered predicate type URLs

use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use except::{PredicateRegistry, RuleSet, RuleSetConfig};
use except_http::HttpRequest;
use futures::executor::block_on;
use tracing_subscriber::{fmt, EnvFilter};

/// Validate and evaluate exception rule sets.
#[derive(Parser, Debug)]
#[command(name = "except", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a config against a request.
    Eval(EvalArgs),
    /// Validate that a config loads.
    Check {
        /// Rule set config (.yaml, .yml or .json).
        config: PathBuf,
    },
    /// Print registered predicate type URLs.
    Info,
}

#[derive(Args, Debug)]
struct EvalArgs {
    /// Rule set config (.yaml, .yml or .json).
    config: PathBuf,

    /// Request method.
    #[arg(long, short, default_value = "GET")]
    method: String,

    /// Request path; may carry a `?query` suffix.
    #[arg(long, short)]
    path: String,

    /// Request header, repeatable.
    #[arg(long = "header", short = 'H', value_name = "NAME=VALUE", value_parser = parse_pair)]
    headers: Vec<(String, String)>,

    /// Query parameter, repeatable.
    #[arg(long = "query", short, value_name = "NAME=VALUE", value_parser = parse_pair)]
    query: Vec<(String, String)>,

    /// Print each evaluated rule.
    #[arg(long)]
    trace: bool,
}

fn main() {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Eval(args) => cmd_eval(&args),
        Command::Check { config } => cmd_check(&config),
        Command::Info => {
            cmd_info();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_eval(args: &EvalArgs) -> Result<(), String> {
    let rules = load_rule_set(&args.config)?;
    let req = build_request(args);

    if args.trace {
        let trace = block_on(rules.evaluate_with_trace(&req, &())).map_err(|e| e.to_string())?;
        print!("{trace}");
    } else {
        let excepted = block_on(rules.evaluate(&req, &())).map_err(|e| e.to_string())?;
        println!("{}", if excepted { "excepted" } else { "not excepted" });
    }

    Ok(())
}

fn cmd_check(path: &Path) -> Result<(), String> {
    let rules = load_rule_set(path)?;
    println!("Config valid ({} rules)", rules.len());
    Ok(())
}

fn cmd_info() {
    println!("Registered predicates:");
    for url in build_registry().type_urls() {
        println!("  {url}");
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry assembly (composition root)
// ═══════════════════════════════════════════════════════════════════════════════

fn build_registry() -> PredicateRegistry<HttpRequest> {
    except_test::registry()
}

fn build_request(args: &EvalArgs) -> HttpRequest {
    let mut builder = HttpRequest::builder().method(&args.method).path(&args.path);
    for (name, value) in &args.headers {
        builder = builder.header(name, value);
    }
    for (name, value) in &args.query {
        builder = builder.query_param(name, value);
    }
    builder.build()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Config loading
// ═══════════════════════════════════════════════════════════════════════════════

fn load_rule_set(path: &Path) -> Result<RuleSet<HttpRequest>, String> {
    let config = load_config(path)?;
    tracing::debug!(path = %path.display(), rules = config.rules.len(), "loaded rule set config");

    build_registry()
        .load_rule_set(config)
        .map_err(|e| format!("config invalid: {e}"))
}

fn load_config(path: &Path) -> Result<RuleSetConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read \"{}\": {e}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content).map_err(|e| format!("JSON parse error: {e}"))
    } else {
        // Default to YAML (handles .yaml and .yml)
        serde_yaml::from_str(&content).map_err(|e| format!("YAML parse error: {e}"))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Argument parsing
// ═══════════════════════════════════════════════════════════════════════════════

fn parse_pair(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid pair \"{s}\", expected key=value"))?;
    if key.is_empty() {
        return Err(format!("invalid pair \"{s}\", key must not be empty"));
    }
    Ok((key.to_owned(), value.to_owned()))
}
