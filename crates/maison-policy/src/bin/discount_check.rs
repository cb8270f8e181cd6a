//! # discount-check
//!
//! Runs the discount rules against JSON requests from the command line.
//!
//! ## Usage
//! ```bash
//! # Validate a draft discount (exit code 1 when invalid)
//! cargo run -p maison-policy --bin discount-check -- validate draft.json
//!
//! # Stack candidates against a base amount, optionally checking a tier
//! cargo run -p maison-policy --bin discount-check -- stack order.json --tier gold
//!
//! # Print the effective policy as TOML
//! cargo run -p maison-policy --bin discount-check -- --policy ./policy.toml show
//! ```
//!
//! Requests are read from stdin when no file is given.

use std::env;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use maison_core::engine::{check_customer_tier, stack_discounts, validate_discount_config};
use maison_core::{CustomerTier, DiscountConfig, DiscountPolicy, StackedDiscountRequest};
use maison_policy::{load_policy, PolicyFile};
use tracing::info;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Parsed command line.
#[derive(Debug, Default, PartialEq)]
struct Args {
    policy_path: Option<PathBuf>,
    tier: Option<CustomerTier>,
    command: Option<String>,
    input: Option<PathBuf>,
    help: bool,
}

/// Parses `args` (without the program name). `Err` carries the message
/// shown above the usage text.
fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut positional: Vec<&String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--policy" | "-p" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| format!("{} needs a path", args[i]))?;
                parsed.policy_path = Some(PathBuf::from(value));
                i += 1;
            }
            "--tier" | "-t" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| format!("{} needs a tier name", args[i]))?;
                parsed.tier = Some(CustomerTier::from_str(value).map_err(|e| e.to_string())?);
                i += 1;
            }
            "--help" | "-h" => parsed.help = true,
            _ => positional.push(&args[i]),
        }
        i += 1;
    }

    parsed.command = positional.first().map(|c| c.to_string());
    parsed.input = positional.get(1).map(|p| PathBuf::from(p.as_str()));
    Ok(parsed)
}

fn main() -> CliResult<ExitCode> {
    init_tracing();

    let raw: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            print_usage();
            return Ok(ExitCode::from(2));
        }
    };

    if args.help {
        print_usage();
        return Ok(ExitCode::SUCCESS);
    }
    let Some(command) = args.command else {
        print_usage();
        return Ok(ExitCode::from(2));
    };

    let policy = load_policy(args.policy_path)?;

    match command.as_str() {
        "validate" => validate(&policy, args.input),
        "stack" => stack(&policy, args.input, args.tier),
        "show" => {
            print!("{}", toml::to_string_pretty(&PolicyFile::from(&policy))?);
            Ok(ExitCode::SUCCESS)
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            Ok(ExitCode::from(2))
        }
    }
}

fn validate(policy: &DiscountPolicy, input: Option<PathBuf>) -> CliResult<ExitCode> {
    let config: DiscountConfig = serde_json::from_str(&read_input(input)?)?;
    let report = validate_discount_config(&config, policy).report();

    info!(id = %config.id, valid = report.is_valid, "Validated discount");
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(if report.is_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn stack(
    policy: &DiscountPolicy,
    input: Option<PathBuf>,
    tier: Option<CustomerTier>,
) -> CliResult<ExitCode> {
    let request: StackedDiscountRequest = serde_json::from_str(&read_input(input)?)?;
    let result = stack_discounts(&request, policy);
    println!("{}", serde_json::to_string_pretty(&result)?);

    if let Some(tier) = tier {
        let violations =
            check_customer_tier(tier, &request.candidates, request.base_amount, policy);
        for violation in &violations {
            eprintln!("{}", violation);
        }
        if !violations.is_empty() {
            return Ok(ExitCode::FAILURE);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn read_input(path: Option<PathBuf>) -> CliResult<String> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn print_usage() {
    println!("Maison discount checker");
    println!();
    println!("Usage: discount-check [OPTIONS] <validate|stack|show> [REQUEST.json]");
    println!();
    println!("Options:");
    println!("  -p, --policy <PATH>  Policy file (default: $MAISON_POLICY_PATH or platform config)");
    println!("  -t, --tier <TIER>    Check stacked result against a customer tier");
    println!("  -h, --help           Show this help message");
}

/// Logs go to stderr so JSON output on stdout stays parseable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,maison=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_full_command_line() {
        let parsed =
            parse_args(&args(&["--policy", "p.toml", "stack", "order.json", "-t", "GOLD"])).unwrap();

        assert_eq!(parsed.policy_path, Some(PathBuf::from("p.toml")));
        assert_eq!(parsed.tier, Some(CustomerTier::Gold));
        assert_eq!(parsed.command.as_deref(), Some("stack"));
        assert_eq!(parsed.input, Some(PathBuf::from("order.json")));
        assert!(!parsed.help);
    }

    #[test]
    fn test_flag_without_value_is_rejected() {
        let err = parse_args(&args(&["show", "--policy"])).unwrap_err();
        assert_eq!(err, "--policy needs a path");

        let err = parse_args(&args(&["stack", "order.json", "-t"])).unwrap_err();
        assert_eq!(err, "-t needs a tier name");
    }

    #[test]
    fn test_unknown_tier_is_rejected() {
        let err = parse_args(&args(&["stack", "--tier", "diamond"])).unwrap_err();
        assert!(err.starts_with("customer tier must be one of"));
    }

    #[test]
    fn test_help_and_empty() {
        assert!(parse_args(&args(&["-h"])).unwrap().help);
        assert_eq!(parse_args(&[]).unwrap(), Args::default());
    }
}
