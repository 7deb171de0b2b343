//! weave CLI: converts Ingress manifests into Gateway API `HTTPRoute`s.
//!
//! Subcommands:
//! - `convert <file> [--config <file>] [--output yaml|json]`: print merged routes
//! - `check <file> [--config <file>]`: report field errors only
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use std::process;

use tracing_subscriber::EnvFilter;
use weave_ingress::{Conversion, ConvertOptions, Converter, Manifest};

fn main() {
    init_logging();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "convert" => cmd_convert(&args[2..]),
        "check" => cmd_check(&args[2..]),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("error: unknown command \"{other}\"");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_convert(args: &[String]) -> Result<(), String> {
    let args = parse_args(args, true)?;
    let conversion = run(&args)?;

    let rendered = render(&conversion, args.output)?;
    print!("{rendered}");

    report(&conversion, true)
}

fn cmd_check(args: &[String]) -> Result<(), String> {
    let args = parse_args(args, false)?;
    let conversion = run(&args)?;

    if conversion.is_clean() {
        println!("{} route(s), no field errors", conversion.routes.len());
    }
    report(&conversion, false)
}

fn run(args: &Args) -> Result<Conversion, String> {
    let options = match &args.config {
        Some(path) => load_config(path)?,
        None => ConvertOptions::default(),
    };
    let converter = Converter::new(options);
    let store = converter.load(&args.input).map_err(|e| e.to_string())?;
    Ok(converter.convert(&store))
}

/// Print every field error; fail when there were any.
fn report(conversion: &Conversion, to_stderr: bool) -> Result<(), String> {
    for err in &conversion.errors {
        if to_stderr {
            eprintln!("{err}");
        } else {
            println!("{err}");
        }
    }
    if conversion.is_clean() {
        Ok(())
    } else {
        Err(format!("{} field error(s) reported", conversion.errors.len()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Output
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Json,
}

impl Format {
    fn parse(s: &str) -> Result<Self, String> {
        match s {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format \"{other}\", expected yaml or json")),
        }
    }
}

fn render(conversion: &Conversion, format: Format) -> Result<String, String> {
    let manifests: Vec<Manifest<'_>> = conversion.manifests().collect();
    match format {
        Format::Yaml => {
            let mut out = String::new();
            for manifest in &manifests {
                out.push_str("---\n");
                out.push_str(
                    &serde_yaml::to_string(manifest).map_err(|e| format!("YAML encode error: {e}"))?,
                );
            }
            Ok(out)
        }
        Format::Json => serde_json::to_string_pretty(&manifests)
            .map(|s| s + "\n")
            .map_err(|e| format!("JSON encode error: {e}")),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Config loading
// ═══════════════════════════════════════════════════════════════════════════════

fn load_config(path: &str) -> Result<ConvertOptions, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("failed to read \"{path}\": {e}"))?;

    let is_json = std::path::Path::new(path)
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

#[derive(Debug, PartialEq, Eq)]
struct Args {
    input: String,
    config: Option<String>,
    output: Format,
}

fn parse_args(args: &[String], allow_output: bool) -> Result<Args, String> {
    let mut input = None;
    let mut config = None;
    let mut output = Format::Yaml;
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                config = Some(args.get(i).ok_or("--config requires a file path")?.clone());
            }
            "--output" | "-o" if allow_output => {
                i += 1;
                output = Format::parse(args.get(i).ok_or("--output requires a format")?)?;
            }
            flag if flag.starts_with('-') => {
                return Err(format!("unexpected argument \"{flag}\""));
            }
            path if input.is_none() => input = Some(path.to_owned()),
            extra => return Err(format!("unexpected argument \"{extra}\"")),
        }
        i += 1;
    }

    Ok(Args {
        input: input.ok_or("an Ingress manifest path is required")?,
        config,
        output,
    })
}

fn print_usage() {
    eprintln!(
        "Usage: weave <command> [options]

Commands:
  convert <file> [--config <file>] [--output yaml|json]   Print merged HTTPRoutes
  check <file> [--config <file>]                          Report field errors only
  help                                                    Show this help

Environment:
  RUST_LOG   log filter (default: warn)"
    );
}
