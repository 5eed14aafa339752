//! oasprey CLI - check recorded HTTP interactions against an OpenAPI contract

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use oasprey_core::{Config, Finding, VerdictPolicy, VerdictStatus, normalize};
use oasprey_validator::{ApiSpec, OpenApiSpec, load_spec, satisfy_schema_in_api_spec};

#[derive(Parser)]
#[command(name = "oasprey")]
#[command(about = "Check recorded HTTP interactions against an OpenAPI contract")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Verbose output (debug logs on stderr)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check recorded responses against the API spec
    Check {
        /// Recorded interactions (JSON array or JSON Lines); default from config
        interactions: Option<PathBuf>,

        /// OpenAPI document (overrides config)
        #[arg(short, long)]
        spec: Option<PathBuf>,

        /// Config file (default: .oasprey.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Check a value against a named schema of the API spec
    Schema {
        /// Schema name under `definitions` or `components.schemas`
        name: String,

        /// JSON or YAML file holding the value
        object: PathBuf,

        /// OpenAPI document (overrides config)
        #[arg(short, long)]
        spec: Option<PathBuf>,

        /// Config file (default: .oasprey.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Initialize config file
    Init,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "oasprey=debug"
    } else {
        "oasprey=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let cfg = match path {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    Ok(cfg)
}

fn load_api_spec(path: &Path) -> Result<ApiSpec> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("cannot resolve {}", path.display()))?;
    let spec = load_spec(absolute)?;
    tracing::info!(spec = %path.display(), version = spec.version(), "loaded API spec");
    Ok(spec)
}

/// Read recorded interactions: a JSON array, or one JSON object per line.
fn read_interactions(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read interactions from {}", path.display()))?;

    if content.trim_start().starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON array in {}", path.display()))?;
        return Ok(values);
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("invalid JSON on line {} of {}", n + 1, path.display()))
        })
        .collect()
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Check {
            interactions,
            spec,
            config,
        } => {
            let cfg = load_config(config.as_deref())?;
            let spec_path = spec.unwrap_or_else(|| cfg.spec.clone());
            let Some(interactions_path) = interactions.or_else(|| cfg.interactions.clone()) else {
                bail!("no interactions file: pass INTERACTIONS or set `interactions` in config");
            };

            if cli.output == OutputFormat::Terminal {
                eprintln!("Config:");
                eprintln!("  spec:         {}", spec_path.display());
                eprintln!("  interactions: {}", interactions_path.display());
                if !cfg.skip_statuses.is_empty() {
                    eprintln!("  skip:         {:?}", cfg.skip_statuses);
                }
                eprintln!();
            }

            let api_spec = load_api_spec(&spec_path)?;
            let raw = read_interactions(&interactions_path)?;

            let policy = VerdictPolicy {
                skip_statuses: cfg.skip_statuses.clone(),
            };

            let mut findings = Vec::new();
            let mut errors = Vec::new();
            let mut checked: u64 = 0;
            let mut skipped: u64 = 0;

            for (index, value) in raw.iter().enumerate() {
                let actual = match normalize(value) {
                    Ok(actual) => actual,
                    Err(e) => {
                        tracing::warn!(index, error = %e, "unreadable interaction");
                        errors.push(format!("#{index}: {e}"));
                        continue;
                    }
                };
                if !policy.should_check(actual.status) {
                    skipped += 1;
                    continue;
                }
                checked += 1;
                if let Err(error) = api_spec.validate_response(&actual) {
                    findings.push(Finding {
                        index,
                        method: actual.req.method_upper(),
                        path: actual.req.path.clone(),
                        status: actual.status,
                        error,
                    });
                }
            }

            let verdict = policy.verdict(&findings, checked, errors.len() as u64);

            match cli.output {
                OutputFormat::Terminal => {
                    if !errors.is_empty() {
                        eprintln!("Errors:");
                        for err in &errors {
                            eprintln!("  - {err}");
                        }
                        eprintln!();
                    }
                    if !findings.is_empty() {
                        println!("Failures ({}):", findings.len());
                        for f in &findings {
                            println!("  {}", f.to_line());
                        }
                        println!("\nBy kind:");
                        for line in VerdictPolicy::breakdown_lines(&findings) {
                            println!("  {line}");
                        }
                    }
                    println!("\n{}: {}", verdict.status, verdict.reason);
                    println!(
                        "  Interactions: {} total, {checked} checked, {skipped} skipped, {} failures",
                        raw.len(),
                        findings.len()
                    );
                    println!("  Exit code: {}", verdict.exit_code);
                }
                OutputFormat::Json => {
                    let json_output = serde_json::json!({
                        "verdict": {
                            "status": verdict.status.to_string(),
                            "exit_code": verdict.exit_code,
                            "reason": verdict.reason,
                        },
                        "stats": {
                            "total": raw.len(),
                            "checked": checked,
                            "skipped": skipped,
                            "failures": findings.len(),
                        },
                        "breakdown": VerdictPolicy::breakdown(&findings),
                        "findings": findings,
                        "errors": errors,
                    });
                    println!("{}", serde_json::to_string_pretty(&json_output)?);
                }
                OutputFormat::Silent => {}
            }

            Ok(verdict.exit_code)
        }

        Commands::Schema {
            name,
            object,
            spec,
            config,
        } => {
            let cfg = load_config(config.as_deref())?;
            let spec_path = spec.unwrap_or(cfg.spec);
            let api_spec = load_api_spec(&spec_path)?;

            let content = std::fs::read_to_string(&object)
                .with_context(|| format!("cannot read {}", object.display()))?;
            let value = oasprey_validator::loader::parse_document(&object, &content)
                .map_err(|e| anyhow::anyhow!("invalid YAML or JSON in {}: {e}", object.display()))?;

            let result = satisfy_schema_in_api_spec(&value, &name, &api_spec)?;
            let status = if result.pass {
                VerdictStatus::Pass
            } else {
                VerdictStatus::Fail
            };

            match cli.output {
                OutputFormat::Terminal => {
                    if result.pass {
                        println!("{status}: {} satisfies schema '{name}'", object.display());
                    } else {
                        println!("{}\n\n{status}", result.message);
                    }
                }
                OutputFormat::Json => {
                    let json_output = serde_json::json!({
                        "status": status.to_string(),
                        "schema": name,
                        "pass": result.pass,
                        "message": result.message,
                    });
                    println!("{}", serde_json::to_string_pretty(&json_output)?);
                }
                OutputFormat::Silent => {}
            }

            Ok(if result.pass { 0 } else { 1 })
        }

        Commands::Init => {
            let config_path = ".oasprey.toml";
            if Path::new(config_path).exists() {
                eprintln!("{config_path} already exists");
                return Ok(1);
            }

            std::fs::write(config_path, Config::example())?;
            println!("Created {config_path}");
            println!("\nEdit the file to configure:");
            println!("  - spec: path to your OpenAPI document");
            println!("  - interactions: recorded responses to check");
            println!("  - skip_statuses: status codes to leave unchecked");
            Ok(0)
        }
    }
}
