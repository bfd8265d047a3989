//! policy-gate CLI
//!
//! Evaluates a request against a policy file, or lints a policy file.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use policy_gate::{
    Attributes, EngineBuilder, EngineConfig, FilePolicyStore, MatchModeRegistry, PolicyStore,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "policy-gate")]
#[command(about = "Evaluate authorization policies from the command line")]
struct Args {
    /// Engine configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decide whether a request is allowed
    Check {
        /// Policy file (JSON, or TOML by extension)
        #[arg(short, long)]
        policy: Option<PathBuf>,

        /// Target identifier, e.g. an API method or path
        #[arg(short, long)]
        target: String,

        /// Request attribute as key=value, repeatable
        #[arg(short, long = "attr", value_name = "KEY=VALUE")]
        attrs: Vec<String>,

        /// Attribute key holding role claims (overrides the config file)
        #[arg(long)]
        roles_key: Option<String>,
    },
    /// Report suspicious constructs in a policy file
    Lint {
        #[arg(short, long)]
        policy: PathBuf,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match args.command {
        Command::Check {
            policy,
            target,
            attrs,
            roles_key,
        } => {
            if let Some(path) = policy {
                config.policy_path = Some(path);
            }
            if let Some(key) = roles_key {
                config.roles_key = key;
            }
            if config.policy_path.is_none() {
                bail!("no policy file given (use --policy or set policy_path in the config)");
            }

            let mut attributes = Attributes::new();
            for pair in &attrs {
                attributes
                    .append_pair(pair)
                    .with_context(|| format!("invalid attribute '{}', expected KEY=VALUE", pair))?;
            }

            let engine = EngineBuilder::from_config(&config)?.build()?;
            info!("Evaluating '{}' with roles key '{}'", target, engine.roles_key());

            match engine.evaluate(&target, &attributes) {
                Ok(()) => {
                    println!("ALLOW");
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) if err.is_denied() => {
                    println!("DENY {}", err);
                    Ok(ExitCode::from(1))
                }
                Err(err) => Err(anyhow::Error::new(err).context("policy evaluation failed")),
            }
        }
        Command::Lint { policy } => {
            let store = FilePolicyStore::new(policy.clone());
            let document = store
                .authorization_policy()
                .with_context(|| format!("failed to load {}", policy.display()))?;

            let warnings = document.lint(&MatchModeRegistry::default());
            for warning in &warnings {
                println!("warning: {}", warning);
            }
            info!("{} warnings in {:?}", warnings.len(), policy);

            Ok(if warnings.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
    }
}
