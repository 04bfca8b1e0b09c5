//! Envoy CLI
//!

#![deny(missing_docs)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use envoy_core::{
    decode_document, encode_users, log_runtime,
    logging::{self, debug, info, LevelFilter},
    project::{ProjectConfig, PROJECT_CFG},
    MarshalEnvoy, UserSet,
};

/// Envoy CLI: import and export provisioned users
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: EnvoyCommand,
    /// Path to the project configuration.
    #[clap(short, long, default_value = PROJECT_CFG)]
    config: PathBuf,
    #[clap(short, long)]
    log_level: Option<LevelFilter>,
}

#[derive(Subcommand, Debug)]
enum EnvoyCommand {
    /// Write a default project configuration.
    Init {
        /// Name of the project.
        #[clap(short, long, default_value = "envoy")]
        name: String,
        /// Replace an existing configuration.
        #[clap(long)]
        overwrite: bool,
    },
    /// Decode user definitions and print the resulting resource nodes as JSON.
    Import {
        /// Definition files to read instead of the configured sources.
        files: Vec<PathBuf>,
        /// Write the nodes to this file instead of stdout.
        #[clap(short, long)]
        out: Option<PathBuf>,
    },
    /// Decode user definitions and write them back out as YAML.
    Export {
        /// Definition files to read instead of the configured sources.
        files: Vec<PathBuf>,
    },
}

fn main() {
    let args = Args::parse();
    logging::setup(args.log_level);

    if let Err(e) = run(&args) {
        eprintln!("{}", format!("{e:#}").red());
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    match &args.command {
        EnvoyCommand::Init { name, overwrite } => init(&args.config, name, *overwrite),
        EnvoyCommand::Import { files, out } => {
            let users = load_users(&args.config, files)?;
            let nodes = log_runtime!("encoding users", users.marshal_envoy()?);
            let json = serde_json::to_string_pretty(&nodes)?;
            match out {
                Some(path) => {
                    fs::write(path, json)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!("wrote {} nodes to {}", nodes.len(), path.display());
                }
                None => println!("{json}"),
            }
            Ok(())
        }
        EnvoyCommand::Export { files } => {
            let users = load_users(&args.config, files)?;
            let nodes = users.marshal_envoy()?;
            print!("{}", encode_users(&nodes)?);
            Ok(())
        }
    }
}

fn init(config_path: &Path, name: &str, overwrite: bool) -> Result<()> {
    if config_path.exists() && !overwrite {
        bail!(
            "{} already exists; pass --overwrite to replace it",
            config_path.display()
        );
    }
    let mut config = ProjectConfig::new();
    config.set_name(name.to_owned());
    fs::write(config_path, config.to_yaml()?)
        .with_context(|| format!("writing {}", config_path.display()))?;
    info!("created {}", config_path.display());
    Ok(())
}

/// Decode every definition file into one user set, in path order.
fn load_users(config_path: &Path, files: &[PathBuf]) -> Result<UserSet> {
    let paths = if files.is_empty() {
        let config = ProjectConfig::read_from_file(config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        let project_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        config.source_paths(project_dir)?
    } else {
        files.to_vec()
    };

    if paths.is_empty() {
        bail!("no definition files found");
    }

    let mut users = UserSet::default();
    for path in paths {
        debug!("decoding {}", path.display());
        let doc = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let decoded = log_runtime!(
            "decoding users",
            decode_document(&doc).with_context(|| format!("invalid definitions in {}", path.display()))?
        );
        users.extend(decoded);
    }
    info!("decoded {} users", users.len());
    Ok(users)
}
