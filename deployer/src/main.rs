//! Deployer for HomeSetup.
//!
//! Bumps the `.VERSION` file, reports git release metadata, and wraps
//! base64/gpg file transforms used by the dotfiles scripts.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;

use deployer::core::codec::Wrapper;
use deployer::core::version::VersionField;
use deployer::exit_codes;
use deployer::io::config::{
    DEFAULT_CONFIG_FILE, DeployerConfig, load_config, render_config, write_config,
};
use deployer::io::git::Git;
use deployer::io::runner::SystemRunner;
use deployer::io::version_file::load_version;
use deployer::logging;
use deployer::release::{bump_version_file, collect_release_info};
use deployer::security::{Passphrase, TransformError, TransformPipeline, TransformRequest};

#[derive(Parser)]
#[command(name = "deployer", version, about = "Deployer for HomeSetup")]
struct Cli {
    /// Config file (missing file means defaults).
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Advance one field of the version file and print `old -> new`.
    Bump {
        #[arg(value_enum)]
        field: FieldArg,
        /// Version file to update (defaults to `version_file` from config).
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print the current version from the version file.
    #[command(name = "version-show", alias = "current")]
    VersionShow {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print repository top-level dir, branch and git user.
    Info {
        /// Also print the release date of this tag.
        #[arg(long)]
        release: Option<String>,
        /// Emit JSON instead of `Key: value` lines.
        #[arg(long)]
        json: bool,
    },
    /// Print log entries between two revisions.
    Changelog { from: String, to: String },
    /// Print log entries since the latest tag.
    Unreleased,
    /// Base64-encode a file.
    Encode(CodecArgs),
    /// Base64-decode a file.
    Decode(CodecArgs),
    /// Symmetrically encrypt a file with gpg.
    Encrypt(CipherArgs),
    /// Decrypt a file produced by `encrypt`.
    Decrypt(CipherArgs),
    /// Print the effective configuration as TOML.
    Config {
        /// Persist the effective configuration to the config path.
        #[arg(long)]
        write: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum FieldArg {
    Reset,
    Build,
    Minor,
    Major,
}

impl From<FieldArg> for VersionField {
    fn from(field: FieldArg) -> Self {
        match field {
            FieldArg::Reset => VersionField::Reset,
            FieldArg::Build => VersionField::Build,
            FieldArg::Minor => VersionField::Minor,
            FieldArg::Major => VersionField::Major,
        }
    }
}

#[derive(Args, Debug)]
struct CodecArgs {
    source: PathBuf,
    destination: PathBuf,
    /// Read/write the legacy `b'...'` byte-literal wrapper.
    #[arg(long)]
    legacy: bool,
}

#[derive(Args)]
struct CipherArgs {
    source: PathBuf,
    destination: PathBuf,
    /// Passphrase. Prefer the environment variable: arguments are visible to other processes.
    #[arg(long, env = "DEPLOYER_PASSPHRASE", hide_env_values = true)]
    passphrase: String,
    /// Cipher algorithm (defaults to `gpg.cipher_algo` from config).
    #[arg(long)]
    cipher_algo: Option<String>,
    /// Digest algorithm (defaults to `gpg.digest_algo` from config).
    #[arg(long)]
    digest_algo: Option<String>,
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(()) => exit_codes::OK,
        Err(err) => {
            eprintln!("{err:#}");
            exit_code_for(&err)
        }
    };
    std::process::exit(code);
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<TransformError>() {
        Some(TransformError::Process { .. }) => exit_codes::TOOL_FAILED,
        _ => exit_codes::FAILED,
    }
}

fn run(cli: Cli) -> Result<()> {
    let cfg = load_config(&cli.config)?;
    debug!(config = %cli.config.display(), "config loaded");
    match cli.command {
        Command::Bump { field, file } => cmd_bump(&cfg, field, file.as_deref()),
        Command::VersionShow { file } => cmd_version_show(&cfg, file.as_deref()),
        Command::Info { release, json } => cmd_info(release.as_deref(), json),
        Command::Changelog { from, to } => print_lines(&current_git()?.changelog(&from, &to)?),
        Command::Unreleased => print_lines(&current_git()?.unreleased()?),
        Command::Encode(args) => {
            codec_pipeline(&cfg, args.legacy).encode(&args.source, &args.destination)?;
            Ok(())
        }
        Command::Decode(args) => {
            codec_pipeline(&cfg, args.legacy).decode(&args.source, &args.destination)?;
            Ok(())
        }
        Command::Encrypt(args) => {
            let request = cipher_request(&cfg, args);
            TransformPipeline::from_config(cfg.gpg.system_runner(), &cfg).encrypt(&request)?;
            Ok(())
        }
        Command::Decrypt(args) => {
            let request = cipher_request(&cfg, args);
            TransformPipeline::from_config(cfg.gpg.system_runner(), &cfg).decrypt(&request)?;
            Ok(())
        }
        Command::Config { write } => cmd_config(&cli.config, &cfg, write),
    }
}

fn cmd_bump(cfg: &DeployerConfig, field: FieldArg, file: Option<&Path>) -> Result<()> {
    let path = file.unwrap_or(cfg.version_file.as_path());
    let bump = bump_version_file(path, field.into())?;
    println!("{} -> {}", bump.previous, bump.current);
    Ok(())
}

fn cmd_version_show(cfg: &DeployerConfig, file: Option<&Path>) -> Result<()> {
    let path = file.unwrap_or(cfg.version_file.as_path());
    println!("{}", load_version(path)?);
    Ok(())
}

fn cmd_info(release: Option<&str>, json: bool) -> Result<()> {
    let info = collect_release_info(&current_git()?, release)?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&info).context("serialize release info")?
        );
    } else {
        print!("{info}");
    }
    Ok(())
}

fn cmd_config(path: &Path, cfg: &DeployerConfig, write: bool) -> Result<()> {
    if write {
        write_config(path, cfg)?;
        println!("wrote {}", path.display());
        return Ok(());
    }
    print!("{}", render_config(cfg)?);
    Ok(())
}

fn current_git() -> Result<Git> {
    let cwd = std::env::current_dir().context("resolve current directory")?;
    Ok(Git::new(cwd))
}

fn print_lines(lines: &[String]) -> Result<()> {
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

fn codec_pipeline(
    cfg: &DeployerConfig,
    legacy: bool,
) -> TransformPipeline<SystemRunner> {
    let pipeline = TransformPipeline::from_config(cfg.gpg.system_runner(), cfg);
    if legacy {
        pipeline.with_wrapper(Wrapper::Legacy)
    } else {
        pipeline
    }
}

fn cipher_request(cfg: &DeployerConfig, args: CipherArgs) -> TransformRequest {
    TransformRequest::new(args.source, args.destination)
        .with_passphrase(Passphrase::new(args.passphrase))
        .with_cipher_algo(args.cipher_algo.unwrap_or_else(|| cfg.gpg.cipher_algo.clone()))
        .with_digest_algo(args.digest_algo.unwrap_or_else(|| cfg.gpg.digest_algo.clone()))
}
