//! Deployer configuration stored in `deployer.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::codec::Wrapper;
use crate::core::gpg::{DEFAULT_CIPHER_ALGO, DEFAULT_DIGEST_ALGO, ToolOptions};
use crate::io::runner::{DEFAULT_OUTPUT_LIMIT_BYTES, SystemRunner};

pub const DEFAULT_CONFIG_FILE: &str = "deployer.toml";

/// Deployer configuration (TOML).
///
/// Missing fields default to the values HomeSetup has always used
/// (`.VERSION`, `gpg`, AES256/SHA512).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeployerConfig {
    /// Version file bumped by `deployer bump`, relative to the working directory.
    pub version_file: PathBuf,

    pub gpg: GpgConfig,

    pub encoding: EncodingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GpgConfig {
    /// Cipher tool binary (looked up on `PATH`).
    pub program: String,
    pub cipher_algo: String,
    pub digest_algo: String,
    pub pinentry_loopback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homedir: Option<PathBuf>,
    /// Kill the tool after this many seconds. Unset means wait indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Truncate captured tool output beyond this many bytes.
    pub output_limit_bytes: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EncodingConfig {
    pub wrapper: Wrapper,
}

impl Default for GpgConfig {
    fn default() -> Self {
        Self {
            program: "gpg".to_string(),
            cipher_algo: DEFAULT_CIPHER_ALGO.to_string(),
            digest_algo: DEFAULT_DIGEST_ALGO.to_string(),
            pinentry_loopback: true,
            homedir: None,
            timeout_secs: None,
            output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
        }
    }
}

impl Default for DeployerConfig {
    fn default() -> Self {
        Self {
            version_file: PathBuf::from(".VERSION"),
            gpg: GpgConfig::default(),
            encoding: EncodingConfig::default(),
        }
    }
}

impl GpgConfig {
    pub fn tool_options(&self) -> ToolOptions {
        ToolOptions {
            pinentry_loopback: self.pinentry_loopback,
            homedir: self.homedir.clone(),
        }
    }

    pub fn system_runner(&self) -> SystemRunner {
        SystemRunner {
            timeout: self.timeout_secs.map(Duration::from_secs),
            output_limit_bytes: self.output_limit_bytes,
        }
    }
}

impl DeployerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version_file.as_os_str().is_empty() {
            return Err(anyhow!("version_file must not be empty"));
        }
        if self.gpg.program.trim().is_empty() {
            return Err(anyhow!("gpg.program must not be empty"));
        }
        if self.gpg.cipher_algo.trim().is_empty() {
            return Err(anyhow!("gpg.cipher_algo must not be empty"));
        }
        if self.gpg.digest_algo.trim().is_empty() {
            return Err(anyhow!("gpg.digest_algo must not be empty"));
        }
        if self.gpg.timeout_secs == Some(0) {
            return Err(anyhow!("gpg.timeout_secs must be > 0 when set"));
        }
        if self.gpg.output_limit_bytes == 0 {
            return Err(anyhow!("gpg.output_limit_bytes must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `DeployerConfig::default()`.
pub fn load_config(path: &Path) -> Result<DeployerConfig> {
    if !path.exists() {
        let cfg = DeployerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: DeployerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &DeployerConfig) -> Result<()> {
    cfg.validate()?;
    let buf = render_config(cfg)?;
    write_atomic(path, &buf)
}

/// Serialize config as pretty TOML with a trailing newline.
pub fn render_config(cfg: &DeployerConfig) -> Result<String> {
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    if !buf.ends_with('\n') {
        buf.push('\n');
    }
    Ok(buf)
}

pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let file_name = path
        .file_name()
        .with_context(|| format!("path missing file name {}", path.display()))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = parent.join(tmp_name);
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}
