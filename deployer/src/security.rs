//! File transform pipeline: base64 encode/decode and symmetric encrypt/decrypt.
//!
//! Encoding is done in-process with the `base64` crate. Encryption is a
//! pass-through to a `gpg` compatible tool driven by an injected
//! [`CommandRunner`]; no cipher logic lives here. Every operation is a single
//! blocking request/response cycle and always truncates the destination.

use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::core::codec::{self, Wrapper};
use crate::core::gpg::{
    DEFAULT_CIPHER_ALGO, DEFAULT_DIGEST_ALGO, Direction, ToolOptions, cipher_args,
};
use crate::io::config::DeployerConfig;
use crate::io::runner::{CommandRunner, Invocation, SystemRunner};

/// Failures surfaced by the transform pipeline. None are retried.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("{op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: base64::DecodeError,
    },
    #[error("{direction} requires a passphrase")]
    MissingPassphrase { direction: &'static str },
    /// The tool reads one line from `--passphrase-fd`, so line breaks would truncate it.
    #[error("passphrase must not contain line breaks")]
    InvalidPassphrase,
    #[error("run {program}: {detail}")]
    Spawn { program: String, detail: String },
    #[error("{program} exited with {}: {output}", exit_label(.code))]
    Process {
        program: String,
        code: Option<i32>,
        output: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (killed or timed out)".to_string(),
    }
}

impl TransformError {
    fn io(op: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Secret handed to the cipher tool over stdin. `Debug` never shows it.
#[derive(Clone, PartialEq, Eq)]
pub struct Passphrase(String);

impl Passphrase {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    fn is_single_line(&self) -> bool {
        !self.0.contains(['\n', '\r'])
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(<redacted>)")
    }
}

/// Parameters for one transform call.
#[derive(Debug, Clone)]
pub struct TransformRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub passphrase: Option<Passphrase>,
    pub cipher_algo: String,
    pub digest_algo: String,
}

impl TransformRequest {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            passphrase: None,
            cipher_algo: DEFAULT_CIPHER_ALGO.to_string(),
            digest_algo: DEFAULT_DIGEST_ALGO.to_string(),
        }
    }

    pub fn with_passphrase(mut self, passphrase: Passphrase) -> Self {
        self.passphrase = Some(passphrase);
        self
    }

    pub fn with_cipher_algo(mut self, algo: impl Into<String>) -> Self {
        self.cipher_algo = algo.into();
        self
    }

    pub fn with_digest_algo(mut self, algo: impl Into<String>) -> Self {
        self.digest_algo = algo.into();
        self
    }
}

/// Encode/decode/encrypt/decrypt files through a [`CommandRunner`].
#[derive(Debug, Clone)]
pub struct TransformPipeline<R> {
    runner: R,
    program: String,
    wrapper: Wrapper,
    tool: ToolOptions,
}

impl<R: CommandRunner> TransformPipeline<R> {
    /// Pipeline invoking `gpg` with default tool options and raw base64 text.
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            program: "gpg".to_string(),
            wrapper: Wrapper::Raw,
            tool: ToolOptions::default(),
        }
    }

    pub fn from_config(runner: R, cfg: &DeployerConfig) -> Self {
        Self {
            runner,
            program: cfg.gpg.program.clone(),
            wrapper: cfg.encoding.wrapper,
            tool: cfg.gpg.tool_options(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_wrapper(mut self, wrapper: Wrapper) -> Self {
        self.wrapper = wrapper;
        self
    }

    pub fn with_tool_options(mut self, tool: ToolOptions) -> Self {
        self.tool = tool;
        self
    }

    /// Write the base64 text of `source` to `destination`.
    #[instrument(skip_all, fields(source = %source.display(), destination = %destination.display()))]
    pub fn encode(&self, source: &Path, destination: &Path) -> Result<(), TransformError> {
        let input = fs::read(source).map_err(|e| TransformError::io("read", source, e))?;
        let text = codec::encode_text(&input, self.wrapper);
        fs::write(destination, text).map_err(|e| TransformError::io("write", destination, e))?;
        debug!(bytes = input.len(), wrapper = ?self.wrapper, "encoded file");
        Ok(())
    }

    /// Base64-decode `source` into `destination`.
    #[instrument(skip_all, fields(source = %source.display(), destination = %destination.display()))]
    pub fn decode(&self, source: &Path, destination: &Path) -> Result<(), TransformError> {
        let text = fs::read(source).map_err(|e| TransformError::io("read", source, e))?;
        let bytes = codec::decode_text(&text).map_err(|e| TransformError::Decode {
            path: source.to_path_buf(),
            source: e,
        })?;
        let rendered = codec::render_decoded(&bytes, self.wrapper);
        fs::write(destination, rendered)
            .map_err(|e| TransformError::io("write", destination, e))?;
        debug!(bytes = bytes.len(), wrapper = ?self.wrapper, "decoded file");
        Ok(())
    }

    /// Symmetrically encrypt `request.source` into `request.destination`.
    pub fn encrypt(&self, request: &TransformRequest) -> Result<(), TransformError> {
        self.run_cipher(Direction::Encrypt, request)
    }

    /// Decrypt a file produced by [`TransformPipeline::encrypt`].
    pub fn decrypt(&self, request: &TransformRequest) -> Result<(), TransformError> {
        self.run_cipher(Direction::Decrypt, request)
    }

    #[instrument(skip_all, fields(direction = direction.as_str(), program = %self.program))]
    fn run_cipher(
        &self,
        direction: Direction,
        request: &TransformRequest,
    ) -> Result<(), TransformError> {
        let passphrase =
            request
                .passphrase
                .as_ref()
                .ok_or(TransformError::MissingPassphrase {
                    direction: direction.as_str(),
                })?;
        if !passphrase.is_single_line() {
            return Err(TransformError::InvalidPassphrase);
        }

        // Fail before spawning anything if the source cannot be read.
        File::open(&request.source).map_err(|e| TransformError::io("open", &request.source, e))?;

        let args = cipher_args(
            direction,
            &request.cipher_algo,
            &request.digest_algo,
            &self.tool,
            &request.source,
            &request.destination,
        );
        let mut stdin = passphrase.expose().as_bytes().to_vec();
        stdin.push(b'\n');
        let invocation = Invocation::new(&self.program, args).with_stdin(stdin);

        info!(
            source = %request.source.display(),
            destination = %request.destination.display(),
            cipher_algo = %request.cipher_algo,
            digest_algo = %request.digest_algo,
            "invoking cipher tool"
        );
        let output = self
            .runner
            .run(&invocation)
            .map_err(|err| TransformError::Spawn {
                program: self.program.clone(),
                detail: format!("{err:#}"),
            })?;

        if !output.success() {
            warn!(exit_code = ?output.code, timed_out = output.timed_out, "cipher tool failed");
            return Err(TransformError::Process {
                program: self.program.clone(),
                code: output.code,
                output: String::from_utf8_lossy(&output.output).trim().to_string(),
            });
        }
        debug!("cipher tool succeeded");
        Ok(())
    }
}

fn system_pipeline() -> TransformPipeline<SystemRunner> {
    TransformPipeline::new(SystemRunner::default())
}

/// Encode `source` to raw base64 text in `destination`.
pub fn encode(source: &Path, destination: &Path) -> Result<(), TransformError> {
    system_pipeline().encode(source, destination)
}

/// Decode base64 text in `source` to `destination`.
pub fn decode(source: &Path, destination: &Path) -> Result<(), TransformError> {
    system_pipeline().decode(source, destination)
}

/// Encrypt with `gpg` from `PATH` using AES256/SHA512.
pub fn encrypt(
    source: &Path,
    destination: &Path,
    passphrase: &Passphrase,
) -> Result<(), TransformError> {
    let request = TransformRequest::new(source, destination).with_passphrase(passphrase.clone());
    system_pipeline().encrypt(&request)
}

/// Decrypt with `gpg` from `PATH` using AES256/SHA512.
pub fn decrypt(
    source: &Path,
    destination: &Path,
    passphrase: &Passphrase,
) -> Result<(), TransformError> {
    let request = TransformRequest::new(source, destination).with_passphrase(passphrase.clone());
    system_pipeline().decrypt(&request)
}
