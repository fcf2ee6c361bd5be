//! Command runners: serve, artifact codec, and config inspection.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use spam_guard::security::encryption::is_sealed_file;
use spam_guard::{ArtifactCipher, ArtifactKey, CodecError, PredictionServer, ServiceConfig};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Exit code for configuration errors.
pub const EXIT_CONFIG: u8 = 2;

/// Options shared by commands that read configuration.
#[derive(Debug, Default)]
struct CommandOptions {
    config: Option<PathBuf>,
    bind: Option<SocketAddr>,
    key_env: Option<String>,
    files: Vec<PathBuf>,
}

impl CommandOptions {
    /// Parse `--config FILE`, `--bind ADDR`, `--key-env VAR`, and positional files.
    fn parse(args: &[String], allow_files: bool) -> Result<Self, String> {
        let mut options = CommandOptions::default();
        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--config" => {
                    let value = args.get(i + 1).ok_or("Missing value for --config")?;
                    options.config = Some(PathBuf::from(value));
                    i += 2;
                }
                "--bind" => {
                    let value = args.get(i + 1).ok_or("Missing value for --bind")?;
                    let addr = value
                        .parse()
                        .map_err(|e| format!("Invalid --bind address '{}': {}", value, e))?;
                    options.bind = Some(addr);
                    i += 2;
                }
                "--key-env" => {
                    let value = args.get(i + 1).ok_or("Missing value for --key-env")?;
                    options.key_env = Some(value.clone());
                    i += 2;
                }
                other if allow_files && !other.starts_with("--") => {
                    options.files.push(PathBuf::from(other));
                    i += 1;
                }
                other => return Err(format!("Unknown argument: {}", other)),
            }
        }
        Ok(options)
    }

    fn load_config(&self) -> Result<ServiceConfig, String> {
        let mut config = match &self.config {
            Some(path) => ServiceConfig::load_from(Some(path)),
            None => ServiceConfig::load(),
        }
        .map_err(|e| e.to_string())?;

        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(key_env) = &self.key_env {
            config.key_env = key_env.clone();
        }
        config.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }
}

fn config_error(message: &str) -> ExitCode {
    eprintln!("Configuration error: {}", message);
    ExitCode::from(EXIT_CONFIG)
}

/// Run the startup lifecycle, then serve until a termination signal.
pub async fn run_serve(args: &[String]) -> ExitCode {
    let config = match CommandOptions::parse(args, false).and_then(|o| o.load_config()) {
        Ok(config) => config,
        Err(e) => return config_error(&e),
    };

    // Installed before startup: an interrupt must not kill the process while
    // artifacts are decrypted on disk.
    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Shutdown signal received, draining...");
        trigger.cancel();
    });

    let server = match prepare_server(config, &shutdown).await {
        Ok(Some(server)) => server,
        Ok(None) => {
            info!("Shutdown requested during startup, not binding");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("Startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match server.serve(shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server error");
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run the blocking startup lifecycle. `None` when shutdown was requested meanwhile.
async fn prepare_server(
    config: ServiceConfig,
    shutdown: &CancellationToken,
) -> Result<Option<PredictionServer>, String> {
    let startup = tokio::task::spawn_blocking(move || PredictionServer::from_config(config)).await;
    let server = match startup {
        Ok(Ok(server)) => server,
        Ok(Err(e)) => {
            error!(error = %e, "Startup aborted");
            return Err(e.to_string());
        }
        Err(e) => {
            error!(error = %e, "Startup task panicked");
            return Err(e.to_string());
        }
    };
    if shutdown.is_cancelled() {
        return Ok(None);
    }
    Ok(Some(server))
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl-C only");
            wait_for_ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = wait_for_ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Ctrl-C handler unavailable");
        std::future::pending::<()>().await;
    }
}

#[derive(Debug, Clone, Copy)]
pub enum CodecDirection {
    Encrypt,
    Decrypt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodecOutcome {
    Done,
    /// Skipped: already in the requested state.
    Unchanged,
}

/// Apply one direction to a file, leaving it alone when it is already sealed
/// (encrypt) or not sealed (decrypt).
fn apply_codec(
    cipher: &ArtifactCipher,
    direction: CodecDirection,
    path: &Path,
) -> Result<CodecOutcome, CodecError> {
    let sealed = is_sealed_file(path)?;
    match direction {
        CodecDirection::Encrypt if sealed => Ok(CodecOutcome::Unchanged),
        CodecDirection::Decrypt if !sealed => Ok(CodecOutcome::Unchanged),
        CodecDirection::Encrypt => cipher.encrypt_file(path).map(|()| CodecOutcome::Done),
        CodecDirection::Decrypt => cipher.decrypt_file(path).map(|()| CodecOutcome::Done),
    }
}

/// Encrypt or decrypt files in place. With no files, acts on the configured artifacts.
pub fn run_codec(direction: CodecDirection, args: &[String]) -> ExitCode {
    let options = match CommandOptions::parse(args, true) {
        Ok(options) => options,
        Err(e) => return config_error(&e),
    };
    let config = match options.load_config() {
        Ok(config) => config,
        Err(e) => return config_error(&e),
    };
    let key = match ArtifactKey::from_env(&config.key_env) {
        Ok(key) => key,
        Err(e) => return config_error(&e.to_string()),
    };
    let cipher = ArtifactCipher::new(key);

    let files = if options.files.is_empty() {
        let paths = config.artifact_paths();
        vec![paths.model, paths.vectorizer]
    } else {
        options.files
    };

    let mut failed = false;
    for file in &files {
        match apply_codec(&cipher, direction, file) {
            Ok(CodecOutcome::Done) => info!(path = %file.display(), ?direction, "Done"),
            Ok(CodecOutcome::Unchanged) => {
                let state = match direction {
                    CodecDirection::Encrypt => "already encrypted",
                    CodecDirection::Decrypt => "not encrypted",
                };
                warn!(path = %file.display(), ?direction, "Skipped: {}", state);
                eprintln!("{}: skipped, {}", file.display(), state);
            }
            Err(e) => {
                error!(path = %file.display(), ?direction, error = %e, "Failed");
                eprintln!("{}: {}", file.display(), e);
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

pub fn run_config_show(args: &[String]) -> ExitCode {
    let config = match CommandOptions::parse(args, false).and_then(|o| o.load_config()) {
        Ok(config) => config,
        Err(e) => return config_error(&e),
    };
    print_toml(&config)
}

pub fn run_config_defaults() -> ExitCode {
    print_toml(&ServiceConfig::default())
}

pub fn run_config_validate(args: &[String]) -> ExitCode {
    match CommandOptions::parse(args, false).and_then(|o| o.load_config()) {
        Ok(_) => {
            println!("Configuration is valid");
            ExitCode::SUCCESS
        }
        Err(e) => config_error(&e),
    }
}

fn print_toml(config: &ServiceConfig) -> ExitCode {
    match config.to_toml() {
        Ok(text) => {
            print!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => config_error(&e.to_string()),
    }
}
