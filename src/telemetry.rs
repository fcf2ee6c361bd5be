//! Logging setup and security event reporting.
//!
//! Log level comes from `RUST_LOG` (default `info`). Set
//! `SPAM_GUARD_LOG_FORMAT=json` for JSON lines.

use tracing_subscriber::EnvFilter;

/// Environment variable selecting the log output format.
pub const LOG_FORMAT_ENV: &str = "SPAM_GUARD_LOG_FORMAT";

#[derive(thiserror::Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to install log subscriber: {0}")]
    Install(String),
}

/// Install the global tracing subscriber.
pub fn init_logging() -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,tower_http=info"))
        .map_err(|e| TelemetryError::Filter(e.to_string()))?;

    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| TelemetryError::Install(e.to_string()))
}

/// Security-relevant artifact lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEvent {
    ArtifactDecrypted,
    ArtifactResealed,
    DecryptionRejected,
    PlaintextExposed,
}

impl SecurityEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityEvent::ArtifactDecrypted => "artifact_decrypted",
            SecurityEvent::ArtifactResealed => "artifact_resealed",
            SecurityEvent::DecryptionRejected => "decryption_rejected",
            SecurityEvent::PlaintextExposed => "plaintext_exposed",
        }
    }
}

/// Emit a security event on the `security` target.
///
/// `PlaintextExposed` logs at error level, rejections at warn, the rest at info.
pub fn log_security_event(event: SecurityEvent, message: &str, fields: &[(&str, &str)]) {
    let details = fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ");
    match event {
        SecurityEvent::PlaintextExposed => {
            tracing::error!(target: "security", event = event.as_str(), %details, "{}", message)
        }
        SecurityEvent::DecryptionRejected => {
            tracing::warn!(target: "security", event = event.as_str(), %details, "{}", message)
        }
        _ => tracing::info!(target: "security", event = event.as_str(), %details, "{}", message),
    }
}
