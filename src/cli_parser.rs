//! CLI usage and help text for Spam-Guard.

/// Print general usage information.
pub fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "Spam-Guard - spam classifier prediction service v{}

USAGE:
    spam-guard [COMMAND] [OPTIONS]

COMMANDS:
    serve        Load artifacts and run the HTTP service (default)
    encrypt      Encrypt files in place with the artifact key
    decrypt      Decrypt files in place with the artifact key
    keygen       Print a new base64 artifact key
    config       Inspect configuration (show, defaults, validate)
    version      Show version information
    help         Show this help message

OPTIONS:
    -h, --help          Show help for command
    -V, --version       Show version information
    --config FILE       Load configuration from a TOML file

EXAMPLES:
    spam-guard                                   # Serve with defaults
    spam-guard serve --bind 127.0.0.1:8080       # Serve on a custom address
    spam-guard keygen                            # New key for SPAM_GUARD_KEY
    spam-guard encrypt                           # Encrypt configured artifacts
    spam-guard decrypt model.json                # Decrypt one file
    spam-guard config validate --config sg.toml  # Validate a config file

ENVIRONMENT:
    SPAM_GUARD_KEY              Base64 artifact key (encrypted mode)
    SPAM_GUARD_CONFIG           TOML configuration file
    SPAM_GUARD_BIND             Listener address (default 0.0.0.0:5000)
    SPAM_GUARD_MODEL_PATH       Classifier artifact path
    SPAM_GUARD_VECTORIZER_PATH  Vectorizer artifact path
    SPAM_GUARD_ARTIFACT_MODE    encrypted | plaintext
    SPAM_GUARD_KEY_ENV          Name of the variable holding the key
    SPAM_GUARD_MAX_BODY_BYTES   Request body limit
    SPAM_GUARD_LOG_FORMAT       Set to 'json' for JSON logs
    RUST_LOG                    Log level (debug, info, warn, error)

EXIT CODES:
    0  Success
    1  Failure
    2  Configuration error
",
        version
    );
}

/// Print detailed help for a specific command.
pub fn print_command_help(command: &str) {
    match command {
        "serve" => print_serve_help(),
        "encrypt" | "decrypt" => print_codec_help(command),
        "keygen" => print_keygen_help(),
        "config" => print_config_help(),
        _ => {
            eprintln!(
                "No detailed help available for '{}'. Use 'spam-guard help' for general usage.",
                command
            );
        }
    }
}

fn print_serve_help() {
    eprintln!(
        "spam-guard serve - Run the prediction service

USAGE:
    spam-guard serve [OPTIONS]

OPTIONS:
    --config FILE     Load configuration from file
    --bind ADDR       Override listener address
    --key-env VAR     Read the artifact key from VAR

DESCRIPTION:
    In encrypted mode, decrypts the classifier and vectorizer in place,
    loads them, and re-encrypts them before binding the listener. Any
    failure aborts startup before the listener is bound.

ENDPOINTS:
    POST /predict   {{\"emails\": [...]}} -> [label, ...]
    GET  /health    Service status and label set
"
    );
}

fn print_codec_help(command: &str) {
    eprintln!(
        "spam-guard {0} - {0} files in place

USAGE:
    spam-guard {0} [FILE...] [OPTIONS]

OPTIONS:
    --config FILE     Load configuration from file
    --key-env VAR     Read the artifact key from VAR

DESCRIPTION:
    With no FILE arguments, acts on the configured model and vectorizer.

EXIT CODES:
    0  All files processed
    1  One or more files failed
    2  Configuration or key error
",
        command
    );
}

fn print_keygen_help() {
    eprintln!(
        "spam-guard keygen - Generate an artifact key

USAGE:
    spam-guard keygen

DESCRIPTION:
    Prints a random 256-bit key as URL-safe base64, suitable for
    SPAM_GUARD_KEY.
"
    );
}

fn print_config_help() {
    eprintln!(
        "spam-guard config - Inspect configuration

USAGE:
    spam-guard config <SUBCOMMAND> [--config FILE]

SUBCOMMANDS:
    show           Show resolved configuration
    validate       Validate configuration
    defaults       Show default configuration
"
    );
}
