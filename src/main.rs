//! Spam-Guard entry point.
//!
//! Dispatches the serve command and the artifact codec utilities.

mod cli_parser;
mod runtime_init;

use std::process::ExitCode;

use spam_guard::telemetry;
use spam_guard::ArtifactKey;

use runtime_init::CodecDirection;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let mut command = args.get(1).map(|s| s.as_str()).unwrap_or("serve");
    let mut rest = args.get(2..).unwrap_or(&[]);

    // Bare options imply the default command.
    if command.starts_with("--") && !matches!(command, "--help" | "--version") {
        command = "serve";
        rest = args.get(1..).unwrap_or(&[]);
    }

    match command {
        "help" | "--help" | "-h" => {
            if let Some(sub) = args.get(2) {
                cli_parser::print_command_help(sub);
            } else {
                cli_parser::print_usage();
            }
            return ExitCode::SUCCESS;
        }
        "version" | "--version" | "-V" => {
            println!("Spam-Guard {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        "keygen" => {
            println!("{}", ArtifactKey::generate().to_base64());
            return ExitCode::SUCCESS;
        }
        _ => {}
    }

    if let Err(e) = telemetry::init_logging() {
        eprintln!("{}", e);
        return ExitCode::from(runtime_init::EXIT_CONFIG);
    }

    match command {
        "serve" => runtime_init::run_serve(rest).await,
        "encrypt" => runtime_init::run_codec(CodecDirection::Encrypt, rest),
        "decrypt" => runtime_init::run_codec(CodecDirection::Decrypt, rest),
        "config" => run_config_cmd(rest),
        _ => {
            eprintln!("Unknown command: {}", command);
            cli_parser::print_usage();
            ExitCode::FAILURE
        }
    }
}

fn run_config_cmd(args: &[String]) -> ExitCode {
    let sub = args.first().map(|s| s.as_str()).unwrap_or("show");
    let options = args.get(1..).unwrap_or(&[]);
    match sub {
        "show" => runtime_init::run_config_show(options),
        "defaults" => runtime_init::run_config_defaults(),
        "validate" => runtime_init::run_config_validate(options),
        _ => {
            eprintln!("Unknown config subcommand: {}", sub);
            cli_parser::print_command_help("config");
            ExitCode::FAILURE
        }
    }
}
