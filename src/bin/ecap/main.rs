//! Thin CLI over the `ecap_core` library: file I/O, password prompting,
//! config defaults, and exit-code mapping. All codec logic lives in the
//! library.

mod cli;
mod config;
mod exit_codes;
mod prompt;

use clap::Parser;
use cli::{Cli, Commands, DecodeArgs, EncodeArgs};
use ecap_core::EncodeOptions;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Encode(args) => run_encode(args),
        Commands::Decode(args) => run_decode(args),
    }
}

fn run_encode(args: EncodeArgs) -> ExitCode {
    let carrier = match std::fs::read(&args.carrier) {
        Ok(bytes) => bytes,
        Err(err) => return fail_io(&format!("reading carrier {}", args.carrier.display()), err),
    };

    let message = match read_input(&args.message) {
        Ok(bytes) => bytes,
        Err(err) => return fail_io("reading message", err),
    };

    let defaults = match config::load_defaults() {
        Ok(defaults) => defaults,
        Err(err) => {
            eprintln!("warning: could not load config, using built-in defaults: {err}");
            config::Defaults::default()
        }
    };

    let password = match prompt::prompt_password("Password: ") {
        Ok(pw) => pw,
        Err(err) => {
            eprintln!("error: {err}");
            return exit_codes::exit_code_for_prompt_error(&err);
        }
    };

    let carrier_ext = args
        .carrier
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    let options = EncodeOptions {
        bits_per_channel: args.bits_per_channel.unwrap_or(defaults.bits_per_channel),
        max_pixels: defaults.png_pixel_ceiling,
        preferred_log_n: defaults.preferred_log_n,
    };

    let encoded = match ecap_core::encode_with_options(
        &carrier,
        carrier_ext,
        &message,
        password.as_bytes(),
        options,
    ) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("error: {err}");
            return exit_codes::exit_code_for_ecap_error(&err);
        }
    };

    if let Err(err) = std::fs::write(&args.out, encoded) {
        return fail_io(&format!("writing {}", args.out.display()), err);
    }

    ExitCode::SUCCESS
}

fn run_decode(args: DecodeArgs) -> ExitCode {
    let carrier = match std::fs::read(&args.carrier) {
        Ok(bytes) => bytes,
        Err(err) => return fail_io(&format!("reading carrier {}", args.carrier.display()), err),
    };

    let password = match prompt::prompt_password("Password: ") {
        Ok(pw) => pw,
        Err(err) => {
            eprintln!("error: {err}");
            return exit_codes::exit_code_for_prompt_error(&err);
        }
    };

    let decoded = match ecap_core::decode(&carrier, password.as_bytes()) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("error: {err}");
            return exit_codes::exit_code_for_ecap_error(&err);
        }
    };

    if let Err(err) = write_output(&args.out, &decoded) {
        return fail_io(&format!("writing {}", args.out.display()), err);
    }

    ExitCode::SUCCESS
}

fn read_input(path: &Path) -> io::Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        io::stdin().lock().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read(path)
    }
}

fn write_output(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if path.as_os_str() == "-" {
        io::stdout().lock().write_all(bytes)
    } else {
        std::fs::write(path, bytes)
    }
}

fn fail_io(context: &str, err: io::Error) -> ExitCode {
    eprintln!("error: {context}: {err}");
    exit_codes::exit_code_for_io_error(&err)
}
