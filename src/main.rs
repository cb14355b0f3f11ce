//! Evaluar CLI
//!
//! Single-command evaluation entry point for the evaluar library.
//!
//! # Usage
//!
//! ```bash
//! # Run the default scenario (rescnn checkpoint, L1 criterion)
//! evaluar
//!
//! # Evaluate a specific checkpoint
//! evaluar --checkpoint checkpoints/lstm_epoch5.safetensors --model-type lstm
//!
//! # Score in model-output space with mixed precision
//! evaluar --raw --amp
//! ```

use clap::Parser;
use evaluar::cli::{run_command, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
