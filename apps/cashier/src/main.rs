//! # Kasir Cashier Entry Point
//!
//! The actual setup is in lib.rs for better testability.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match kasir_cashier::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("kasir-cashier: {}", e.message);
            ExitCode::FAILURE
        }
    }
}
