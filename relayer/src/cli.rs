//! # CLI Interface
//!
//! Defines the command-line argument structure for `gasforward-relayer`
//! using `clap` derive. Three subcommands: `demo`, `keygen`, and
//! `version`.

use clap::{Parser, Subcommand};

/// GasForward relayer companion.
///
/// Runs a scripted end-to-end walkthrough of the gas futures ledger
/// (purchase → redeem → transfer) against in-memory collaborators, and
/// provides key tooling for intent signers.
#[derive(Parser, Debug)]
#[command(
    name = "gasforward-relayer",
    about = "GasForward relayer companion",
    version,
    propagate_version = true
)]
pub struct RelayerCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scripted ledger walkthrough.
    Demo(DemoArgs),
    /// Generate a fresh Ed25519 keypair and print its address.
    Keygen,
    /// Print version information and exit.
    Version,
}

/// Arguments for the `demo` subcommand.
#[derive(Parser, Debug)]
pub struct DemoArgs {
    /// Log output format: "pretty" or "json".
    #[arg(long, env = "GASFORWARD_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Purchase size in whole stablecoin.
    #[arg(long, default_value_t = 100)]
    pub amount: u64,

    /// Gas price to lock, gwei.
    #[arg(long, default_value_t = 20)]
    pub lock_price: u64,

    /// Gas price at redemption time, gwei. Must exceed the lock for the
    /// walkthrough's redemption to succeed.
    #[arg(long, default_value_t = 30)]
    pub current_price: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        RelayerCli::command().debug_assert();
    }
}
