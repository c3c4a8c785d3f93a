//! CLI module for pagewright - command-line interface and subcommands.
//!
//! Provides the entry point with subcommands for single-record generation,
//! batch processing, and offline validation of an existing spec.

pub mod commands;

pub use commands::Cli;
