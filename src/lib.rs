// ABOUTME: Library module for the LibertySoil to FreeFeed migrator
// ABOUTME: Exports the dump/import pipeline for use in the binary and tests

pub mod commands;
pub mod config;
pub mod dump;
pub mod error;
pub mod export;
pub mod import;
pub mod postgres;
pub mod tables;

/// One table row: column name to JSON value
pub type Row = serde_json::Map<String, serde_json::Value>;
