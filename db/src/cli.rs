//! Command-line and JSON-config parsing for the server binary.
//!
//! Own flags (`-p -d -s -f -c`) flattened onto a handful of ambient ones
//! (logging, autosave cadence).

use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use serde::Deserialize;

use crate::errors::ServerError;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "In-memory vector database with KD-tree nearest-neighbor search")]
pub struct ServerConfig {
    /// Listen port
    #[arg(short = 'p', long, default_value_t = 8888)]
    pub port: u16,

    /// Configured vector dimension D
    #[arg(short = 'd', long, default_value_t = 3)]
    pub dimension: usize,

    /// Expected vector size enforced at the adapter (should equal dimension)
    #[arg(short = 's', long, default_value_t = 3)]
    pub vector_size: usize,

    /// Persistence file path
    #[arg(short = 'f', long, default_value = "vector_database.db")]
    pub file: PathBuf,

    /// Optional JSON config file overriding the flags above
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Log level passed to the tracing subscriber's env filter
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// How often the background task checks for unsaved writes
    #[arg(long, default_value_t = 1000 * 60 * 5)]
    pub persistence_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8888,
            dimension: 3,
            vector_size: 3,
            file: PathBuf::from("vector_database.db"),
            config: None,
            log_level: String::from("info"),
            persistence_interval_ms: 1000 * 60 * 5,
        }
    }
}

/// The subset of keys a `-c` JSON config file may override, named exactly
/// as the source lineage's config file does.
#[derive(Deserialize, Debug, Default)]
struct JsonOverrides {
    #[serde(rename = "DB_FILENAME")]
    db_filename: Option<PathBuf>,
    #[serde(rename = "DEFAULT_PORT")]
    default_port: Option<u16>,
    #[serde(rename = "DEFAULT_KD_TREE_DIMENSION")]
    default_kd_tree_dimension: Option<usize>,
    #[serde(rename = "DB_VECTOR_SIZE")]
    db_vector_size: Option<usize>,
}

impl ServerConfig {
    /// Parses `std::env::args`, then overlays `-c`'s JSON config (if any) on
    /// top - an explicit CLI flag always wins over the config file, and the
    /// config file always wins over a field's bare default.
    pub fn parse_with_overrides() -> Result<Self, ServerError> {
        let matches = Self::command().get_matches();
        Self::from_matches(matches)
    }

    fn from_matches(matches: ArgMatches) -> Result<Self, ServerError> {
        let config = Self::from_arg_matches(&matches)
            .expect("clap derive guarantees ServerConfig parses from its own ArgMatches");
        config.apply_config_file(&matches)
    }

    /// Applies `self.config`'s JSON overrides on top of the already-parsed
    /// CLI flags, skipping any field the user set explicitly on the command
    /// line - `matches` is how that distinction is recovered, since by the
    /// time `self` exists every field already carries either an explicit
    /// value or its clap default and the two are otherwise indistinguishable.
    fn apply_config_file(mut self, matches: &ArgMatches) -> Result<Self, ServerError> {
        let Some(path) = self.config.clone() else {
            return Ok(self);
        };
        let contents = std::fs::read_to_string(&path)?;
        let overrides: JsonOverrides = serde_json::from_str(&contents).map_err(|e| {
            ServerError::MalformedRequest(format!("invalid config file {path:?}: {e}"))
        })?;

        let set_on_cli = |id: &str| matches!(matches.value_source(id), Some(ValueSource::CommandLine));

        if let Some(file) = overrides.db_filename {
            if !set_on_cli("file") {
                self.file = file;
            }
        }
        if let Some(port) = overrides.default_port {
            if !set_on_cli("port") {
                self.port = port;
            }
        }
        if let Some(dimension) = overrides.default_kd_tree_dimension {
            if !set_on_cli("dimension") {
                self.dimension = dimension;
            }
        }
        if let Some(vector_size) = overrides.db_vector_size {
            if !set_on_cli("vector_size") {
                self.vector_size = vector_size;
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> ServerConfig {
        let mut argv = vec!["vector-db"];
        argv.extend_from_slice(args);
        let matches = ServerConfig::command().try_get_matches_from(argv).unwrap();
        ServerConfig::from_matches(matches).unwrap()
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(
            &config_path,
            r#"{"DB_FILENAME": "custom.db", "DEFAULT_PORT": 9999, "DEFAULT_KD_TREE_DIMENSION": 5, "DB_VECTOR_SIZE": 5}"#,
        )
        .unwrap();

        let config = parse(&["-c", config_path.to_str().unwrap()]);

        assert_eq!(config.file, PathBuf::from("custom.db"));
        assert_eq!(config.port, 9999);
        assert_eq!(config.dimension, 5);
        assert_eq!(config.vector_size, 5);
    }

    #[test]
    fn missing_config_flag_leaves_defaults_untouched() {
        let config = parse(&[]);
        assert_eq!(config.port, 8888);
    }

    #[test]
    fn explicit_cli_flag_wins_over_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{"DEFAULT_PORT": 7000}"#).unwrap();

        let config = parse(&["-p", "9000", "-c", config_path.to_str().unwrap()]);

        assert_eq!(config.port, 9000);
    }
}
