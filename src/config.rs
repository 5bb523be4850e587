use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

pub const DEPTH_VAR: &str = "MAILBOX_CHESS_DEPTH";
pub const MOVETIME_VAR: &str = "MAILBOX_CHESS_MOVETIME_MS";
pub const ENGINE_VAR: &str = "MAILBOX_CHESS_ENGINE";

/// Per-request search budget handed to the analysis engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub depth: u32,
    pub movetime: Duration,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            depth: 4,
            movetime: Duration::from_millis(1000),
        }
    }
}

/// Settings for a front-end session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    pub limits: SearchLimits,
    /// Command line of an external UCI engine; in-process analysis when unset.
    pub engine_command: Option<String>,
}

impl SessionConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = SessionConfig::default();
        if let Some(depth) = lookup(DEPTH_VAR) {
            config.limits.depth = depth
                .trim()
                .parse()
                .with_context(|| format!("{} must be a positive integer, got '{}'", DEPTH_VAR, depth))?;
        }
        if let Some(millis) = lookup(MOVETIME_VAR) {
            let millis: u64 = millis
                .trim()
                .parse()
                .with_context(|| format!("{} must be milliseconds, got '{}'", MOVETIME_VAR, millis))?;
            config.limits.movetime = Duration::from_millis(millis);
        }
        config.engine_command = lookup(ENGINE_VAR).filter(|command| !command.trim().is_empty());
        Ok(config)
    }
}
