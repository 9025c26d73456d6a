use std::sync::Arc;

use anyhow::{Context, Result};

use crate::env_utils::parse_bool_env;
use crate::trace::{NoopSink, SharedTraceSink, TracingSink};

const DEBUG_TRACE_ENV: &str = "EMBERDB_DEBUG_TRACE";
const DEBUG_TRACE_DEFAULT: bool = true;

/// Process-level settings for databases and collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// When false, collections created from this config report to a no-op sink.
    pub debug_trace: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            debug_trace: DEBUG_TRACE_DEFAULT,
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Result<Self> {
        let debug_trace = parse_bool_env(DEBUG_TRACE_ENV, DEBUG_TRACE_DEFAULT)
            .context("invalid trace configuration")?;
        Ok(Self { debug_trace })
    }

    pub fn trace_sink(&self) -> SharedTraceSink {
        if self.debug_trace {
            Arc::new(TracingSink::new(true))
        } else {
            Arc::new(NoopSink)
        }
    }
}
