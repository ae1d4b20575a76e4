use std::collections::HashMap;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::ExecError;

/// Distinct patterns one invocation may compile.
pub const PATTERN_CACHE_CAPACITY: usize = 10;

/// Compiled patterns for one invocation.
///
/// Never evicts: once full, new sources are refused while cached ones keep
/// working. Malformed sources are not cached.
#[derive(Debug, Default)]
pub struct PatternCache {
    compiled: HashMap<String, Regex>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile(&mut self, source: &str) -> Result<Regex, ExecError> {
        if let Some(cached) = self.compiled.get(source) {
            return Ok(cached.clone());
        }

        if self.compiled.len() >= PATTERN_CACHE_CAPACITY {
            warn!("Pattern cache full ({PATTERN_CACHE_CAPACITY}), refusing new pattern");
            return Err(ExecError::PatternCacheFull {
                capacity: PATTERN_CACHE_CAPACITY,
            });
        }

        let compiled = Regex::new(source)?;
        debug!("Compiled pattern #{}: {source}", self.compiled.len() + 1);
        self.compiled.insert(source.to_string(), compiled.clone());
        Ok(compiled)
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}
