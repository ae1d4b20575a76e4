//! Regular-expression host functions.
//!
//! Patterns are compiled through the invocation's [`PatternCache`], so a
//! script can use at most ten distinct patterns. Multi-result operations are
//! capped regardless of the count a script asks for.
//!
//! [`PatternCache`]: crate::sandbox::PatternCache

use crate::error::ExecError;
use crate::sandbox::InvocationContext;

pub const FIND_ALL_CAP: usize = 1000;
pub const SUBMATCH_CAP: usize = 100;
pub const SPLIT_CAP: usize = 500;

/// A requested count of zero, a negative count, or one above the cap all
/// mean "up to the cap".
fn effective_count(requested: Option<i64>, cap: usize) -> usize {
    match requested.and_then(|n| usize::try_from(n).ok()) {
        Some(n) if n > 0 && n <= cap => n,
        _ => cap,
    }
}

impl InvocationContext {
    /// First match, or an empty string.
    pub fn re_find(&mut self, pattern: &str, text: &str) -> Result<String, ExecError> {
        let re = self.patterns.compile(pattern)?;
        Ok(re
            .find(text)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default())
    }

    pub fn re_find_all(
        &mut self,
        pattern: &str,
        text: &str,
        count: Option<i64>,
    ) -> Result<Vec<String>, ExecError> {
        let re = self.patterns.compile(pattern)?;
        let n = effective_count(count, FIND_ALL_CAP);
        Ok(re
            .find_iter(text)
            .take(n)
            .map(|m| m.as_str().to_string())
            .collect())
    }

    /// Every match with its capture groups. Groups that did not participate
    /// are empty strings.
    pub fn re_find_all_submatches(
        &mut self,
        pattern: &str,
        text: &str,
        count: Option<i64>,
    ) -> Result<Vec<Vec<String>>, ExecError> {
        let re = self.patterns.compile(pattern)?;
        let n = effective_count(count, SUBMATCH_CAP);
        Ok(re
            .captures_iter(text)
            .take(n)
            .map(|caps| {
                caps.iter()
                    .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect()
            })
            .collect())
    }

    /// Replaces every match. `$1` / `${name}` in `replacement` expand to groups.
    pub fn re_replace(
        &mut self,
        pattern: &str,
        text: &str,
        replacement: &str,
    ) -> Result<String, ExecError> {
        let re = self.patterns.compile(pattern)?;
        Ok(re.replace_all(text, replacement).into_owned())
    }

    pub fn re_split(
        &mut self,
        pattern: &str,
        text: &str,
        count: Option<i64>,
    ) -> Result<Vec<String>, ExecError> {
        let re = self.patterns.compile(pattern)?;
        let n = effective_count(count, SPLIT_CAP);
        Ok(re.splitn(text, n).map(str::to_string).collect())
    }
}
