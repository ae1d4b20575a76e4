use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::ExecError;
use crate::sandbox::{InvocationContext, MAX_SECONDS_SLEPT};
use crate::state::snowflake_time;

impl InvocationContext {
    /// Pauses the invocation. All pauses share one budget of
    /// [`MAX_SECONDS_SLEPT`] seconds; a request that would exceed it is
    /// refused and does not sleep at all.
    pub async fn sleep(&mut self, seconds: i64) -> Result<(), ExecError> {
        if seconds < 1 {
            return Err(ExecError::InvalidArgument(
                "sleep duration must be at least 1 second".to_string(),
            ));
        }
        let seconds = seconds as u64;

        let (exceeded, total) = self.governor.check_sleep(seconds);
        if exceeded {
            warn!("Rejected sleep of {seconds}s: {total}s of {MAX_SECONDS_SLEPT}s already used");
            return Err(ExecError::SleepBudgetExceeded {
                requested: seconds,
                slept: total,
                max: MAX_SECONDS_SLEPT,
            });
        }

        debug!("Sleeping {seconds}s ({total}s of {MAX_SECONDS_SLEPT}s used)");
        tokio::time::sleep(Duration::from_secs(seconds)).await;
        Ok(())
    }

    /// Account creation time of the triggering member.
    pub fn current_user_created(&self) -> Option<DateTime<Utc>> {
        self.member.as_ref().map(|m| snowflake_time(m.user.id))
    }

    pub fn current_user_age_minutes(&self) -> Option<i64> {
        self.current_user_created()
            .map(|created| (Utc::now() - created).num_minutes())
    }

    /// Account age of the triggering member in years, days and hours,
    /// e.g. `"2 years, 10 days and 1 hour"`.
    pub fn current_user_age_human(&self) -> Option<String> {
        self.current_user_created()
            .map(|created| humanize_hours(Utc::now() - created))
    }
}

/// Formats a duration down to whole hours. Anything shorter than an hour
/// reads "Less than an hour".
fn humanize_hours(age: chrono::Duration) -> String {
    let hours = age.num_hours().max(0);
    let units = [
        (hours / (24 * 365), "year"),
        (hours % (24 * 365) / 24, "day"),
        (hours % 24, "hour"),
    ];

    let parts: Vec<String> = units
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| match n {
            1 => format!("1 {unit}"),
            n => format!("{n} {unit}s"),
        })
        .collect();

    match parts.as_slice() {
        [] => "Less than an hour".to_string(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}
