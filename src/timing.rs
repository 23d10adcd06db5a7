//! Care-interval arithmetic shared by the CLI and the reminder daemon.

use crate::error::TendError;
use std::time::{SystemTime, UNIX_EPOCH};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock set before the unix epoch")
        .as_millis() as i64
}

/// Absolute timestamp of the next due care action.
///
/// A non-positive frequency lands at or before `now`; callers treat that as
/// already due.
pub fn next_due_millis(frequency_hours: f64, now_millis: i64) -> i64 {
    now_millis + (frequency_hours * MILLIS_PER_HOUR).round() as i64
}

/// Whether a care action may be recorded as done at `now_millis`.
/// Allowed from the due instant onwards, including the boundary.
pub fn is_action_allowed(time_to_next_action: i64, now_millis: i64) -> bool {
    now_millis >= time_to_next_action
}

/// Countdown text shown next to an entry.
///
/// The "Now" and minute branches report remaining time; the hour and day
/// branches report the configured interval itself.
pub fn time_remaining_label(frequency_hours: f64, last_done_millis: i64, now_millis: i64) -> String {
    let hours_since = (now_millis - last_done_millis) as f64 / MILLIS_PER_HOUR;
    let hours_remaining = (frequency_hours - hours_since).max(0.0);

    if hours_remaining == 0.0 {
        "Now".to_string()
    } else if hours_remaining < 1.0 {
        format!("In {}m", (hours_remaining * 60.0).round() as i64)
    } else if frequency_hours < 24.0 {
        format!("In {}h", frequency_hours.round() as i64)
    } else {
        format!("In {}d", (frequency_hours / 24.0).round() as i64)
    }
}

/// Parses a care interval like "1d 2h 30m" into hours.
pub fn parse_frequency(input: &str) -> Result<f64, TendError> {
    let mut hours = 0.0;

    for part in input.split_whitespace() {
        let unit = part.chars().last().unwrap_or(' ');
        let value_str = &part[..part.len() - unit.len_utf8()];

        let value: u64 = value_str.parse().map_err(|_| TendError::InvalidFrequency {
            input: input.to_string(),
            reason: format!("'{value_str}' is not a whole number"),
        })?;

        match unit {
            'd' => hours += value as f64 * 24.0,
            'h' => hours += value as f64,
            'm' => hours += value as f64 / 60.0,
            _ => {
                return Err(TendError::InvalidFrequency {
                    input: input.to_string(),
                    reason: format!("unknown unit '{unit}', possible values: d, h, m"),
                });
            }
        }
    }

    if hours <= 0.0 {
        return Err(TendError::InvalidFrequency {
            input: input.to_string(),
            reason: "interval must be positive".to_string(),
        });
    }

    Ok(hours)
}
