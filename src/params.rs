// src/params.rs
//! Run parameters from the trigger query string. Each value falls back on its own.

use serde::Serialize;
use std::collections::HashMap;

pub const DEFAULT_HOURS: u32 = 24;
pub const DEFAULT_TOP_N: usize = 10;
/// Largest accepted look-back (ten years). Anything above takes the default.
pub const MAX_HOURS: u32 = 24 * 365 * 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunParams {
    /// Look-back window in hours.
    pub hours: u32,
    /// Maximum number of items to select.
    pub top_n: usize,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            hours: DEFAULT_HOURS,
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// Parse a strictly positive integer, else `default`. Missing, blank,
/// non-numeric, zero and negative all take the default.
pub fn positive_or<T>(raw: Option<&str>, default: T) -> T
where
    T: std::str::FromStr + PartialOrd + Default,
{
    raw.map(str::trim)
        .and_then(|s| s.parse::<T>().ok())
        .filter(|v| *v > T::default())
        .unwrap_or(default)
}

impl RunParams {
    pub fn new(hours: u32, top_n: usize) -> Self {
        Self {
            hours: bounded_hours(hours),
            top_n: if top_n == 0 { DEFAULT_TOP_N } else { top_n },
        }
    }

    pub fn from_query(q: &HashMap<String, String>) -> Self {
        Self {
            hours: bounded_hours(positive_or(q.get("hours").map(String::as_str), DEFAULT_HOURS)),
            top_n: positive_or(q.get("top_n").map(String::as_str), DEFAULT_TOP_N),
        }
    }

    /// Saturates instead of panicking when `hours` was set directly past `MAX_HOURS`.
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::try_hours(i64::from(self.hours)).unwrap_or(chrono::Duration::MAX)
    }
}

fn bounded_hours(hours: u32) -> u32 {
    if hours == 0 || hours > MAX_HOURS {
        DEFAULT_HOURS
    } else {
        hours
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn invalid_values_fall_back_independently() {
        let p = RunParams::from_query(&q(&[("hours", "abc"), ("top_n", "5")]));
        assert_eq!(p, RunParams { hours: 24, top_n: 5 });

        let p = RunParams::from_query(&q(&[("hours", "48"), ("top_n", "-3")]));
        assert_eq!(p, RunParams { hours: 48, top_n: 10 });
    }

    #[test]
    fn zero_and_missing_use_defaults() {
        assert_eq!(RunParams::from_query(&q(&[("hours", "0"), ("top_n", "0")])), RunParams::default());
        assert_eq!(RunParams::from_query(&HashMap::new()), RunParams::default());
        assert_eq!(RunParams::new(0, 0), RunParams::default());
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        let p = RunParams::from_query(&q(&[("hours", " 6 ")]));
        assert_eq!(p.hours, 6);
        assert_eq!(p.window(), chrono::Duration::hours(6));
    }

    #[test]
    fn oversized_hours_fall_back_to_default() {
        let p = RunParams::from_query(&q(&[("hours", "4000000000"), ("top_n", "3")]));
        assert_eq!(p, RunParams { hours: 24, top_n: 3 });

        let over = (MAX_HOURS + 1).to_string();
        assert_eq!(RunParams::from_query(&q(&[("hours", &over)])).hours, DEFAULT_HOURS);
        let max = MAX_HOURS.to_string();
        assert_eq!(RunParams::from_query(&q(&[("hours", &max)])).hours, MAX_HOURS);
        assert_eq!(RunParams::new(u32::MAX, 1).hours, DEFAULT_HOURS);
    }

    #[test]
    fn window_saturates_for_hand_built_params() {
        let p = RunParams { hours: u32::MAX, top_n: 1 };
        assert_eq!(p.window(), chrono::Duration::MAX);
    }
}
