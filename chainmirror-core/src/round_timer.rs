//! Countdown and progress of a voting round, derived purely from epoch
//! timestamps (seconds).

pub const DEFAULT_VOTING_WINDOW_SECONDS: u64 = 86_400;

const SECONDS_PER_HOUR: u64 = 3_600;
const SECONDS_PER_MINUTE: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundTiming {
    pub round_start_time: Option<i64>,
    pub round_end_time: Option<i64>,
    pub current_round: u64,
    pub total_blocks: u64,
    pub voting_window_seconds: u64,
}

impl Default for RoundTiming {
    fn default() -> Self {
        Self {
            round_start_time: None,
            round_end_time: None,
            current_round: 1,
            total_blocks: 0,
            voting_window_seconds: DEFAULT_VOTING_WINDOW_SECONDS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundTimerSnapshot {
    pub time_remaining_seconds: u64,
    /// Only ever true when an end time is known.
    pub is_expired: bool,
    /// Within `0.0..=100.0`.
    pub round_progress_percentage: f64,
    pub formatted_time_remaining: String,
    pub current_round: u64,
    pub total_blocks: u64,
    pub voting_window_seconds: u64,
}

pub fn compute_snapshot(now: i64, timing: &RoundTiming) -> RoundTimerSnapshot {
    let end = timing.round_end_time.filter(|end| *end > 0);
    let start = timing.round_start_time.filter(|start| *start > 0);

    let time_remaining_seconds = end
        .map(|end| end.saturating_sub(now).max(0) as u64)
        .unwrap_or(0);
    let is_expired = end.is_some() && time_remaining_seconds == 0;

    let round_progress_percentage = match (start, end) {
        (Some(start), Some(end)) if end > start => {
            let elapsed = (now - start) as f64;
            let total = (end - start) as f64;
            (elapsed / total * 100.0).clamp(0.0, 100.0)
        }
        _ => 0.0,
    };

    RoundTimerSnapshot {
        time_remaining_seconds,
        is_expired,
        round_progress_percentage,
        formatted_time_remaining: format_time_remaining(time_remaining_seconds),
        current_round: timing.current_round,
        total_blocks: timing.total_blocks,
        voting_window_seconds: timing.voting_window_seconds,
    }
}

/// `"Xh Ym"`, `"Xm Ys"`, `"Xs"` or `"Expired"`; seconds are dropped once
/// hours are shown.
pub fn format_time_remaining(seconds: u64) -> String {
    if seconds == 0 {
        return "Expired".to_string();
    }
    let hours = seconds / SECONDS_PER_HOUR;
    let minutes = (seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let secs = seconds % SECONDS_PER_MINUTE;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(start: i64, end: i64) -> RoundTiming {
        RoundTiming {
            round_start_time: Some(start),
            round_end_time: Some(end),
            ..Default::default()
        }
    }

    #[test]
    fn test_round_start() {
        let snapshot = compute_snapshot(1_000, &timing(1_000, 4_600));
        assert_eq!(snapshot.round_progress_percentage, 0.0);
        assert_eq!(snapshot.time_remaining_seconds, 3_600);
        assert_eq!(snapshot.formatted_time_remaining, "1h 0m");
        assert!(!snapshot.is_expired);
    }

    #[test]
    fn test_round_halfway() {
        let snapshot = compute_snapshot(2_800, &timing(1_000, 4_600));
        assert_eq!(snapshot.round_progress_percentage, 50.0);
        assert_eq!(snapshot.formatted_time_remaining, "30m 0s");
    }

    #[test]
    fn test_round_expired() {
        let snapshot = compute_snapshot(5_000, &timing(1_000, 4_600));
        assert_eq!(snapshot.time_remaining_seconds, 0);
        assert!(snapshot.is_expired);
        assert_eq!(snapshot.formatted_time_remaining, "Expired");
        assert_eq!(snapshot.round_progress_percentage, 100.0);
    }

    #[test]
    fn test_missing_end_time_is_unknown_not_expired() {
        let snapshot = compute_snapshot(
            5_000,
            &RoundTiming {
                round_start_time: Some(1_000),
                ..Default::default()
            },
        );
        assert!(!snapshot.is_expired);
        assert_eq!(snapshot.time_remaining_seconds, 0);
        assert_eq!(snapshot.round_progress_percentage, 0.0);
        assert_eq!(snapshot.current_round, 1);
        assert_eq!(snapshot.voting_window_seconds, 86_400);
    }

    #[test]
    fn test_inverted_bounds_yield_no_progress() {
        let snapshot = compute_snapshot(2_000, &timing(4_600, 1_000));
        assert_eq!(snapshot.round_progress_percentage, 0.0);
    }

    #[test]
    fn test_format_boundaries() {
        assert_eq!(format_time_remaining(3_661), "1h 1m");
        assert_eq!(format_time_remaining(61), "1m 1s");
        assert_eq!(format_time_remaining(59), "59s");
        assert_eq!(format_time_remaining(0), "Expired");
    }
}
