use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum WindowParseError {
    #[error("Invalid time window '{0}': expected HH:MM-HH:MM")]
    Format(String),

    #[error("Invalid time window '{0}': end must be after start")]
    Empty(String),
}

/// Half-open IST time window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, WindowParseError> {
        if end <= start {
            return Err(WindowParseError::Empty(format!("{}-{}", start, end)));
        }
        Ok(Self { start, end })
    }

    /// Build from hour/minute pairs; used for compile-time known windows.
    fn from_hm(start: (u32, u32), end: (u32, u32)) -> Option<Self> {
        let start = NaiveTime::from_hms_opt(start.0, start.1, 0)?;
        let end = NaiveTime::from_hms_opt(end.0, end.1, 0)?;
        Self::new(start, end).ok()
    }

    /// Default admissible windows: 10:30-13:00 and 13:45-14:30 IST
    pub fn defaults() -> Vec<TimeWindow> {
        [((10, 30), (13, 0)), ((13, 45), (14, 30))]
            .into_iter()
            .filter_map(|(s, e)| Self::from_hm(s, e))
            .collect()
    }

    /// Parse `"HH:MM-HH:MM"`.
    pub fn parse(raw: &str) -> Result<Self, WindowParseError> {
        let (start, end) = raw
            .trim()
            .split_once('-')
            .ok_or_else(|| WindowParseError::Format(raw.to_string()))?;
        let start = NaiveTime::parse_from_str(start.trim(), "%H:%M")
            .map_err(|_| WindowParseError::Format(raw.to_string()))?;
        let end = NaiveTime::parse_from_str(end.trim(), "%H:%M")
            .map_err(|_| WindowParseError::Format(raw.to_string()))?;
        Self::new(start, end).map_err(|_| WindowParseError::Empty(raw.trim().to_string()))
    }

    /// Parse a comma-separated list of windows.
    pub fn parse_list(raw: &str) -> Result<Vec<TimeWindow>, WindowParseError> {
        raw.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(Self::parse)
            .collect()
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        time >= self.start && time < self.end
    }

    /// 1.0 at the centre of the window falling linearly to 0.0 at its edges;
    /// 0.0 outside.
    pub fn centrality(&self, time: NaiveTime) -> f64 {
        if !self.contains(time) {
            return 0.0;
        }
        let start = minutes(self.start);
        let end = minutes(self.end);
        let half_width = (end - start) / 2.0;
        if half_width <= 0.0 {
            return 0.0;
        }
        let center = start + half_width;
        (1.0 - (minutes(time) - center).abs() / half_width).clamp(0.0, 1.0)
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

fn minutes(time: NaiveTime) -> f64 {
    time.num_seconds_from_midnight() as f64 / 60.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_defaults() {
        let windows = TimeWindow::defaults();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].to_string(), "10:30-13:00");
        assert_eq!(windows[1].to_string(), "13:45-14:30");
    }

    #[test]
    fn test_half_open_bounds() {
        let w = TimeWindow::parse("10:30-13:00").unwrap();
        assert!(w.contains(t(10, 30)));
        assert!(w.contains(t(12, 59)));
        assert!(!w.contains(t(13, 0)));
        assert!(!w.contains(t(10, 29)));
    }

    #[test]
    fn test_centrality() {
        let w = TimeWindow::parse("10:30-13:00").unwrap();
        assert!((w.centrality(t(11, 45)) - 1.0).abs() < 1e-9);
        assert!((w.centrality(t(11, 30)) - 0.8).abs() < 1e-9);
        assert!((w.centrality(t(10, 30)) - 0.0).abs() < 1e-9);
        assert_eq!(w.centrality(t(14, 0)), 0.0);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(TimeWindow::parse("1030-1300"), Err(WindowParseError::Format(_))));
        assert!(matches!(TimeWindow::parse("13:00-10:30"), Err(WindowParseError::Empty(_))));
        let list = TimeWindow::parse_list("10:30-13:00, 13:45-14:30").unwrap();
        assert_eq!(list, TimeWindow::defaults());
    }
}
