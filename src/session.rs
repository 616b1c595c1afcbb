//! Session state carried across loop iterations: alert counters, event log, FPS.

use chrono::NaiveTime;
use std::fmt;
use std::time::Instant;

use crate::detect::Detection;

/// Only this many trailing log entries are compared when suppressing repeats.
pub const DEDUP_WINDOW: usize = 5;

/// Number of log lines shown in the shutdown summary.
pub const SUMMARY_TAIL: usize = 10;

/// Frames between FPS refreshes.
pub const FPS_SAMPLE_FRAMES: u32 = 30;

/// `[HH:MM:SS] <alert> - Confidence: <pct>%`
pub fn format_event(at: NaiveTime, detection: &Detection) -> String {
    format!(
        "[{}] {} - Confidence: {}%",
        at.format("%H:%M:%S"),
        detection.alert,
        detection.percent()
    )
}

/// Cumulative alert count and event log for one monitoring session.
///
/// Both grow until the process exits unless the operator resets them.
#[derive(Debug, Default)]
pub struct SessionCounters {
    total_alerts: u64,
    events: Vec<String>,
}

impl SessionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_alerts(&self) -> u64 {
        self.total_alerts
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    pub fn add_alerts(&mut self, count: usize) {
        self.total_alerts += count as u64;
    }

    /// Append `line` unless it already appears among the last [`DEDUP_WINDOW`]
    /// entries. Returns whether it was recorded.
    pub fn record_event(&mut self, line: String) -> bool {
        let start = self.events.len().saturating_sub(DEDUP_WINDOW);
        if self.events[start..].contains(&line) {
            return false;
        }
        self.events.push(line);
        true
    }

    /// Zero the alert count and drop the whole event log.
    pub fn reset(&mut self) {
        self.total_alerts = 0;
        self.events.clear();
    }

    pub fn summary(&self) -> SessionSummary {
        let start = self.events.len().saturating_sub(SUMMARY_TAIL);
        SessionSummary {
            total_alerts: self.total_alerts,
            distinct_events: self.events.len(),
            recent_events: self.events[start..].to_vec(),
        }
    }
}

/// What gets printed when the session ends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSummary {
    pub total_alerts: u64,
    pub distinct_events: usize,
    /// The last [`SUMMARY_TAIL`] log lines, oldest first.
    pub recent_events: Vec<String>,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(70);
        writeln!(f, "{rule}")?;
        writeln!(f, "SESSION SUMMARY")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Total alerts raised: {}", self.total_alerts)?;
        writeln!(f, "Distinct events logged: {}", self.distinct_events)?;
        if !self.recent_events.is_empty() {
            writeln!(f)?;
            writeln!(f, "Last {} events:", self.recent_events.len())?;
            for event in &self.recent_events {
                writeln!(f, "  {event}")?;
            }
        }
        writeln!(f)?;
        writeln!(f, "Monitor stopped.")?;
        write!(f, "{rule}")
    }
}

/// Coarse frame-rate estimate refreshed every [`FPS_SAMPLE_FRAMES`] frames.
#[derive(Debug)]
pub struct FpsMeter {
    frames: u32,
    window_start: Instant,
    fps: f64,
}

impl FpsMeter {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            frames: 0,
            window_start: start,
            fps: 0.0,
        }
    }

    pub fn tick(&mut self) -> f64 {
        self.tick_at(Instant::now())
    }

    /// Count one frame seen at `now`; returns the current estimate.
    pub fn tick_at(&mut self, now: Instant) -> f64 {
        self.frames += 1;
        if self.frames >= FPS_SAMPLE_FRAMES {
            let elapsed = now.saturating_duration_since(self.window_start).as_secs_f64();
            if elapsed > 0.0 {
                self.fps = self.frames as f64 / elapsed;
            }
            self.frames = 0;
            self.window_start = now;
        }
        self.fps
    }
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;
    use std::time::Duration;

    fn knife(confidence: f32) -> Detection {
        Detection {
            class_name: "knife".into(),
            alert: "KNIFE",
            confidence,
            bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
        }
    }

    #[test]
    fn event_line_format() {
        let at = NaiveTime::from_hms_opt(9, 5, 7).unwrap();
        assert_eq!(
            format_event(at, &knife(0.8)),
            "[09:05:07] KNIFE - Confidence: 80%"
        );
    }

    #[test]
    fn duplicates_inside_window_are_suppressed() {
        let mut session = SessionCounters::new();
        assert!(session.record_event("a".into()));
        assert!(!session.record_event("a".into()));
        for line in ["b", "c", "d", "e"] {
            assert!(session.record_event(line.into()));
        }
        // "a" is still the fifth-from-last entry.
        assert!(!session.record_event("a".into()));
        assert!(session.record_event("f".into()));
        // Now outside the window.
        assert!(session.record_event("a".into()));
        assert_eq!(session.events().len(), 7);
    }

    #[test]
    fn reset_clears_everything() {
        let mut session = SessionCounters::new();
        session.add_alerts(3);
        for i in 0..12 {
            session.record_event(format!("event {i}"));
        }
        session.reset();
        assert_eq!(session.total_alerts(), 0);
        assert!(session.events().is_empty());
        // A line recorded before the reset is accepted again.
        assert!(session.record_event("event 11".into()));
    }

    #[test]
    fn summary_keeps_last_ten_in_order() {
        let mut session = SessionCounters::new();
        for i in 0..14 {
            session.record_event(format!("event {i}"));
        }
        session.add_alerts(20);
        let summary = session.summary();
        assert_eq!(summary.total_alerts, 20);
        assert_eq!(summary.distinct_events, 14);
        let expected: Vec<String> = (4..14).map(|i| format!("event {i}")).collect();
        assert_eq!(summary.recent_events, expected);
    }

    #[test]
    fn short_log_is_summarized_whole() {
        let mut session = SessionCounters::new();
        session.record_event("only".into());
        assert_eq!(session.summary().recent_events, vec!["only".to_string()]);
    }

    #[test]
    fn summary_text_lists_totals_before_events() {
        let mut session = SessionCounters::new();
        session.add_alerts(2);
        session.record_event("[10:00:00] KNIFE - Confidence: 80%".into());
        let text = session.summary().to_string();
        let totals = text.find("Total alerts raised: 2").unwrap();
        let distinct = text.find("Distinct events logged: 1").unwrap();
        let event = text.find("KNIFE - Confidence: 80%").unwrap();
        assert!(totals < distinct && distinct < event);
    }

    #[test]
    fn fps_updates_every_thirty_frames() {
        let start = Instant::now();
        let mut meter = FpsMeter::starting_at(start);
        for i in 1..FPS_SAMPLE_FRAMES {
            let fps = meter.tick_at(start + Duration::from_millis(i as u64 * 10));
            assert_eq!(fps, 0.0);
        }
        let fps = meter.tick_at(start + Duration::from_secs(2));
        assert!((fps - 15.0).abs() < 1e-9);

        // The counter restarted: the estimate holds until the next window closes.
        let held = meter.tick_at(start + Duration::from_secs(3));
        assert!((held - 15.0).abs() < 1e-9);
    }
}
