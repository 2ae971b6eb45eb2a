//! `FFmpeg` `-stats` output parsing
//!
//! With `-stats`, ffmpeg rewrites one status line on stderr, separated by
//! carriage returns:
//!
//! ```text
//! frame=  240 fps= 24 q=28.0 size=    1024kB time=00:00:10.00 bitrate= 838.9kbits/s speed=1.00x
//! ```
//!
//! Chunks arrive at arbitrary boundaries, so [`StatsParser`] buffers the
//! unfinished tail and only parses complete segments.

use crate::utils::parse_ffmpeg_time;

/// One parsed status line.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EncodeStats {
    pub frame: u64,
    pub fps: f64,
    /// Output timestamp reached, in seconds
    pub time_secs: f64,
    /// Encoding speed relative to real time, when reported
    pub speed: Option<f64>,
}

impl EncodeStats {
    /// Percent complete given the media duration, capped at 100.
    #[must_use]
    pub fn percent(&self, duration_secs: f64) -> Option<f64> {
        (duration_secs > 0.0).then(|| (self.time_secs / duration_secs * 100.0).min(100.0))
    }

    /// Seconds left at the current speed.
    #[must_use]
    pub fn eta_secs(&self, duration_secs: f64) -> Option<f64> {
        let speed = self.speed.filter(|&s| s > 0.01)?;
        (duration_secs > self.time_secs).then(|| (duration_secs - self.time_secs) / speed)
    }
}

/// Incremental parser over raw stderr chunks.
#[derive(Debug, Clone, Default)]
pub struct StatsParser {
    pending: String,
    duration_secs: Option<f64>,
    latest: Option<EncodeStats>,
}

impl StatsParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk; returns the newest complete status line, if any.
    pub fn feed(&mut self, chunk: &str) -> Option<EncodeStats> {
        self.pending.push_str(chunk);
        let mut newest = None;

        while let Some(end) = self.pending.find(['\r', '\n']) {
            let segment: String = self.pending.drain(..=end).collect();
            let line = segment.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(duration) = parse_duration_line(line) {
                self.duration_secs = Some(duration);
            } else if let Some(stats) = parse_stats_line(line) {
                newest = Some(stats);
            }
        }

        if newest.is_some() {
            self.latest = newest;
        }
        newest
    }

    /// Media duration, once a `Duration:` line has been seen.
    #[must_use]
    pub fn duration_secs(&self) -> Option<f64> {
        self.duration_secs
    }

    /// Lets callers that know the duration from elsewhere supply it.
    pub fn set_duration_secs(&mut self, duration_secs: f64) {
        if duration_secs.is_finite() && duration_secs > 0.0 {
            self.duration_secs = Some(duration_secs);
        }
    }

    #[must_use]
    pub fn latest(&self) -> Option<EncodeStats> {
        self.latest
    }
}

/// Value following `key=` in a stats line, with ffmpeg's padding removed.
fn field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("{key}=");
    let mut search_from = 0;
    while let Some(offset) = line[search_from..].find(&needle) {
        let start = search_from + offset;
        let at_boundary = start == 0 || line[..start].ends_with(char::is_whitespace);
        if at_boundary {
            let value = line[start + needle.len()..].trim_start();
            return value.split_whitespace().next();
        }
        search_from = start + needle.len();
    }
    None
}

/// Parses a `frame= ... time= ... speed=` status line.
#[must_use]
pub fn parse_stats_line(line: &str) -> Option<EncodeStats> {
    let frame = field(line, "frame")?.parse::<u64>().ok()?;
    let time_secs = field(line, "time").and_then(parse_ffmpeg_time).unwrap_or(0.0);
    let fps = field(line, "fps")
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(0.0);
    let speed = field(line, "speed")
        .and_then(|v| v.trim_end_matches('x').parse::<f64>().ok())
        .filter(|s| s.is_finite());

    Some(EncodeStats {
        frame,
        fps,
        time_secs,
        speed,
    })
}

/// Parses `Duration: 00:01:30.50, start: ...` into seconds.
#[must_use]
pub fn parse_duration_line(line: &str) -> Option<f64> {
    let rest = line.trim_start().strip_prefix("Duration:")?;
    let value = rest.trim_start().split(',').next()?;
    parse_ffmpeg_time(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "frame=  240 fps= 24 q=28.0 size=    1024kB time=00:00:10.00 bitrate= 838.9kbits/s speed=1.00x";

    #[test]
    fn parses_padded_stats_line() {
        let stats = parse_stats_line(LINE).unwrap();
        assert_eq!(stats.frame, 240);
        assert_eq!(stats.fps, 24.0);
        assert_eq!(stats.time_secs, 10.0);
        assert_eq!(stats.speed, Some(1.0));
    }

    #[test]
    fn speed_na_is_none() {
        let stats = parse_stats_line("frame=    0 fps=0.0 q=0.0 size=0kB time=N/A bitrate=N/A speed=N/A").unwrap();
        assert_eq!(stats.frame, 0);
        assert_eq!(stats.time_secs, 0.0);
        assert_eq!(stats.speed, None);
    }

    #[test]
    fn non_stats_lines_are_ignored() {
        assert_eq!(parse_stats_line("Error opening input file"), None);
        assert_eq!(parse_stats_line("keyframe=1"), None);
    }

    #[test]
    fn parser_handles_split_chunks() {
        let mut parser = StatsParser::new();
        assert_eq!(parser.feed("  Duration: 00:01:40.00, start: 0.000000\n"), None);
        assert_eq!(parser.duration_secs(), Some(100.0));

        let (head, tail) = LINE.split_at(30);
        assert_eq!(parser.feed(head), None);
        assert_eq!(parser.feed(tail), None);
        let stats = parser.feed("\r").unwrap();
        assert_eq!(stats.frame, 240);
        assert_eq!(stats.percent(100.0), Some(10.0));
        assert_eq!(stats.eta_secs(100.0), Some(90.0));
        assert_eq!(parser.latest(), Some(stats));
    }

    #[test]
    fn newest_line_wins_within_one_chunk() {
        let mut parser = StatsParser::new();
        let chunk = "frame=1 fps=1 time=00:00:01.00 speed=1x\rframe=2 fps=1 time=00:00:02.00 speed=1x\r";
        assert_eq!(parser.feed(chunk).map(|s| s.frame), Some(2));
    }

    #[test]
    fn eta_needs_speed_and_remaining_time() {
        let stats = EncodeStats {
            frame: 10,
            fps: 5.0,
            time_secs: 50.0,
            speed: None,
        };
        assert_eq!(stats.eta_secs(100.0), None);
        assert_eq!(stats.percent(0.0), None);
        assert_eq!(stats.percent(25.0), Some(100.0));
    }
}
