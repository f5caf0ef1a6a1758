//! Conversion between the raw running clock and the two-part match time
//! (regulation minute + stoppage minute) shown on air and stored with
//! every goal and card.
//!
//! A period's boundary is given in regulation minutes. Up to and including
//! the boundary, events belong to the minute in progress (1-indexed) and
//! the regulation minute is capped at the boundary. Past the boundary the
//! regulation minute stays at the boundary and every started minute of
//! excess counts as one stoppage minute.

use serde::{Deserialize, Serialize};

pub const SECS_PER_MIN: u32 = 60;
pub const MAX_CLOCK_MINUTES: u32 = 999;
pub const MAX_CLOCK_SECONDS: u32 = 59;
pub const MAX_STOPPAGE_MINUTES: u32 = 99;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatchTime {
    #[serde(rename = "regMinute")]
    pub regulation_minute: u16,
    #[serde(rename = "addMinute")]
    pub stoppage_minute: u16,
}

impl MatchTime {
    pub fn new(regulation_minute: u16, stoppage_minute: u16) -> Self {
        Self {
            regulation_minute,
            stoppage_minute,
        }
    }

    pub fn is_stoppage(&self) -> bool {
        self.stoppage_minute > 0
    }
}

impl core::fmt::Display for MatchTime {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if self.stoppage_minute > 0 {
            write!(f, "{}+{}'", self.regulation_minute, self.stoppage_minute)
        } else {
            write!(f, "{}'", self.regulation_minute)
        }
    }
}

fn boundary_secs(period_end_minutes: u16) -> u32 {
    u32::from(period_end_minutes.max(1)) * SECS_PER_MIN
}

fn saturate(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

/// Attributes an instant on the running clock to a match time.
///
/// A boundary of zero minutes is treated as one minute so that the first
/// regulation minute always exists.
pub fn to_match_time(elapsed_seconds: u32, period_end_minutes: u16) -> MatchTime {
    let boundary_minutes = period_end_minutes.max(1);
    let boundary = boundary_secs(period_end_minutes);

    if elapsed_seconds <= boundary {
        let minute = saturate(elapsed_seconds / SECS_PER_MIN + 1).min(boundary_minutes);
        MatchTime::new(minute, 0)
    } else {
        let stoppage = (elapsed_seconds - boundary).div_ceil(SECS_PER_MIN);
        MatchTime::new(boundary_minutes, saturate(stoppage))
    }
}

/// Turns a literal regulation + stoppage minute back into clock seconds.
///
/// Regulation minutes are clamped to `0..=999` and stoppage minutes to
/// `0..=99`. A regulation-only time maps to the start of that minute. Once
/// stoppage is non-zero the regulation minute is ignored and the result is
/// the boundary plus the full stoppage minutes.
pub fn to_elapsed_seconds(
    regulation_minute: u16,
    stoppage_minute: u16,
    period_end_minutes: u16,
) -> u32 {
    let regulation = u32::from(regulation_minute).min(MAX_CLOCK_MINUTES);
    let stoppage = u32::from(stoppage_minute).min(MAX_STOPPAGE_MINUTES);

    if stoppage == 0 {
        regulation.saturating_sub(1) * SECS_PER_MIN
    } else {
        boundary_secs(period_end_minutes) + stoppage * SECS_PER_MIN
    }
}

/// Splits the clock into the main display (capped at the boundary) and the
/// additional-time display (the excess).
pub fn split_clock(elapsed_seconds: u32, period_end_minutes: u16) -> (u32, u32) {
    let boundary = boundary_secs(period_end_minutes);
    if elapsed_seconds <= boundary {
        (elapsed_seconds, 0)
    } else {
        (boundary, elapsed_seconds - boundary)
    }
}

/// Futsal clocks count down to the boundary instead of up from zero
pub fn countdown_seconds(elapsed_seconds: u32, period_end_minutes: u16) -> u32 {
    boundary_secs(period_end_minutes).saturating_sub(elapsed_seconds)
}

/// `MM:SS`, with the minutes printed in full once they reach three digits
pub fn format_clock(total_seconds: u32) -> String {
    let minutes = total_seconds / SECS_PER_MIN;
    let seconds = total_seconds % SECS_PER_MIN;
    format!("{minutes:02}:{seconds:02}")
}

/// The operator's manual "set time" input: a main clock reading plus an
/// additional-time reading.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClockReading {
    pub minutes: u32,
    pub seconds: u32,
    pub stoppage_minutes: u32,
    pub stoppage_seconds: u32,
}

impl ClockReading {
    /// Pre-fills the set-time form from the current clock
    pub fn from_elapsed(elapsed_seconds: u32, period_end_minutes: u16) -> Self {
        let (main, additional) = split_clock(elapsed_seconds, period_end_minutes);
        Self {
            minutes: main / SECS_PER_MIN,
            seconds: main % SECS_PER_MIN,
            stoppage_minutes: additional / SECS_PER_MIN,
            stoppage_seconds: additional % SECS_PER_MIN,
        }
    }

    pub fn clamped(self) -> Self {
        Self {
            minutes: self.minutes.min(MAX_CLOCK_MINUTES),
            seconds: self.seconds.min(MAX_CLOCK_SECONDS),
            stoppage_minutes: self.stoppage_minutes.min(MAX_STOPPAGE_MINUTES),
            stoppage_seconds: self.stoppage_seconds.min(MAX_CLOCK_SECONDS),
        }
    }

    pub fn to_elapsed_seconds(self) -> u32 {
        let c = self.clamped();
        (c.minutes + c.stoppage_minutes) * SECS_PER_MIN + c.seconds + c.stoppage_seconds
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use more_asserts::*;

    #[test]
    fn test_regulation_attribution() {
        assert_eq!(to_match_time(0, 45), MatchTime::new(1, 0));
        assert_eq!(to_match_time(59, 45), MatchTime::new(1, 0));
        assert_eq!(to_match_time(60, 45), MatchTime::new(2, 0));
        assert_eq!(to_match_time(2699, 45), MatchTime::new(45, 0));

        for secs in 0..(45 * 60) {
            let time = to_match_time(secs, 45);
            assert_eq!(time.stoppage_minute, 0);
            assert_eq!(u32::from(time.regulation_minute), secs / 60 + 1);
        }
    }

    #[test]
    fn test_boundary_instant() {
        assert_eq!(to_match_time(2700, 45), MatchTime::new(45, 0));
        assert_eq!(to_match_time(2701, 45), MatchTime::new(45, 1));
        assert_eq!(to_match_time(2760, 45), MatchTime::new(45, 1));
        assert_eq!(to_match_time(2761, 45), MatchTime::new(45, 2));
        assert_eq!(to_match_time(5400, 90), MatchTime::new(90, 0));
    }

    #[test]
    fn test_stoppage_is_capped_and_monotonic() {
        let mut last = to_match_time(45 * 60, 45);
        for secs in (45 * 60 + 1)..(60 * 60) {
            let time = to_match_time(secs, 45);
            assert_eq!(time.regulation_minute, 45);
            assert_ge!(time.stoppage_minute, last.stoppage_minute);
            assert_eq!(
                u32::from(time.stoppage_minute),
                (secs - 45 * 60).div_ceil(60)
            );
            last = time;
        }
    }

    #[test]
    fn test_zero_boundary() {
        assert_eq!(to_match_time(0, 0), MatchTime::new(1, 0));
        assert_eq!(to_match_time(61, 0), MatchTime::new(1, 1));
    }

    #[test]
    fn test_round_trip_on_minute_boundaries() {
        let boundary = 45;
        for minute in 0..120u32 {
            let secs = minute * 60;
            if secs == u32::from(boundary) * 60 {
                // Both 44:00 and 45:00 attribute to the 45th minute
                continue;
            }
            let time = to_match_time(secs, boundary);
            assert_eq!(
                to_elapsed_seconds(time.regulation_minute, time.stoppage_minute, boundary),
                secs,
                "round trip failed at {secs}s"
            );
        }
    }

    #[test]
    fn test_to_elapsed_clamps() {
        assert_eq!(to_elapsed_seconds(0, 0, 45), 0);
        assert_eq!(to_elapsed_seconds(5000, 0, 45), 998 * 60);
        assert_eq!(to_elapsed_seconds(45, 500, 45), (45 + 99) * 60);
        assert_eq!(to_elapsed_seconds(12, 3, 45), (45 + 3) * 60);
    }

    #[test]
    fn test_split_clock() {
        assert_eq!(split_clock(125, 45), (125, 0));
        assert_eq!(split_clock(2700, 45), (2700, 0));
        assert_eq!(split_clock(2712, 45), (2700, 12));
    }

    #[test]
    fn test_countdown() {
        assert_eq!(countdown_seconds(0, 20), 1200);
        assert_eq!(countdown_seconds(1199, 20), 1);
        assert_eq!(countdown_seconds(1500, 20), 0);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(2712), "45:12");
        assert_eq!(format_clock(6000), "100:00");
        assert_eq!(format_clock(59_999), "999:59");
    }

    #[test]
    fn test_clock_reading() {
        let reading = ClockReading {
            minutes: 45,
            seconds: 0,
            stoppage_minutes: 2,
            stoppage_seconds: 30,
        };
        assert_eq!(reading.to_elapsed_seconds(), 2700 + 150);

        let wild = ClockReading {
            minutes: 1500,
            seconds: 75,
            stoppage_minutes: 150,
            stoppage_seconds: 61,
        };
        assert_eq!(wild.to_elapsed_seconds(), (999 + 99) * 60 + 59 + 59);

        assert_eq!(ClockReading::from_elapsed(2850, 45), reading);
        assert_eq!(
            ClockReading::from_elapsed(125, 45),
            ClockReading {
                minutes: 2,
                seconds: 5,
                stoppage_minutes: 0,
                stoppage_seconds: 0,
            }
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(MatchTime::new(23, 0).to_string(), "23'");
        assert_eq!(MatchTime::new(45, 2).to_string(), "45+2'");
    }
}
