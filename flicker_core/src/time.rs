// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trace timestamps and durations.
//!
//! A [`Timestamp`] carries up to three clocks captured at the same instant:
//! elapsed time since boot (including deep sleep), system uptime (excluding
//! deep sleep) and wall-clock unix time, all in nanoseconds. A clock value of
//! zero means "not recorded".
//!
//! Two timestamps are compared on the clock both of them carry, preferring
//! the most precise one. When no common clock exists the comparison falls
//! back to the raw triple so that [`Ord`] stays total; use
//! [`Timestamp::try_cmp`] to detect that case.
//!
//! [`Duration`] is a plain nanosecond count.

use core::cmp::Ordering;
use core::fmt;
use core::ops::{Add, Sub};

const NANOS_PER_MS: i64 = 1_000_000;
const NANOS_PER_SECOND: i64 = 1_000 * NANOS_PER_MS;
const NANOS_PER_MINUTE: i64 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: i64 = 60 * NANOS_PER_MINUTE;
const NANOS_PER_DAY: i64 = 24 * NANOS_PER_HOUR;

/// A point in time on up to three device clocks.
#[derive(Clone, Copy, Default)]
pub struct Timestamp {
    elapsed_nanos: i64,
    system_uptime_nanos: i64,
    unix_nanos: i64,
}

/// Which clock a comparison should be performed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PreferredClock {
    Elapsed,
    SystemUptime,
    Unix,
    Any,
}

impl Timestamp {
    /// The smallest meaningful timestamp, used as "beginning of trace".
    pub const MIN: Self = Self::new(1, 1, 1);

    /// The largest timestamp, used as "end of trace" / "never".
    pub const MAX: Self = Self::new(i64::MAX, i64::MAX, i64::MAX);

    /// A timestamp with no clock recorded.
    pub const EMPTY: Self = Self::new(0, 0, 0);

    /// Creates a timestamp from all three clocks.
    #[inline]
    #[must_use]
    pub const fn new(elapsed_nanos: i64, system_uptime_nanos: i64, unix_nanos: i64) -> Self {
        Self {
            elapsed_nanos,
            system_uptime_nanos,
            unix_nanos,
        }
    }

    /// Creates a timestamp that only carries the elapsed clock.
    #[inline]
    #[must_use]
    pub const fn from_elapsed(elapsed_nanos: i64) -> Self {
        Self::new(elapsed_nanos, 0, 0)
    }

    /// Creates a timestamp that only carries the system-uptime clock.
    #[inline]
    #[must_use]
    pub const fn from_system_uptime(system_uptime_nanos: i64) -> Self {
        Self::new(0, system_uptime_nanos, 0)
    }

    /// Creates a timestamp that only carries the unix clock.
    #[inline]
    #[must_use]
    pub const fn from_unix(unix_nanos: i64) -> Self {
        Self::new(0, 0, unix_nanos)
    }

    /// Nanoseconds since boot, including deep sleep. Zero if not recorded.
    #[inline]
    #[must_use]
    pub const fn elapsed_nanos(self) -> i64 {
        self.elapsed_nanos
    }

    /// Nanoseconds since boot, excluding deep sleep. Zero if not recorded.
    #[inline]
    #[must_use]
    pub const fn system_uptime_nanos(self) -> i64 {
        self.system_uptime_nanos
    }

    /// Nanoseconds since the unix epoch. Zero if not recorded.
    #[inline]
    #[must_use]
    pub const fn unix_nanos(self) -> i64 {
        self.unix_nanos
    }

    /// Returns `true` if the elapsed clock was recorded.
    #[inline]
    #[must_use]
    pub const fn has_elapsed(self) -> bool {
        self.elapsed_nanos != 0
    }

    /// Returns `true` if the system-uptime clock was recorded.
    #[inline]
    #[must_use]
    pub const fn has_system_uptime(self) -> bool {
        self.system_uptime_nanos != 0
    }

    /// Returns `true` if the unix clock was recorded.
    #[inline]
    #[must_use]
    pub const fn has_unix(self) -> bool {
        self.unix_nanos != 0
    }

    /// Returns `true` if no clock was recorded.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        !self.has_elapsed() && !self.has_system_uptime() && !self.has_unix()
    }

    /// Returns `true` for [`Timestamp::MIN`].
    #[inline]
    #[must_use]
    pub const fn is_min(self) -> bool {
        self.elapsed_nanos == 1 && self.system_uptime_nanos == 1 && self.unix_nanos == 1
    }

    /// Returns `true` for [`Timestamp::MAX`].
    #[inline]
    #[must_use]
    pub const fn is_max(self) -> bool {
        self.elapsed_nanos == i64::MAX
            && self.system_uptime_nanos == i64::MAX
            && self.unix_nanos == i64::MAX
    }

    /// Subtracts a duration from every recorded clock, clamping at zero.
    ///
    /// Clocks that were not recorded stay unrecorded.
    #[must_use]
    pub fn saturating_sub(self, duration: Duration) -> Self {
        let nanos = i64::try_from(duration.0).unwrap_or(i64::MAX);
        let sub = |v: i64| if v == 0 { 0 } else { v.saturating_sub(nanos).max(0) };
        Self::new(
            sub(self.elapsed_nanos),
            sub(self.system_uptime_nanos),
            sub(self.unix_nanos),
        )
    }

    /// Adds a duration to every recorded clock, saturating at `i64::MAX`.
    #[must_use]
    pub fn saturating_add(self, duration: Duration) -> Self {
        let nanos = i64::try_from(duration.0).unwrap_or(i64::MAX);
        let add = |v: i64| if v == 0 { 0 } else { v.saturating_add(nanos) };
        Self::new(
            add(self.elapsed_nanos),
            add(self.system_uptime_nanos),
            add(self.unix_nanos),
        )
    }

    /// Returns the duration between `self` and an earlier timestamp on the
    /// preferred common clock, or zero if `earlier` is later or the two share
    /// no clock.
    #[must_use]
    pub fn saturating_duration_since(self, earlier: Self) -> Duration {
        let diff = match self.common_clock(earlier) {
            Some(PreferredClock::Elapsed) => self.elapsed_nanos - earlier.elapsed_nanos,
            Some(PreferredClock::SystemUptime) => {
                self.system_uptime_nanos - earlier.system_uptime_nanos
            }
            Some(PreferredClock::Unix) => self.unix_nanos - earlier.unix_nanos,
            Some(PreferredClock::Any) | None => 0,
        };
        Duration(u64::try_from(diff).unwrap_or(0))
    }

    /// Compares two timestamps on a clock both of them carry.
    ///
    /// Returns `None` when the timestamps share no recorded clock.
    #[must_use]
    pub fn try_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.common_clock(*other)? {
            PreferredClock::Elapsed => Some(self.elapsed_nanos.cmp(&other.elapsed_nanos)),
            PreferredClock::SystemUptime => {
                Some(self.system_uptime_nanos.cmp(&other.system_uptime_nanos))
            }
            PreferredClock::Unix => Some(self.unix_nanos.cmp(&other.unix_nanos)),
            PreferredClock::Any => None,
        }
    }

    fn preferred_clock(self) -> Option<PreferredClock> {
        match (self.has_elapsed(), self.has_system_uptime(), self.has_unix()) {
            (true, true, _) => Some(PreferredClock::Any),
            (true, false, _) => Some(PreferredClock::Elapsed),
            (false, true, _) => Some(PreferredClock::SystemUptime),
            (false, false, true) => Some(PreferredClock::Unix),
            (false, false, false) => None,
        }
    }

    /// Resolves the clock to compare on. Never returns `Some(Any)`.
    fn common_clock(self, other: Self) -> Option<PreferredClock> {
        let mine = self.preferred_clock()?;
        let theirs = other.preferred_clock()?;
        let clock = if mine == theirs {
            mine
        } else if mine == PreferredClock::Any {
            theirs
        } else if theirs == PreferredClock::Any {
            mine
        } else {
            PreferredClock::Any
        };
        match clock {
            PreferredClock::Any => {
                if self.has_unix() && other.has_unix() {
                    Some(PreferredClock::Unix)
                } else if self.has_elapsed() && other.has_elapsed() {
                    Some(PreferredClock::Elapsed)
                } else if self.has_system_uptime() && other.has_system_uptime() {
                    Some(PreferredClock::SystemUptime)
                } else {
                    None
                }
            }
            clock => Some(clock),
        }
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.try_cmp(other).unwrap_or_else(|| {
            (self.elapsed_nanos, self.system_uptime_nanos, self.unix_nanos).cmp(&(
                other.elapsed_nanos,
                other.system_uptime_nanos,
                other.unix_nanos,
            ))
        })
    }
}

impl Add<Duration> for Timestamp {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        self.saturating_add(rhs)
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Duration) -> Self {
        self.saturating_sub(rhs)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("<NO TIMESTAMP>");
        }
        if self.is_min() {
            return f.write_str("TIMESTAMP.MIN");
        }
        if self.is_max() {
            return f.write_str("TIMESTAMP.MAX");
        }
        write!(f, "Timestamp(UNIX={}ns, UPTIME=", self.unix_nanos)?;
        if self.has_system_uptime() {
            write_pretty_nanos(f, self.system_uptime_nanos)?;
            write!(f, "({}ns)", self.system_uptime_nanos)?;
        } else {
            f.write_str("0ns")?;
        }
        f.write_str(", ELAPSED=")?;
        if self.has_elapsed() {
            write_pretty_nanos(f, self.elapsed_nanos)?;
            write!(f, "({}ns)", self.elapsed_nanos)?;
        } else {
            f.write_str("0ns")?;
        }
        f.write_str(")")
    }
}

/// Writes a nanosecond count as `1d2h3m4s5ms6ns`, omitting leading zero units.
fn write_pretty_nanos(f: &mut fmt::Formatter<'_>, nanos: i64) -> fmt::Result {
    const UNITS: [(&str, i64); 6] = [
        ("d", NANOS_PER_DAY),
        ("h", NANOS_PER_HOUR),
        ("m", NANOS_PER_MINUTE),
        ("s", NANOS_PER_SECOND),
        ("ms", NANOS_PER_MS),
        ("ns", 1),
    ];
    let mut remaining = nanos;
    let mut wrote = false;
    for (unit, size) in UNITS {
        let value = remaining / size;
        remaining %= size;
        if !wrote && value == 0 {
            continue;
        }
        write!(f, "{value}{unit}")?;
        wrote = true;
    }
    if !wrote {
        f.write_str("0ns")?;
    }
    Ok(())
}

/// A duration in nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// A zero-length duration.
    pub const ZERO: Self = Self(0);

    /// Creates a duration from milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis * 1_000_000)
    }

    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Saturating addition.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Add for Duration {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({}ns)", self.0)
    }
}
