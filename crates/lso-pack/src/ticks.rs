//! Conversion from tick counts to bar.beat.division.tick positions.

use std::fmt;

use thiserror::Error;

/// Ticks per quarter-note beat used by the project format.
pub const DEFAULT_TICKS_PER_BEAT: u64 = 960;
/// Beats per bar assumed when no time signature is known (4/4).
pub const DEFAULT_BEATS_PER_BAR: u64 = 4;
/// Width of one display division.
pub const TICKS_PER_DIVISION: u64 = 240;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TickError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

/// Resolution and meter used to lay ticks out into bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBase {
    pub ticks_per_beat: u64,
    pub beats_per_bar: u64,
}

impl Default for TimeBase {
    fn default() -> Self {
        Self {
            ticks_per_beat: DEFAULT_TICKS_PER_BEAT,
            beats_per_bar: DEFAULT_BEATS_PER_BAR,
        }
    }
}

/// A musical position. `bar`, `beat` and `division` count from 1, `tick`
/// from 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub bar: u64,
    pub beat: u64,
    pub division: u64,
    pub tick: u64,
}

impl Position {
    /// Converts with the default 960 ticks per beat in 4/4.
    pub fn from_ticks(ticks: u64) -> Self {
        let base = TimeBase::default();
        Self::layout(ticks, base.ticks_per_beat, base.ticks_per_beat * base.beats_per_bar)
    }

    /// Converts with an explicit time base.
    pub fn from_ticks_in(ticks: u64, base: TimeBase) -> Result<Self, TickError> {
        if base.ticks_per_beat == 0 {
            return Err(TickError::InvalidArgument("ticks per beat must be non-zero"));
        }
        if base.beats_per_bar == 0 {
            return Err(TickError::InvalidArgument("beats per bar must be non-zero"));
        }
        let ticks_per_bar = base
            .ticks_per_beat
            .checked_mul(base.beats_per_bar)
            .ok_or(TickError::InvalidArgument("bar length overflows"))?;
        Ok(Self::layout(ticks, base.ticks_per_beat, ticks_per_bar))
    }

    /// Converts a signed tick count, rejecting negative values.
    pub fn from_signed_ticks(ticks: i64, base: TimeBase) -> Result<Self, TickError> {
        let ticks =
            u64::try_from(ticks).map_err(|_| TickError::InvalidArgument("negative tick count"))?;
        Self::from_ticks_in(ticks, base)
    }

    fn layout(ticks: u64, ticks_per_beat: u64, ticks_per_bar: u64) -> Self {
        let in_bar = ticks % ticks_per_bar;
        let in_beat = in_bar % ticks_per_beat;
        Self {
            bar: ticks / ticks_per_bar + 1,
            beat: in_bar / ticks_per_beat + 1,
            division: in_beat / TICKS_PER_DIVISION + 1,
            tick: in_beat % TICKS_PER_DIVISION,
        }
    }

    pub fn as_tuple(&self) -> (u64, u64, u64, u64) {
        (self.bar, self.beat, self.division, self.tick)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.bar, self.beat, self.division, self.tick)
    }
}

/// Free-function form of [`Position::from_ticks_in`].
pub fn ticks_to_position(
    ticks: u64,
    ticks_per_beat: u64,
    beats_per_bar: u64,
) -> Result<Position, TickError> {
    Position::from_ticks_in(
        ticks,
        TimeBase {
            ticks_per_beat,
            beats_per_bar,
        },
    )
}
