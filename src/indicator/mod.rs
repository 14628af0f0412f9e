//! Indicator lights
//!
//! Five discrete output lines signal the result of a cycle:
//!
//! - **Yellow** (A): residual/dry waste
//! - **Green** (B): recyclable
//! - **Blue** (C): household/wet waste
//! - **Red** (D): hazardous
//! - **White** (E): status, lit alone while a request is in flight
//!
//! The lines are driven through the [`OutputLines`] trait so the controller
//! works the same against real GPIO ([`SysfsLines`]) and in memory
//! ([`MemoryLines`]).

use crate::types::Category;
use std::fmt;
use tracing::debug;

mod memory;
mod sysfs;

pub use memory::MemoryLines;
pub use sysfs::{SysfsLines, DEFAULT_GPIO_ROOT};

/// One physical output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Line {
    Yellow = 0,
    Green = 1,
    Blue = 2,
    Red = 3,
    White = 4,
}

impl Line {
    pub const ALL: [Line; 5] = [Line::Yellow, Line::Green, Line::Blue, Line::Red, Line::White];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Line::Yellow => "yellow",
            Line::Green => "green",
            Line::Blue => "blue",
            Line::Red => "red",
            Line::White => "white",
        }
    }
}

/// The mutually exclusive signal shown on the lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorState {
    /// Every line low
    Off,
    /// Only the white status line lit
    Processing,
    Residual,
    Recyclable,
    Household,
    Hazardous,
    /// Every line lit: review needed
    All,
}

impl IndicatorState {
    /// Lines raised for this state. All other lines are low.
    pub fn lines(self) -> &'static [Line] {
        match self {
            IndicatorState::Off => &[],
            IndicatorState::Processing => &[Line::White],
            IndicatorState::Residual => &[Line::Yellow],
            IndicatorState::Recyclable => &[Line::Green],
            IndicatorState::Household => &[Line::Blue],
            IndicatorState::Hazardous => &[Line::Red],
            IndicatorState::All => &Line::ALL,
        }
    }

    /// Signal for a cycle's decision. `None` means the cycle failed.
    pub fn for_category(category: Option<Category>) -> Self {
        match category {
            Some(Category::Recyclable) => IndicatorState::Recyclable,
            Some(Category::Hazardous) => IndicatorState::Hazardous,
            Some(Category::Household) => IndicatorState::Household,
            Some(Category::Residual) => IndicatorState::Residual,
            Some(Category::Unknown) | None => IndicatorState::All,
        }
    }
}

impl fmt::Display for IndicatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndicatorState::Off => "off",
            IndicatorState::Processing => "processing",
            IndicatorState::Residual => "residual",
            IndicatorState::Recyclable => "recyclable",
            IndicatorState::Household => "household",
            IndicatorState::Hazardous => "hazardous",
            IndicatorState::All => "all",
        };
        f.write_str(name)
    }
}

/// A set of five boolean output lines.
///
/// Implementations must not fail: a line that cannot be written is logged by
/// the implementation and otherwise ignored.
pub trait OutputLines: Send {
    fn set_line(&mut self, line: Line, high: bool);
}

impl<T: OutputLines + ?Sized> OutputLines for Box<T> {
    fn set_line(&mut self, line: Line, high: bool) {
        (**self).set_line(line, high)
    }
}

/// Drives an [`OutputLines`] so that exactly one [`IndicatorState`] is shown.
pub struct IndicatorController<L: OutputLines> {
    lines: L,
    state: IndicatorState,
}

impl<L: OutputLines> IndicatorController<L> {
    /// Take ownership of `lines` and clear them.
    pub fn new(lines: L) -> Self {
        let mut controller = Self {
            lines,
            state: IndicatorState::Off,
        };
        controller.set_state(IndicatorState::Off);
        controller
    }

    /// Show `state`.
    ///
    /// Every line is driven low before the lines of `state` are raised, so no
    /// line of a previous state survives.
    pub fn set_state(&mut self, state: IndicatorState) {
        for line in Line::ALL {
            self.lines.set_line(line, false);
        }
        for line in state.lines() {
            self.lines.set_line(*line, true);
        }
        if state != self.state {
            debug!("Indicator {} -> {}", self.state, state);
        }
        self.state = state;
    }

    pub fn state(&self) -> IndicatorState {
        self.state
    }

    pub fn lines(&self) -> &L {
        &self.lines
    }
}
