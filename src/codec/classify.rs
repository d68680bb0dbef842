//! Breakpoint classification of numeric readings into [`Status`] labels.
//!
//! A table is an ordered list of `(direction, threshold, label)` triples
//! plus a fallback. The first breakpoint whose comparison holds wins, so
//! boundary inclusivity is explicit per breakpoint rather than implied.
//!
//! ```text
//! soil:  value >  23000 → Dry
//!        value >= 16000 → Optimal
//!        otherwise      → Wet
//! ```

use heapless::Vec;

use crate::channel::Status;
use crate::config::{
    AirQualityThresholds, LightThresholds, NutrientThresholds, PressureThresholds,
    RainThresholds, SoilThresholds, WaterTempThresholds,
};

/// Upper bound on breakpoints per table.
pub const MAX_BREAKPOINTS: usize = 4;

/// Comparison applied between the value and a breakpoint threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Above,
    AtOrAbove,
    Below,
    AtOrBelow,
}

impl Direction {
    pub fn matches(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Above => value > threshold,
            Self::AtOrAbove => value >= threshold,
            Self::Below => value < threshold,
            Self::AtOrBelow => value <= threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub direction: Direction,
    pub threshold: f64,
    pub label: Status,
}

impl Breakpoint {
    pub const fn new(direction: Direction, threshold: f64, label: Status) -> Self {
        Self {
            direction,
            threshold,
            label,
        }
    }
}

/// First matching breakpoint's label, else `fallback`.
pub fn classify(value: f64, breakpoints: &[Breakpoint], fallback: Status) -> Status {
    breakpoints
        .iter()
        .find(|bp| bp.direction.matches(value, bp.threshold))
        .map_or(fallback, |bp| bp.label)
}

/// Owned breakpoint list with its fallback label.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakpointTable {
    breakpoints: Vec<Breakpoint, MAX_BREAKPOINTS>,
    fallback: Status,
}

impl BreakpointTable {
    /// Tables longer than [`MAX_BREAKPOINTS`] are truncated.
    pub fn new(breakpoints: &[Breakpoint], fallback: Status) -> Self {
        let mut table = Vec::new();
        for bp in breakpoints.iter().take(MAX_BREAKPOINTS) {
            let _ = table.push(*bp);
        }
        Self {
            breakpoints: table,
            fallback,
        }
    }

    pub fn classify(&self, value: f64) -> Status {
        classify(value, &self.breakpoints, self.fallback)
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }
}

// ───────────────────────────────────────────────────────────────
// Channel tables
// ───────────────────────────────────────────────────────────────

use Direction::{Above, AtOrAbove, AtOrBelow, Below};

/// Resistive probe: higher counts are drier.
pub fn soil_moisture_table(t: &SoilThresholds) -> BreakpointTable {
    BreakpointTable::new(
        &[
            Breakpoint::new(Above, t.dry_above, Status::Dry),
            Breakpoint::new(AtOrAbove, t.optimal_from, Status::Optimal),
        ],
        Status::Wet,
    )
}

/// LDR divider: higher counts are darker.
pub fn light_table(t: &LightThresholds) -> BreakpointTable {
    BreakpointTable::new(
        &[
            Breakpoint::new(Above, t.very_dark_above, Status::VeryDark),
            Breakpoint::new(Above, t.low_light_above, Status::LowLight),
            Breakpoint::new(Above, t.medium_light_above, Status::MediumLight),
        ],
        Status::BrightLight,
    )
}

/// Rain plate: higher counts are drier.
pub fn rain_table(t: &RainThresholds) -> BreakpointTable {
    BreakpointTable::new(
        &[
            Breakpoint::new(Above, t.dry_above, Status::Dry),
            Breakpoint::new(Above, t.light_rain_above, Status::LightRain),
            Breakpoint::new(Above, t.moderate_rain_above, Status::ModerateRain),
        ],
        Status::HeavyRain,
    )
}

pub fn pressure_table(t: &PressureThresholds) -> BreakpointTable {
    BreakpointTable::new(
        &[
            Breakpoint::new(Below, t.low_below, Status::Unsettled),
            Breakpoint::new(Above, t.high_above, Status::Stable),
        ],
        Status::Normal,
    )
}

pub fn nutrient_table(t: &NutrientThresholds) -> BreakpointTable {
    BreakpointTable::new(
        &[
            Breakpoint::new(Below, t.low_below, Status::Low),
            Breakpoint::new(AtOrBelow, t.optimal_max, Status::Optimal),
        ],
        Status::High,
    )
}

pub fn water_temperature_table(t: &WaterTempThresholds) -> BreakpointTable {
    BreakpointTable::new(
        &[
            Breakpoint::new(Below, t.cool_below, Status::Cool),
            Breakpoint::new(AtOrBelow, t.optimal_max, Status::Optimal),
        ],
        Status::HeatStress,
    )
}

/// MQ135 raw counts: higher counts mean more contaminant.
pub fn air_quality_table(t: &AirQualityThresholds) -> BreakpointTable {
    BreakpointTable::new(
        &[
            Breakpoint::new(Above, t.very_high_above, Status::VeryHighPollution),
            Breakpoint::new(Above, t.high_above, Status::HighPollution),
            Breakpoint::new(Above, t.moderate_above, Status::ModeratePollution),
            Breakpoint::new(Above, t.low_above, Status::LowPollution),
        ],
        Status::CleanAir,
    )
}
