//! Environmental impact equivalents and period projections.

use crate::models::AggregateStats;
use serde::Serialize;

/// Reporting periods, with their length in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Period {
    pub const ALL: [Period; 4] = [Period::Daily, Period::Weekly, Period::Monthly, Period::Yearly];

    pub fn days(self) -> f64 {
        match self {
            Period::Daily => 1.0,
            Period::Weekly => 7.0,
            Period::Monthly => 30.0,
            Period::Yearly => 365.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Period::Daily => "Daily",
            Period::Weekly => "Weekly",
            Period::Monthly => "Monthly",
            Period::Yearly => "Yearly",
        }
    }
}

/// Savings over one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImpactFigures {
    pub trees: f64,
    pub energy_kwh: f64,
    pub co2_kg: f64,
    pub water_l: f64,
}

impl ImpactFigures {
    fn scaled(&self, factor: f64) -> Self {
        Self {
            trees: self.trees * factor,
            energy_kwh: self.energy_kwh * factor,
            co2_kg: self.co2_kg * factor,
            water_l: self.water_l * factor,
        }
    }
}

/// Reference daily savings of a household that sorts its waste.
pub const DAILY_BASELINE: ImpactFigures = ImpactFigures {
    trees: 0.140,
    energy_kwh: 1.90,
    co2_kg: 2.80,
    water_l: 15.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Projection {
    pub period: Period,
    pub figures: ImpactFigures,
}

/// Baseline projected over every period.
pub fn baseline_projection() -> Vec<Projection> {
    project_daily(&DAILY_BASELINE)
}

/// Project a session's savings as if it were one day's worth.
///
/// Trees and water are scaled from the baseline by the session's CO₂ ratio
/// against the baseline CO₂, since the session only tracks CO₂ and energy.
pub fn project(stats: &AggregateStats) -> Vec<Projection> {
    let ratio = if DAILY_BASELINE.co2_kg > 0.0 {
        stats.co2_saved / DAILY_BASELINE.co2_kg
    } else {
        0.0
    };
    let daily = ImpactFigures {
        trees: DAILY_BASELINE.trees * ratio,
        energy_kwh: stats.energy_saved,
        co2_kg: stats.co2_saved,
        water_l: DAILY_BASELINE.water_l * ratio,
    };
    project_daily(&daily)
}

fn project_daily(daily: &ImpactFigures) -> Vec<Projection> {
    Period::ALL
        .iter()
        .map(|&period| Projection {
            period,
            figures: daily.scaled(period.days()),
        })
        .collect()
}
