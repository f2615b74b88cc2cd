use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How often a SIP instalment is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContributionFrequency {
    /// Every calendar day, 365 a year.
    Daily,
    #[default]
    Monthly,
    Quarterly,
    #[serde(alias = "semi-annually")]
    HalfYearly,
    #[serde(alias = "annually")]
    Yearly,
    /// A single lump sum at the start, compounded monthly after that.
    #[serde(alias = "lumpsum")]
    OneTime,
}

impl ContributionFrequency {
    /// Compounding steps per year; instalments fall at the start of a step.
    pub fn periods_per_year(self) -> u32 {
        match self {
            ContributionFrequency::Daily => 365,
            ContributionFrequency::Monthly | ContributionFrequency::OneTime => 12,
            ContributionFrequency::Quarterly => 4,
            ContributionFrequency::HalfYearly => 2,
            ContributionFrequency::Yearly => 1,
        }
    }

    /// Instalments paid during a 1-based year.
    pub fn payments_in_year(self, year: u32) -> u32 {
        match self {
            ContributionFrequency::OneTime => u32::from(year == 1),
            recurring => recurring.periods_per_year(),
        }
    }

    pub fn total_payments(self, years: u32) -> u32 {
        (1..=years).map(|year| self.payments_in_year(year)).sum()
    }

    pub fn is_recurring(self) -> bool {
        self != ContributionFrequency::OneTime
    }
}

/// How often interest is credited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompoundingFrequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    #[serde(alias = "semi-annually")]
    HalfYearly,
    #[serde(alias = "annually")]
    Yearly,
}

impl CompoundingFrequency {
    pub const ALL: [CompoundingFrequency; 6] = [
        CompoundingFrequency::Daily,
        CompoundingFrequency::Weekly,
        CompoundingFrequency::Monthly,
        CompoundingFrequency::Quarterly,
        CompoundingFrequency::HalfYearly,
        CompoundingFrequency::Yearly,
    ];

    pub fn periods_per_year(self) -> u32 {
        match self {
            CompoundingFrequency::Daily => 365,
            CompoundingFrequency::Weekly => 52,
            CompoundingFrequency::Monthly => 12,
            CompoundingFrequency::Quarterly => 4,
            CompoundingFrequency::HalfYearly => 2,
            CompoundingFrequency::Yearly => 1,
        }
    }
}

impl fmt::Display for CompoundingFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompoundingFrequency::Daily => "daily",
            CompoundingFrequency::Weekly => "weekly",
            CompoundingFrequency::Monthly => "monthly",
            CompoundingFrequency::Quarterly => "quarterly",
            CompoundingFrequency::HalfYearly => "half-yearly",
            CompoundingFrequency::Yearly => "yearly",
        };
        f.write_str(name)
    }
}

impl FromStr for CompoundingFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(CompoundingFrequency::Daily),
            "weekly" => Ok(CompoundingFrequency::Weekly),
            "monthly" => Ok(CompoundingFrequency::Monthly),
            "quarterly" => Ok(CompoundingFrequency::Quarterly),
            "half-yearly" | "semi-annually" => Ok(CompoundingFrequency::HalfYearly),
            "yearly" | "annually" => Ok(CompoundingFrequency::Yearly),
            other => Err(format!("Unknown compounding frequency: {other}")),
        }
    }
}

/// Converts a percentage as entered on a form (`12` for 12%) to a fraction.
pub fn fraction(percent: f64) -> f64 {
    percent / 100.0
}
