use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Timeframe {
    #[serde(rename = "all")]
    All,
    #[default]
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "1m")]
    OneMonth,
}

impl Timeframe {
    /// Earliest instant included, `None` for all time.
    pub fn start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let months = match self {
            Timeframe::All => return None,
            Timeframe::SixMonths => 6,
            Timeframe::ThreeMonths => 3,
            Timeframe::OneMonth => 1,
        };
        Some(
            now.checked_sub_months(chrono::Months::new(months))
                .unwrap_or(now - Duration::days(30 * i64::from(months))),
        )
    }
}

impl TryFrom<&str> for Timeframe {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "all" => Ok(Timeframe::All),
            "6m" => Ok(Timeframe::SixMonths),
            "3m" => Ok(Timeframe::ThreeMonths),
            "1m" => Ok(Timeframe::OneMonth),
            other => Err(format!("unsupported timeframe: {other}")),
        }
    }
}

/// Per-day point of an exercise's progress chart.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPoint {
    pub day: NaiveDate,
    #[serde(rename = "dateISO")]
    pub date_iso: String,
    pub heaviest: Option<f64>,
    #[serde(rename = "oneRM")]
    pub one_rm: Option<f64>,
    pub volume: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseBadges {
    pub day: NaiveDate,
    pub labels: Vec<String>,
}
