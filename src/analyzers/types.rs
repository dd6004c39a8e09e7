//! Data types used by the aggregation pipeline.

use serde::{Deserialize, Deserializer};

/// One week of surveillance data as sent by the InfoDengue API.
///
/// Only the week identifier is required. Every metric is optional and
/// tolerant: nulls, missing keys and non-numeric values all become `None`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WeekRecord {
    /// Six digits, `YYYYWW`. Sent as a number, accepted as a string too;
    /// anything else becomes an empty id.
    #[serde(rename = "SE", default, deserialize_with = "week_id")]
    pub week_id: String,

    #[serde(default, deserialize_with = "loose_number")]
    pub casos: Option<f64>,
    #[serde(default, deserialize_with = "loose_number")]
    pub casos_est: Option<f64>,
    #[serde(default, deserialize_with = "loose_number")]
    pub casos_est_min: Option<f64>,
    #[serde(default, deserialize_with = "loose_number")]
    pub casos_est_max: Option<f64>,
    #[serde(default, deserialize_with = "loose_number")]
    pub casprov: Option<f64>,
    #[serde(default, deserialize_with = "loose_number")]
    pub nivel: Option<f64>,
    #[serde(default, deserialize_with = "loose_number")]
    pub nivel_inc: Option<f64>,
    #[serde(default, deserialize_with = "loose_number")]
    pub notif_accum_year: Option<f64>,
    #[serde(default, deserialize_with = "loose_number")]
    pub receptivo: Option<f64>,
    #[serde(default, deserialize_with = "loose_number")]
    pub transmissao: Option<f64>,

    // climate covariates
    #[serde(default, deserialize_with = "loose_number")]
    pub tempmin: Option<f64>,
    #[serde(default, deserialize_with = "loose_number")]
    pub tempmed: Option<f64>,
    #[serde(default, deserialize_with = "loose_number")]
    pub tempmax: Option<f64>,
    #[serde(default, deserialize_with = "loose_number")]
    pub umidmin: Option<f64>,
    #[serde(default, deserialize_with = "loose_number")]
    pub umidmed: Option<f64>,
    #[serde(default, deserialize_with = "loose_number")]
    pub umidmax: Option<f64>,
}

fn week_id<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(match serde_json::Value::deserialize(de)? {
        serde_json::Value::Number(n) => match (n.as_u64(), n.as_i64(), n.as_f64()) {
            (Some(u), _, _) => u.to_string(),
            (_, Some(i), _) => i.to_string(),
            (_, _, Some(f)) if f.fract() == 0.0 => format!("{f:.0}"),
            _ => n.to_string(),
        },
        serde_json::Value::String(s) => s,
        _ => String::new(),
    })
}

fn loose_number<'de, D: Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
    Ok(match serde_json::Value::deserialize(de)? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// The scalar fields of one record, kept as the "latest" summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub casos: Option<f64>,
    pub casos_est: Option<f64>,
    pub casos_est_min: Option<f64>,
    pub casos_est_max: Option<f64>,
    pub casprov: Option<f64>,
    pub nivel: Option<f64>,
    pub nivel_inc: Option<f64>,
    pub notif_accum_year: Option<f64>,
    pub receptivo: Option<f64>,
    pub transmissao: Option<f64>,
    pub tempmin: Option<f64>,
    pub tempmed: Option<f64>,
    pub tempmax: Option<f64>,
    pub umidmin: Option<f64>,
    pub umidmed: Option<f64>,
    pub umidmax: Option<f64>,
}

impl From<&WeekRecord> for Snapshot {
    fn from(r: &WeekRecord) -> Self {
        Self {
            casos: r.casos,
            casos_est: r.casos_est,
            casos_est_min: r.casos_est_min,
            casos_est_max: r.casos_est_max,
            casprov: r.casprov,
            nivel: r.nivel,
            nivel_inc: r.nivel_inc,
            notif_accum_year: r.notif_accum_year,
            receptivo: r.receptivo,
            transmissao: r.transmissao,
            tempmin: r.tempmin,
            tempmed: r.tempmed,
            tempmax: r.tempmax,
            umidmin: r.umidmin,
            umidmed: r.umidmed,
            umidmax: r.umidmax,
        }
    }
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Chart-ready view of a record sequence.
///
/// `labels`, `confirmed` and `estimated` are parallel and always the same
/// length as the input they were built from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurveillanceSeries {
    pub labels: Vec<String>,
    pub confirmed: Vec<Option<f64>>,
    pub estimated: Vec<Option<f64>>,
    pub latest: Snapshot,
}

impl SurveillanceSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Which record the summary snapshot is taken from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AggregateMode {
    /// Every record overwrites the snapshot, so the last input position wins
    /// whatever its week.
    #[default]
    LastRecord,
    /// The record with the greatest week identifier wins.
    LatestWeek,
}
