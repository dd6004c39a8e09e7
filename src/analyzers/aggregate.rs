use crate::analyzers::types::{AggregateMode, Snapshot, SurveillanceSeries, WeekRecord};

/// Splits a `YYYYWW` identifier into `(week, year)`.
///
/// Identifiers shorter than four characters are returned whole as the year
/// with an empty week.
pub fn split_week_id(id: &str) -> (&str, &str) {
    match (id.get(..4), id.get(4..)) {
        (Some(year), Some(week)) => (week, year),
        _ => ("", id),
    }
}

/// Chart label for a week identifier, `"{week}-{year}"`.
pub fn week_label(id: &str) -> String {
    let (week, year) = split_week_id(id);
    format!("{week}-{year}")
}

/// Reshapes raw weekly records into parallel chart sequences plus a summary
/// snapshot.
///
/// Sequences always follow input order. The snapshot depends on `mode`; see
/// [`AggregateMode`].
pub fn aggregate(records: &[WeekRecord], mode: AggregateMode) -> SurveillanceSeries {
    let mut series = SurveillanceSeries {
        labels: Vec::with_capacity(records.len()),
        confirmed: Vec::with_capacity(records.len()),
        estimated: Vec::with_capacity(records.len()),
        latest: Snapshot::default(),
    };

    for record in records {
        series.labels.push(week_label(&record.week_id));
        series.confirmed.push(record.casprov);
        series.estimated.push(record.casos_est);

        if mode == AggregateMode::LastRecord {
            series.latest = Snapshot::from(record);
        }
    }

    if mode == AggregateMode::LatestWeek {
        // ties keep the later input position, as max_by_key returns the last max
        if let Some(newest) = records.iter().max_by_key(|r| r.week_id.parse::<u32>().ok()) {
            series.latest = Snapshot::from(newest);
        }
    }

    series
}
