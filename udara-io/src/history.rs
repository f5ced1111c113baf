use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use csv::WriterBuilder;
use log::{debug, info};
use serde::Deserialize;
use udara_core::{Category, FeatureVector, Pollutant, N_FEATURES};

use crate::error::IoError;
use crate::readings::LABEL_COLUMN;

pub const PROVINCE_COLUMN: &str = "provinsi";

/// Pollutant concentrations of one hourly sample, keyed as the pollution
/// API reports them. Extra components (`no`, `nh3`) are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Components {
    pub pm10: f64,
    pub pm2_5: f64,
    pub so2: f64,
    pub co: f64,
    pub o3: f64,
    pub no2: f64,
}

impl Components {
    pub fn features(&self) -> FeatureVector {
        [self.pm10, self.pm2_5, self.so2, self.co, self.o3, self.no2]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct HourlySample {
    /// Unix seconds, UTC.
    pub dt: i64,
    pub components: Components,
}

#[derive(Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    list: Vec<HourlySample>,
}

/// One calendar day (UTC) of averaged readings.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyReading {
    pub date: NaiveDate,
    pub features: FeatureVector,
    /// Hourly samples that went into the mean.
    pub samples: usize,
}

/// Parses a saved history response: `{"list": [{"dt": .., "components": {..}}]}`.
pub fn parse_history<R: Read>(reader: R) -> Result<Vec<HourlySample>, IoError> {
    let response: HistoryResponse = serde_json::from_reader(reader)?;
    Ok(response.list)
}

pub fn load_history(path: &Path) -> Result<Vec<HourlySample>, IoError> {
    let file = File::open(path).map_err(|e| IoError::open(path, e))?;
    let samples = parse_history(BufReader::new(file))?;
    info!("Loaded {} hourly samples from {}", samples.len(), path.display());
    Ok(samples)
}

/// Inclusive unix-second bounds of a calendar year in UTC:
/// `YYYY-01-01 00:00:00` through `YYYY-12-31 23:59:59`.
pub fn year_window(year: i32) -> Result<(i64, i64), IoError> {
    let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single().ok_or(IoError::Year(year))?;
    let end = Utc
        .with_ymd_and_hms(year, 12, 31, 23, 59, 59)
        .single()
        .ok_or(IoError::Year(year))?;
    Ok((start.timestamp(), end.timestamp()))
}

/// Samples whose timestamp falls inside `[start, end]`, order preserved.
pub fn within_window(samples: &[HourlySample], (start, end): (i64, i64)) -> Vec<HourlySample> {
    samples.iter().filter(|s| s.dt >= start && s.dt <= end).copied().collect()
}

fn utc_date(ts: i64) -> Result<NaiveDate, IoError> {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.date_naive())
        .ok_or(IoError::Timestamp(ts))
}

/// Groups hourly samples by UTC date and averages every pollutant.
/// Days come back in ascending order; no samples means no days.
pub fn daily_means(samples: &[HourlySample]) -> Result<Vec<DailyReading>, IoError> {
    let mut days: BTreeMap<NaiveDate, ([f64; N_FEATURES], usize)> = BTreeMap::new();
    for sample in samples {
        let (sum, count) = days.entry(utc_date(sample.dt)?).or_insert(([0.0; N_FEATURES], 0));
        for (acc, v) in sum.iter_mut().zip(sample.components.features()) {
            *acc += v;
        }
        *count += 1;
    }

    debug!("Aggregated {} hourly samples into {} days", samples.len(), days.len());
    Ok(days
        .into_iter()
        .map(|(date, (sum, count))| DailyReading {
            date,
            features: sum.map(|s| s / count as f64),
            samples: count,
        })
        .collect())
}

/// Writes `provinsi, tanggal, pm10, pm2.5, so2, co, o3, no2, label`.
pub fn write_daily<W: Write>(
    writer: W,
    province: &str,
    days: &[DailyReading],
    labels: &[Category],
) -> Result<(), IoError> {
    if days.len() != labels.len() {
        return Err(IoError::LabelMismatch {
            rows: days.len(),
            labels: labels.len(),
        });
    }

    let mut out = WriterBuilder::new().from_writer(writer);
    let mut header = vec![PROVINCE_COLUMN, crate::readings::DATE_COLUMN];
    header.extend(Pollutant::ALL.iter().map(|p| p.column()));
    header.push(LABEL_COLUMN);
    out.write_record(&header)?;

    for (day, label) in days.iter().zip(labels) {
        let mut row = vec![province.to_string(), day.date.to_string()];
        row.extend(day.features.iter().map(|v| v.to_string()));
        row.push(label.localized().to_string());
        out.write_record(&row)?;
    }
    out.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_daily_path(
    path: &Path,
    province: &str,
    days: &[DailyReading],
    labels: &[Category],
) -> Result<(), IoError> {
    let file = File::create(path).map_err(|e| IoError::open(path, e))?;
    write_daily(file, province, days, labels)?;
    info!("Wrote {} daily rows for {} to {}", days.len(), province, path.display());
    Ok(())
}
