use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use log::{debug, info};
use udara_core::{Category, FeatureVector, Pollutant, N_FEATURES};

use crate::error::IoError;

pub const CITY_COLUMN: &str = "nama_kota";
pub const DATE_COLUMN: &str = "tanggal";
pub const LABEL_COLUMN: &str = "label";

/// Columns an uploaded table must carry; anything else rides along untouched.
pub fn required_columns() -> Vec<&'static str> {
    let mut cols = vec![CITY_COLUMN, DATE_COLUMN];
    cols.extend(Pollutant::ALL.iter().map(|p| p.column()));
    cols
}

/// An uploaded readings table (city, date, six pollutants, extras).
///
/// Cells are kept as text so that the labeled export reproduces the input
/// verbatim plus the `label` column.
#[derive(Debug, Clone)]
pub struct ReadingsTable {
    headers: StringRecord,
    records: Vec<StringRecord>,
    city_idx: usize,
    feature_idx: [usize; N_FEATURES],
}

impl ReadingsTable {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, IoError> {
        let mut reader = ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);
        let headers = reader.headers()?.clone();

        let position = |name: &str| headers.iter().position(|h| h == name);
        let missing: Vec<String> = required_columns()
            .into_iter()
            .filter(|c| position(c).is_none())
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(IoError::MissingColumns(missing));
        }

        let city_idx = position(CITY_COLUMN).unwrap_or_default();
        let mut feature_idx = [0usize; N_FEATURES];
        for p in Pollutant::ALL {
            feature_idx[p.index()] = position(p.column()).unwrap_or_default();
        }

        let records = reader.records().collect::<Result<Vec<_>, _>>()?;
        debug!("Readings table: {} columns, {} rows", headers.len(), records.len());

        Ok(Self {
            headers,
            records,
            city_idx,
            feature_idx,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let file = File::open(path).map_err(|e| IoError::open(path, e))?;
        let table = Self::from_reader(file)?;
        info!("Loaded {} readings from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    pub fn city(&self, row: usize) -> Option<&str> {
        self.records.get(row).and_then(|r| r.get(self.city_idx))
    }

    /// Distinct city names in first-seen order.
    pub fn cities(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for record in &self.records {
            let city = record.get(self.city_idx).unwrap_or_default();
            if !seen.iter().any(|c| c == city) {
                seen.push(city.to_string());
            }
        }
        seen
    }

    /// Pollutant readings in feature order, one vector per row.
    pub fn features(&self) -> Result<Vec<FeatureVector>, IoError> {
        self.records
            .iter()
            .enumerate()
            .map(|(row, record)| {
                let mut v = [0.0; N_FEATURES];
                for p in Pollutant::ALL {
                    let raw = record.get(self.feature_idx[p.index()]).unwrap_or_default();
                    v[p.index()] = raw.trim().parse::<f64>().map_err(|_| IoError::ParseValue {
                        row,
                        column: p.column().to_string(),
                        value: raw.to_string(),
                    })?;
                }
                Ok(v)
            })
            .collect()
    }

    /// Writes the table with a `label` column holding the localized category.
    /// An existing `label` column is overwritten in place.
    pub fn write_labeled<W: Write>(&self, writer: W, labels: &[Category]) -> Result<(), IoError> {
        if labels.len() != self.records.len() {
            return Err(IoError::LabelMismatch {
                rows: self.records.len(),
                labels: labels.len(),
            });
        }

        let existing = self.headers.iter().position(|h| h == LABEL_COLUMN);
        let mut out = WriterBuilder::new().from_writer(writer);

        let mut header = self.headers.clone();
        if existing.is_none() {
            header.push_field(LABEL_COLUMN);
        }
        out.write_record(&header)?;

        for (record, label) in self.records.iter().zip(labels) {
            let row: Vec<&str> = match existing {
                Some(idx) => record
                    .iter()
                    .enumerate()
                    .map(|(i, cell)| if i == idx { label.localized() } else { cell })
                    .collect(),
                None => record.iter().chain(std::iter::once(label.localized())).collect(),
            };
            out.write_record(&row)?;
        }
        out.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    pub fn write_labeled_path(&self, path: &Path, labels: &[Category]) -> Result<(), IoError> {
        let file = File::create(path).map_err(|e| IoError::open(path, e))?;
        self.write_labeled(file, labels)?;
        info!("Wrote {} labeled rows to {}", self.len(), path.display());
        Ok(())
    }
}

/// Rows of `features`/`labels` whose city equals `city`.
pub fn filter_city(
    table: &ReadingsTable,
    features: &[FeatureVector],
    labels: &[Category],
    city: &str,
) -> (Vec<FeatureVector>, Vec<Category>) {
    let mut f = Vec::new();
    let mut l = Vec::new();
    for (row, (v, c)) in features.iter().zip(labels).enumerate() {
        if table.city(row) == Some(city) {
            f.push(*v);
            l.push(*c);
        }
    }
    (f, l)
}
