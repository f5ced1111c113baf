use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::warn;
use udara_core::Predictor;
use udara_io::{load_model_config, open_source};
use udara_rpc::MAX_READINGS;

#[derive(Parser, Debug)]
#[command(author, version, about = "Udara air-quality prediction service")]
pub struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(short, long, default_value_t = 9400)]
    pub port: u16,

    /// JSON bundle with the reference tables (`{"x": [...], "y": [...]}`)
    #[arg(short, long)]
    pub reference: Option<PathBuf>,

    /// Headerless feature table (pre-scaled, six columns)
    #[arg(long, requires = "reference_y")]
    pub reference_x: Option<PathBuf>,

    /// Headerless label table (one class id per line)
    #[arg(long, requires = "reference_x")]
    pub reference_y: Option<PathBuf>,

    /// Field separator of the reference tables; pass ' ' for `numpy.savetxt` defaults
    #[arg(long, default_value_t = ',')]
    pub delimiter: char,

    /// Optional JSON overriding scaler bounds or neighbor count
    #[arg(long)]
    pub model_config: Option<PathBuf>,

    /// Largest batch accepted in one request (capped at what one frame can carry)
    #[arg(long, default_value_t = 50_000)]
    pub max_rows: usize,

    #[arg(long, default_value_t = 1)]
    pub pulse_secs: u64,
}

impl Args {
    /// `max_rows`, lowered to the readings a single frame can hold. Above
    /// that a batch fails at the header and never reaches the row check.
    pub fn row_limit(&self) -> usize {
        if self.max_rows > MAX_READINGS {
            warn!("--max-rows {} exceeds frame capacity, using {}", self.max_rows, MAX_READINGS);
            return MAX_READINGS;
        }
        self.max_rows
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Loads the reference tables and bounds exactly once for the process.
    pub fn build_predictor(&self) -> Result<Predictor> {
        let config = load_model_config(self.model_config.as_deref()).context("Failed to load model config")?;
        let tables = match (&self.reference_x, &self.reference_y) {
            (Some(x), Some(y)) => Some((x.as_path(), y.as_path())),
            _ => None,
        };
        let delimiter = u8::try_from(self.delimiter).context("Delimiter must be a single-byte character")?;
        let source = open_source(self.reference.as_deref(), tables, delimiter)?;
        Predictor::from_source(config, &*source).context("Failed to load reference dataset")
    }
}
