use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use udara_core::{FeatureVector, Predictor};
use udara_io::{load_model_config, open_source};

#[derive(Parser, Debug)]
#[command(author, version, about = "Udara air-quality classification dashboard")]
pub struct Args {
    #[command(flatten)]
    pub model: ModelArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Where the reference tables and model settings come from.
#[derive(ClapArgs, Debug)]
pub struct ModelArgs {
    /// JSON bundle with the reference tables (`{"x": [...], "y": [...]}`)
    #[arg(short, long, global = true)]
    pub reference: Option<PathBuf>,

    #[arg(long, global = true, requires = "reference_y")]
    pub reference_x: Option<PathBuf>,

    #[arg(long, global = true, requires = "reference_x")]
    pub reference_y: Option<PathBuf>,

    /// Field separator of the reference tables; pass ' ' for `numpy.savetxt` defaults
    #[arg(long, global = true, default_value_t = ',')]
    pub delimiter: char,

    #[arg(long, global = true)]
    pub model_config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify one manually entered reading
    Predict {
        #[arg(long)]
        city: String,
        #[arg(long)]
        pm10: f64,
        #[arg(long = "pm2.5", alias = "pm25")]
        pm2_5: f64,
        #[arg(long)]
        so2: f64,
        #[arg(long)]
        co: f64,
        #[arg(long)]
        o3: f64,
        #[arg(long)]
        no2: f64,
    },
    /// Label every row of a readings CSV
    Batch {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Summarize the rows of this city
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        tui: bool,
    },
    /// Label the daily means of a saved yearly history response
    History {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        province: String,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        tui: bool,
    },
}

impl Command {
    /// The manual reading, in feature order. `None` for the table commands.
    pub fn manual_reading(&self) -> Option<(&str, FeatureVector)> {
        match self {
            Command::Predict { city, pm10, pm2_5, so2, co, o3, no2 } => {
                Some((city.as_str(), [*pm10, *pm2_5, *so2, *co, *o3, *no2]))
            }
            _ => None,
        }
    }
}

impl ModelArgs {
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
