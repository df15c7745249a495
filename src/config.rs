use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::net::Tokens;
use crate::output::OutputFormat;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("num_places and num_transitions must be at least 1 (got {places} and {transitions})")]
    InvalidShape { places: usize, transitions: usize },
    #[error("place_upper_bound must be at least 1")]
    InvalidPlaceBound,
    #[error("firing-rate range [{min}, {max}] must be non-empty with min >= 1")]
    InvalidRateRange { min: u32, max: u32 },
    #[error("marks_lower_limit {lower} exceeds marks_upper_limit {upper}")]
    InvalidMarkRange { lower: usize, upper: usize },
    #[error("{field} must be strictly increasing")]
    UnsortedBoundaries { field: &'static str },
    #[error("samples_per_grid must be at least 1 in grid mode")]
    InvalidGridSampling,
}

/// 生成模式: random 直接采样, grid 先分格再均匀重采样.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    #[default]
    Random,
    Grid,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// 生成网的库所数与迁移数.
    #[serde(default = "default_num_places")]
    pub num_places: usize,
    #[serde(default = "default_num_transitions")]
    pub num_transitions: usize,
    /// Number of generation attempts; rejected samples are not re-tried.
    #[serde(default = "default_num_samples")]
    pub num_samples: usize,
    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,
    #[serde(default)]
    pub format: OutputFormat,
    /// 每个库所的 token 上限, 用于有界性判定.
    #[serde(default = "default_place_upper_bound")]
    pub place_upper_bound: Tokens,
    /// Accept a sample iff its marking count lies in this inclusive window.
    #[serde(default = "default_marks_lower_limit")]
    pub marks_lower_limit: usize,
    #[serde(default = "default_marks_upper_limit")]
    pub marks_upper_limit: usize,
    /// Inclusive integer range of the firing-rate draws.
    #[serde(default = "default_min_firing_rate")]
    pub min_firing_rate: u32,
    #[serde(default = "default_max_firing_rate")]
    pub max_firing_rate: u32,
    #[serde(default)]
    pub enable_transformations: bool,
    #[serde(default = "default_max_transforms_per_sample")]
    pub max_transforms_per_sample: usize,
    #[serde(default)]
    pub enable_statistics_report: bool,
    #[serde(default)]
    pub generation_mode: GenerationMode,
    /// Reproducibility seed; drawn from entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default = "default_temporary_grid_location")]
    pub temporary_grid_location: PathBuf,
    /// 为 true 时沿用已有 config.json 并继续累积计数.
    #[serde(default)]
    pub accumulation_data: bool,
    #[serde(default)]
    pub places_grid_boundaries: Vec<usize>,
    #[serde(default)]
    pub markings_grid_boundaries: Vec<usize>,
    #[serde(default = "default_samples_per_grid")]
    pub samples_per_grid: usize,
    #[serde(default = "default_lambda_variations_per_sample")]
    pub lambda_variations_per_sample: usize,
    #[serde(default = "default_output_grid_location")]
    pub output_grid_location: PathBuf,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_places == 0 || self.num_transitions == 0 {
            return Err(ConfigError::InvalidShape {
                places: self.num_places,
                transitions: self.num_transitions,
            });
        }
        if self.place_upper_bound == 0 {
            return Err(ConfigError::InvalidPlaceBound);
        }
        if self.min_firing_rate == 0 || self.min_firing_rate > self.max_firing_rate {
            return Err(ConfigError::InvalidRateRange {
                min: self.min_firing_rate,
                max: self.max_firing_rate,
            });
        }
        if self.marks_lower_limit > self.marks_upper_limit {
            return Err(ConfigError::InvalidMarkRange {
                lower: self.marks_lower_limit,
                upper: self.marks_upper_limit,
            });
        }
        if !strictly_increasing(&self.places_grid_boundaries) {
            return Err(ConfigError::UnsortedBoundaries {
                field: "places_grid_boundaries",
            });
        }
        if !strictly_increasing(&self.markings_grid_boundaries) {
            return Err(ConfigError::UnsortedBoundaries {
                field: "markings_grid_boundaries",
            });
        }
        if self.generation_mode == GenerationMode::Grid && self.samples_per_grid == 0 {
            return Err(ConfigError::InvalidGridSampling);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_places: default_num_places(),
            num_transitions: default_num_transitions(),
            num_samples: default_num_samples(),
            output_file: default_output_file(),
            format: OutputFormat::default(),
            place_upper_bound: default_place_upper_bound(),
            marks_lower_limit: default_marks_lower_limit(),
            marks_upper_limit: default_marks_upper_limit(),
            min_firing_rate: default_min_firing_rate(),
            max_firing_rate: default_max_firing_rate(),
            enable_transformations: false,
            max_transforms_per_sample: default_max_transforms_per_sample(),
            enable_statistics_report: false,
            generation_mode: GenerationMode::default(),
            seed: None,
            temporary_grid_location: default_temporary_grid_location(),
            accumulation_data: false,
            places_grid_boundaries: Vec::new(),
            markings_grid_boundaries: Vec::new(),
            samples_per_grid: default_samples_per_grid(),
            lambda_variations_per_sample: default_lambda_variations_per_sample(),
            output_grid_location: default_output_grid_location(),
        }
    }
}

fn strictly_increasing(values: &[usize]) -> bool {
    values.windows(2).all(|pair| pair[0] < pair[1])
}

fn default_num_places() -> usize {
    5
}

fn default_num_transitions() -> usize {
    5
}

fn default_num_samples() -> usize {
    100
}

fn default_output_file() -> PathBuf {
    PathBuf::from("dataset.jsonl")
}

fn default_place_upper_bound() -> Tokens {
    10
}

fn default_marks_lower_limit() -> usize {
    4
}

fn default_marks_upper_limit() -> usize {
    500
}

fn default_min_firing_rate() -> u32 {
    1
}

fn default_max_firing_rate() -> u32 {
    10
}

fn default_max_transforms_per_sample() -> usize {
    5
}

fn default_temporary_grid_location() -> PathBuf {
    PathBuf::from("./grid_tmp")
}

fn default_samples_per_grid() -> usize {
    10
}

fn default_lambda_variations_per_sample() -> usize {
    5
}

fn default_output_grid_location() -> PathBuf {
    PathBuf::from("grid_dataset.jsonl")
}
