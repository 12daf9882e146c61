use std::path::Path;

use immunoflux_parser::{ExtensionRule, RowNormalizer, DEFAULT_NOISE_MARKERS};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

pub const DEFAULT_BASELINE_CONDITION: &str = "Unstimulated";
pub const DEFAULT_ANTIBODY_MARKER: &str = "aIFNy";

const DEFAULT_ROW_FORMAT: [&str; 12] = [
    "Unstimulated.fcs",
    "PMA,2f,Iono.fcs",
    "Flu.fcs",
    "Flu + aIFNy.fcs",
    "SARS.fcs",
    "SARS + aIFNy.fcs",
    "RSV.fcs",
    "RSV + aIFNy.fcs",
    "EBV.fcs",
    "EBV + aIFNy.fcs",
    "CMV.fcs",
    "CMV + aIFNy.fcs",
];

/// Canonical per-donor row order used by the legacy conversion mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowFormat(pub Vec<String>);

impl Default for RowFormat {
    fn default() -> Self {
        Self(DEFAULT_ROW_FORMAT.iter().map(|s| s.to_string()).collect())
    }
}

impl RowFormat {
    /// One condition label per line; blank lines are ignored.
    pub fn from_lines(text: &str) -> Self {
        Self(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub baseline_condition: String,
    pub antibody_marker: String,
    pub noise_markers: Vec<String>,
    pub extension: ExtensionRule,
    pub cytokine_keyword: String,
    pub mfi_keyword: String,
    pub row_format: RowFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            baseline_condition: DEFAULT_BASELINE_CONDITION.to_string(),
            antibody_marker: DEFAULT_ANTIBODY_MARKER.to_string(),
            noise_markers: DEFAULT_NOISE_MARKERS.iter().map(|m| m.to_string()).collect(),
            extension: ExtensionRule::default(),
            cytokine_keyword: "cytokine".to_string(),
            mfi_keyword: "mfi".to_string(),
            row_format: RowFormat::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(toml_str)
            .map_err(|err| PipelineError::Config(format!("invalid pipeline config: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML config, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.baseline_condition.trim().is_empty() {
            return Err(PipelineError::Config(
                "baseline_condition must not be empty".to_string(),
            ));
        }
        if self.antibody_marker.trim().is_empty() {
            return Err(PipelineError::Config(
                "antibody_marker must not be empty".to_string(),
            ));
        }
        if self.cytokine_keyword.is_empty() || self.mfi_keyword.is_empty() {
            return Err(PipelineError::Config(
                "filename keywords must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn normalizer(&self) -> RowNormalizer {
        RowNormalizer::new(self.noise_markers.clone(), self.extension.clone())
    }
}
