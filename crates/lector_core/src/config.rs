use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ControlError;

/// File extensions the extraction capability accepts.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "tiff", "bmp"];

/// True when the path carries one of the supported document extensions.
pub fn is_supported_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(ext))
        })
}

/// Which artifacts a successful extraction writes to the destination
/// directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Text,
    Document,
    Both,
}

impl OutputMode {
    pub fn writes_text(self) -> bool {
        matches!(self, OutputMode::Text | OutputMode::Both)
    }

    pub fn label(self) -> &'static str {
        match self {
            OutputMode::Text => "text",
            OutputMode::Document => "document",
            OutputMode::Both => "both",
        }
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(OutputMode::Text),
            "document" => Ok(OutputMode::Document),
            "both" => Ok(OutputMode::Both),
            other => Err(format!("unknown output mode: {other}")),
        }
    }
}

/// Read-only configuration snapshot consumed for the duration of one run.
///
/// Missing keys deserialize to their defaults, so a config file written by
/// an older build keeps loading after new keys are added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub language: String,
    pub dpi: u32,
    pub output_mode: OutputMode,
    pub destination_dir: PathBuf,
    pub open_destination_on_finish: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: "spa+eng".to_string(),
            dpi: 300,
            output_mode: OutputMode::Both,
            destination_dir: PathBuf::new(),
            open_destination_on_finish: true,
        }
    }
}

impl Config {
    /// Rejects snapshots a run must not start with.
    pub fn validate(&self) -> Result<(), ControlError> {
        if self.dpi == 0 {
            return Err(ControlError::InvalidConfig(
                "dpi must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}
