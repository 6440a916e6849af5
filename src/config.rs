use std::fs;
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::error::{ Error, Result, configuration };


/// Engine settings that are not part of a model description.
///
/// Every field has a default, so an empty JSON object is a valid
/// configuration.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Side of the square window scanned by `Maxpool` layers.
  pub pool_window: usize,
  /// Names of the output classes, indexed like the final layer's output.
  pub labels: Vec<String>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      pool_window: 2,
      labels: (0..10).map(|digit| digit.to_string() ).collect(),
    }
  }
}

impl Settings {
  pub fn from_json_str(json: &str) -> Result<Self> {
    let settings: Self = serde_json::from_str(json)?;
    settings.validate()?;
    Ok(settings)
  }

  pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|source| Error::Io {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_json_str(&json)
  }

  pub fn validate(&self) -> Result<()> {
    if self.pool_window == 0 {
      return Err(configuration("pool window must be positive"))
    }
    Ok(())
  }

  pub fn label(&self, index: usize) -> Option<&str> {
    self.labels.get(index).map(String::as_str)
  }
}
