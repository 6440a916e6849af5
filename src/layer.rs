use std::str::FromStr;

use serde::{Serialize, Deserialize};

use crate::error::{ Error, Result };

mod conv;
mod dense;
mod flatten;
mod pool;

pub use conv::convolve;
pub use dense::dense;
pub use flatten::flatten;
pub use pool::max_pool;


/// Kind of a layer in the network topology.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum LayerKind {
  Input,
  Convoluted,
  Maxpool,
  Flatten,
  FullyConnected,
  Recurrent,
}

impl LayerKind {
  pub const ALL: [LayerKind; 6] = [
    Self::Input, Self::Convoluted, Self::Maxpool,
    Self::Flatten, Self::FullyConnected, Self::Recurrent,
  ];

  pub fn name(&self) -> &'static str {
    match self {
      Self::Input => "Input",
      Self::Convoluted => "Convoluted",
      Self::Maxpool => "Maxpool",
      Self::Flatten => "Flatten",
      Self::FullyConnected => "Fully_Connected",
      Self::Recurrent => "Recurrent",
    }
  }

  /// Whether the layer occupies a slot in the filter and stride lists.

  pub fn takes_stride(&self) -> bool {
    matches!(self, Self::Convoluted | Self::Maxpool | Self::Flatten)
  }

  /// Whether the layer occupies a slot in the activation list.

  pub fn takes_activation(&self) -> bool {
    !matches!(self, Self::Input)
  }

  pub fn takes_weights(&self) -> bool {
    matches!(self, Self::FullyConnected)
  }
}

impl FromStr for LayerKind {
  type Err = Error;

  fn from_str(name: &str) -> Result<Self> {
    Self::ALL.into_iter()
      .find(|kind| kind.name() == name )
      .ok_or_else(|| Error::UnknownLayer(name.to_string()) )
  }
}

impl TryFrom<String> for LayerKind {
  type Error = Error;

  fn try_from(name: String) -> Result<Self> {
    name.parse()
  }
}

impl From<LayerKind> for &'static str {
  fn from(kind: LayerKind) -> Self {
    kind.name()
  }
}

impl std::fmt::Display for LayerKind {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "{}", self.name())
  }
}
