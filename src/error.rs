use std::path::PathBuf;

use thiserror::Error;

use crate::{
  activation::ActivationKind,
  layer::LayerKind,
  shape::Shape,
};


/// Everything that can go wrong while loading a model or running it.

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid model configuration: {0}")]
  Configuration(String),

  #[error("unknown layer kind {0:?}")]
  UnknownLayer(String),

  #[error("unknown activation kind {0:?}")]
  UnknownActivation(String),

  #[error("activation {0} has no numeric behavior")]
  UnimplementedActivation(ActivationKind),

  #[error("layer {index} is of unsupported kind {kind}")]
  UnsupportedLayer { index: usize, kind: LayerKind },

  #[error("cannot multiply {lhs} by {rhs}: inner dimensions differ")]
  MatMulMismatch { lhs: Shape, rhs: Shape },

  #[error("shape error: {0}")]
  Shape(String),

  #[error("layer {index} ({kind}) cannot consume a {found}")]
  Transition { index: usize, kind: LayerKind, found: &'static str },

  #[error("failed to access {path:?}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse model description: {0}")]
  Json(#[from] serde_json::Error),

  #[error("failed to encode or decode model snapshot: {0}")]
  Snapshot(#[from] postcard::Error),
}

pub type Result<T> = std::result::Result<T, Error>;


pub(crate) fn configuration(message: impl Into<String>) -> Error {
  Error::Configuration(message.into())
}

pub(crate) fn shape(message: impl Into<String>) -> Error {
  Error::Shape(message.into())
}
