use std::fs::{ self, File };
use std::io::{ BufReader, BufWriter, Read, Write };
use std::path::Path;

use itertools::Itertools;
use log::{ info, warn };
use serde::{Serialize, Deserialize};

use crate::{
  activation::ActivationKind,
  error::{ Error, Result, configuration },
  layer::LayerKind,
  scalar::Real,
  tensor::Tensor,
};


/// One convolution layer's filters, each `channels × k × k`.
///
/// Maxpool and Flatten layers own a slot in the filter list too; their
/// bank is empty.

pub type FilterBank<T = f64> = Vec<Tensor<T>>;


/// A model as found in a JSON model description.
///
/// ```json
/// {
///   "type": ["Input", "Convoluted", "Maxpool", "Flatten", "Fully_Connected"],
///   "activity_functions": ["relu", "maxpool", "flatten", "softmax"],
///   "weights": [[[0.1, 0.2], [0.3, 0.4]]],
///   "filters": [[[[[1.0]]]], [0], [0]],
///   "stride": [1, 2, 1]
/// }
/// ```

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Real")]
pub struct ModelSource<T: Real = f64> {
  #[serde(rename = "type")]
  pub layers: Vec<String>,
  #[serde(rename = "activity_functions")]
  pub activations: Vec<String>,
  #[serde(default)]
  pub weights: Vec<Vec<Vec<T>>>,
  #[serde(default)]
  pub filters: Vec<FilterEntry<T>>,
  #[serde(rename = "stride", default)]
  pub strides: Vec<usize>,
}


/// Entry of the `filters` list of a [ModelSource].

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, bound = "T: Real")]
pub enum FilterEntry<T: Real = f64> {
  /// `[filter][channel][row][column]`
  Bank(Vec<Vec<Vec<Vec<T>>>>),
  /// Filler for layers that take a slot but have no filters.
  Placeholder(Vec<T>),
}

impl<T: Real> ModelSource<T> {
  pub fn from_json_str(json: &str) -> Result<Self> {
    Ok(serde_json::from_str(json)?)
  }

  pub fn from_json_reader(reader: impl Read) -> Result<Self> {
    Ok(serde_json::from_reader(reader)?)
  }

  /// Resolve names and nested arrays into a validated [ModelDescriptor].

  pub fn build(&self) -> Result<ModelDescriptor<T>> {
    let layers = self.layers.iter()
      .map(|name| name.parse() )
      .collect::<Result<Vec<LayerKind>>>()?;
    let activations = self.activations.iter()
      .map(|name| name.parse() )
      .collect::<Result<Vec<ActivationKind>>>()?;
    let weights = self.weights.iter()
      .map(|rows| Tensor::from_rows(rows) )
      .collect::<Result<Vec<_>>>()?;
    let filters = self.filters.iter()
      .map(|entry| match entry {
        FilterEntry::Bank(bank) => bank.iter()
          .map(|filter| Tensor::from_channels(filter) )
          .collect::<Result<FilterBank<T>>>(),
        FilterEntry::Placeholder(_) => Ok(vec![]),
      })
      .collect::<Result<Vec<_>>>()?;
    ModelDescriptor::new(layers, activations, weights, filters, self.strides.clone())
  }
}


/// Validated, immutable network topology and parameters.
///
/// Built once, then shared read-only by any number of inference calls.
/// The parameter lists are addressed positionally:
///
/// - `activations` has one entry per layer except `Input`.
/// - `weights` has one matrix per `Fully_Connected` layer.
/// - `filters` and `strides` have one entry per `Convoluted`, `Maxpool`
///   or `Flatten` layer.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DescriptorDump<T>", into = "DescriptorDump<T>", bound = "T: Real")]
pub struct ModelDescriptor<T: Real = f64> {
  layers: Vec<LayerKind>,
  activations: Vec<ActivationKind>,
  weights: Vec<Tensor<T>>,
  filters: Vec<FilterBank<T>>,
  strides: Vec<usize>,
}

#[derive(Serialize, Deserialize)]
#[serde(bound = "T: Real")]
struct DescriptorDump<T: Real> {
  layers: Vec<LayerKind>,
  activations: Vec<ActivationKind>,
  weights: Vec<Tensor<T>>,
  filters: Vec<FilterBank<T>>,
  strides: Vec<usize>,
}

impl<T: Real> TryFrom<DescriptorDump<T>> for ModelDescriptor<T> {
  type Error = Error;

  fn try_from(dump: DescriptorDump<T>) -> Result<Self> {
    Self::new(dump.layers, dump.activations, dump.weights, dump.filters, dump.strides)
  }
}

impl<T: Real> From<ModelDescriptor<T>> for DescriptorDump<T> {
  fn from(model: ModelDescriptor<T>) -> Self {
    Self {
      layers: model.layers,
      activations: model.activations,
      weights: model.weights,
      filters: model.filters,
      strides: model.strides,
    }
  }
}

impl<T: Real> ModelDescriptor<T> {
  pub fn new(
    layers: Vec<LayerKind>,
    activations: Vec<ActivationKind>,
    weights: Vec<Tensor<T>>,
    filters: Vec<FilterBank<T>>,
    strides: Vec<usize>,
  ) -> Result<Self> {
    let model = Self { layers, activations, weights, filters, strides };
    model.validate()?;
    Ok(model)
  }

  fn validate(&self) -> Result<()> {
    match self.layers.first() {
      None => return Err(configuration("model has no layers")),
      Some(LayerKind::Input) => {},
      Some(kind) => return Err(configuration(format!("model starts with {kind} instead of Input"))),
    }
    if let Some((index, &kind)) = self.layers.iter().find_position(|kind| **kind == LayerKind::Recurrent ) {
      return Err(Error::UnsupportedLayer { index, kind })
    }

    let count = |f: fn(&LayerKind) -> bool| self.layers.iter().filter(|kind| f(kind) ).count();
    let dense = count(LayerKind::takes_weights);
    let strided = count(LayerKind::takes_stride);
    let activated = count(LayerKind::takes_activation);
    if self.weights.len() != dense {
      return Err(configuration(format!(
        "{} weight matrices for {dense} Fully_Connected layers", self.weights.len())))
    }
    if self.filters.len() != strided || self.strides.len() != strided {
      return Err(configuration(format!(
        "{} filter banks and {} strides for {strided} Convoluted/Maxpool/Flatten layers",
        self.filters.len(), self.strides.len())))
    }
    if self.activations.len() != activated {
      return Err(configuration(format!(
        "{} activations for {activated} non-Input layers", self.activations.len())))
    }
    if let Some(slot) = self.strides.iter().position(|&s| s == 0 ) {
      return Err(configuration(format!("stride {slot} is zero")))
    }

    // Walk the topology once to check what can be known without an input.
    let mut channels: Option<usize> = None;
    let mut width: Option<usize> = None;
    let (mut slot, mut matrix, mut activation) = (0, 0, 0);
    for (index, &kind) in self.layers.iter().enumerate() {
      match kind {
        LayerKind::Input => {
          channels = None;
          width = None;
        },
        LayerKind::Convoluted => {
          let depth = check_bank(&self.filters[slot], index)?;
          if let Some(received) = channels.filter(|&c| c != depth ) {
            return Err(configuration(format!(
              "layer {index} expects {depth} channels but receives {received}")))
          }
          if self.activations[activation] != ActivationKind::Relu {
            warn!("Layer {} is configured with {} but convolutions always floor at zero",
              index, self.activations[activation]);
          }
          channels = Some(self.filters[slot].len());
        },
        LayerKind::Flatten => {
          check_placeholder(&self.filters[slot], index, kind)?;
          channels = None;
          width = None;
        },
        LayerKind::FullyConnected => {
          let weights = &self.weights[matrix];
          if weights.rank() != 2 || weights.size() == 0 {
            return Err(configuration(format!("weights of layer {index} are not a matrix")))
          }
          if let Some(received) = width.filter(|&w| w != weights.dims()[0] ) {
            return Err(configuration(format!(
              "layer {index} expects {} inputs but receives {received}", weights.dims()[0])))
          }
          let kind = self.activations[activation];
          if !kind.is_implemented() {
            return Err(Error::UnimplementedActivation(kind))
          }
          width = Some(weights.dims()[1]);
          matrix += 1;
        },
        LayerKind::Maxpool => check_placeholder(&self.filters[slot], index, kind)?,
        LayerKind::Recurrent => {},
      }
      if kind.takes_stride() { slot += 1 }
      if kind.takes_activation() { activation += 1 }
    }
    Ok(())
  }

  pub fn from_json_str(json: &str) -> Result<Self> {
    ModelSource::from_json_str(json)?.build()
  }

  /// Load a JSON model description from disc.

  pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| io_error(path, source) )?;
    let model = ModelSource::from_json_reader(BufReader::new(file))?.build()?;
    info!("Loaded {} layer model from {}", model.depth(), path.display());
    Ok(model)
  }

  pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| io_error(path, source) )?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &self.to_source())?;
    writer.flush().map_err(|source| io_error(path, source) )
  }

  /// Load a binary snapshot written by [save](Self::save).

  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| io_error(path, source) )?;
    let model: Self = postcard::from_bytes(&bytes)?;
    info!("Loaded {} layer model snapshot from {}", model.depth(), path.display());
    Ok(model)
  }

  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let bytes = postcard::to_allocvec(self)?;
    fs::write(path, bytes).map_err(|source| io_error(path, source) )
  }

  /// The equivalent JSON model description.

  pub fn to_source(&self) -> ModelSource<T> {
    let nested = |tensor: &Tensor<T>| tensor.to_channels().unwrap_or_default();
    ModelSource {
      layers: self.layers.iter().map(|kind| kind.name().to_string() ).collect(),
      activations: self.activations.iter().map(|kind| kind.name().to_string() ).collect(),
      weights: self.weights.iter().map(|w| w.to_rows().unwrap_or_default() ).collect(),
      filters: self.filters.iter()
        .map(|bank| if bank.is_empty() {
          FilterEntry::Placeholder(vec![])
        } else {
          FilterEntry::Bank(bank.iter().map(nested).collect())
        })
        .collect(),
      strides: self.strides.clone(),
    }
  }

  pub fn layers(&self) -> &[LayerKind] {
    &self.layers
  }

  pub fn activations(&self) -> &[ActivationKind] {
    &self.activations
  }

  pub fn weights(&self) -> &[Tensor<T>] {
    &self.weights
  }

  pub fn filters(&self) -> &[FilterBank<T>] {
    &self.filters
  }

  pub fn strides(&self) -> &[usize] {
    &self.strides
  }

  pub fn depth(&self) -> usize {
    self.layers.len()
  }

  /// Width of the final dense layer, if the model ends in one.

  pub fn output_width(&self) -> Option<usize> {
    match self.layers.last() {
      Some(LayerKind::FullyConnected) => self.weights.last().map(|w| w.dims()[1] ),
      _ => None,
    }
  }
}

/// Check a convolution's filter bank and return its channel depth.

fn check_bank<T: Real>(bank: &FilterBank<T>, index: usize) -> Result<usize> {
  let Some(first) = bank.first() else {
    return Err(configuration(format!("Convoluted layer {index} has no filters")))
  };
  let dims = first.dims();
  if dims.len() != 3 || dims[1] != dims[2] || first.size() == 0 {
    return Err(configuration(format!(
      "filters of layer {index} must be non-empty channels × k × k, got {}", first.shape())))
  }
  if bank.iter().any(|filter| filter.dims() != dims ) {
    return Err(configuration(format!("filters of layer {index} differ in shape")))
  }
  Ok(dims[0])
}

/// Only convolutions carry filters.

fn check_placeholder<T: Real>(bank: &FilterBank<T>, index: usize, kind: LayerKind) -> Result<()> {
  if !bank.is_empty() {
    return Err(configuration(format!("{kind} layer {index} cannot carry {} filters", bank.len())))
  }
  Ok(())
}

fn io_error(path: &Path, source: std::io::Error) -> Error {
  Error::Io { path: path.to_path_buf(), source }
}


#[cfg(test)]
mod tests {
  use super::*;

  const DIGITS: &str = r#"{
    "type": ["Input", "Convoluted", "Maxpool", "Flatten", "Fully_Connected", "Fully_Connected"],
    "activity_functions": ["relu", "maxpool", "flatten", "relu", "softmax"],
    "weights": [
      [[1, 0, 0], [0, 1, 0], [0, 0, 1], [1, 1, 1]],
      [[1, 0], [0, 1], [1, 1]]
    ],
    "filters": [
      [[[[1, 0], [0, 1]]], [[[0, 1], [1, 0]]]],
      [0],
      [0]
    ],
    "stride": [1, 2, 1]
  }"#;

  fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("convnet-{}-{name}", std::process::id()))
  }

  #[test]
  fn build_from_json() {
    let model: ModelDescriptor = ModelDescriptor::from_json_str(DIGITS).unwrap();
    assert_eq!(model.depth(), 6);
    assert_eq!(model.layers()[4], LayerKind::FullyConnected);
    assert_eq!(model.activations(), &[
      ActivationKind::Relu, ActivationKind::Maxpool, ActivationKind::Flatten,
      ActivationKind::Relu, ActivationKind::SoftMax,
    ]);
    assert_eq!(model.filters()[0].len(), 2);
    assert_eq!(model.filters()[0][0].dims(), &[1,2,2]);
    assert!(model.filters()[1].is_empty());
    assert_eq!(model.strides(), &[1, 2, 1]);
    assert_eq!(model.output_width(), Some(2));
  }

  #[test]
  fn unknown_names() {
    let json = DIGITS.replace("\"Maxpool\"", "\"AvgPool\"");
    assert!(matches!(ModelDescriptor::<f64>::from_json_str(&json), Err(Error::UnknownLayer(name)) if name == "AvgPool"));

    let json = DIGITS.replace("\"softmax\"", "\"swish\"");
    assert!(matches!(ModelDescriptor::<f64>::from_json_str(&json), Err(Error::UnknownActivation(_))));
  }

  #[test]
  fn recurrent_is_unsupported() {
    let model = ModelDescriptor::<f64>::new(
      vec![LayerKind::Input, LayerKind::Recurrent],
      vec![ActivationKind::Pass],
      vec![], vec![], vec![],
    );
    assert!(matches!(model, Err(Error::UnsupportedLayer { index: 1, kind: LayerKind::Recurrent })));
  }

  #[test]
  fn collection_lengths() {
    let dense = |weights: Vec<Tensor>| ModelDescriptor::new(
      vec![LayerKind::Input, LayerKind::FullyConnected],
      vec![ActivationKind::Pass],
      weights, vec![], vec![],
    );
    assert!(dense(vec![Tensor::zeros(&[2,2])]).is_ok());
    assert!(matches!(dense(vec![]), Err(Error::Configuration(_))));

    let strided = ModelDescriptor::<f64>::new(
      vec![LayerKind::Input, LayerKind::Maxpool],
      vec![ActivationKind::Maxpool],
      vec![], vec![vec![]], vec![],
    );
    assert!(matches!(strided, Err(Error::Configuration(_))));

    let activations = ModelDescriptor::<f64>::new(
      vec![LayerKind::Input, LayerKind::Flatten],
      vec![],
      vec![], vec![vec![]], vec![1],
    );
    assert!(matches!(activations, Err(Error::Configuration(_))));
  }

  #[test]
  fn must_start_with_input() {
    let model = ModelDescriptor::<f64>::new(
      vec![LayerKind::Flatten],
      vec![ActivationKind::Flatten],
      vec![], vec![vec![]], vec![1],
    );
    assert!(matches!(model, Err(Error::Configuration(_))));
    assert!(ModelDescriptor::<f64>::new(vec![], vec![], vec![], vec![], vec![]).is_err());
  }

  #[test]
  fn zero_stride() {
    let json = DIGITS.replace("\"stride\": [1, 2, 1]", "\"stride\": [1, 0, 1]");
    assert!(matches!(ModelDescriptor::<f64>::from_json_str(&json), Err(Error::Configuration(_))));
  }

  #[test]
  fn convolution_needs_filters() {
    let json = DIGITS.replace("[[[[1, 0], [0, 1]]], [[[0, 1], [1, 0]]]]", "[0]");
    assert!(matches!(ModelDescriptor::<f64>::from_json_str(&json), Err(Error::Configuration(_))));
  }

  #[test]
  fn dense_chain_mismatch() {
    let json = DIGITS.replace("[[1, 0], [0, 1], [1, 1]]", "[[1, 0], [0, 1]]");
    assert!(matches!(ModelDescriptor::<f64>::from_json_str(&json), Err(Error::Configuration(_))));
  }

  #[test]
  fn channel_chain_mismatch() {
    let model = ModelDescriptor::<f64>::new(
      vec![LayerKind::Input, LayerKind::Convoluted, LayerKind::Convoluted],
      vec![ActivationKind::Relu, ActivationKind::Relu],
      vec![],
      vec![vec![Tensor::zeros(&[1,1,1]); 2], vec![Tensor::zeros(&[3,1,1])]],
      vec![1, 1],
    );
    assert!(matches!(model, Err(Error::Configuration(_))));
  }

  #[test]
  fn filters_only_on_convolutions() {
    let pooled = ModelDescriptor::<f64>::new(
      vec![LayerKind::Input, LayerKind::Maxpool],
      vec![ActivationKind::Maxpool],
      vec![],
      vec![vec![Tensor::zeros(&[2,2])]],
      vec![2],
    );
    assert!(matches!(pooled, Err(Error::Configuration(_))));

    let json = DIGITS.replace("[0],\n      [0]", "[0],\n      [[[[1]]]]");
    assert!(matches!(ModelDescriptor::<f64>::from_json_str(&json), Err(Error::Configuration(_))));
  }

  #[test]
  fn generic_serde() {
    fn roundtrip<T: Real>(model: &ModelDescriptor<T>) -> ModelDescriptor<T> {
      let bytes = postcard::to_allocvec(model).unwrap();
      let model: ModelDescriptor<T> = postcard::from_bytes(&bytes).unwrap();
      let json = serde_json::to_string(&model.to_source()).unwrap();
      serde_json::from_str::<ModelSource<T>>(&json).unwrap().build().unwrap()
    }
    let model: ModelDescriptor<f32> = ModelDescriptor::from_json_str(DIGITS).unwrap();
    assert_eq!(roundtrip(&model), model);
    let model: ModelDescriptor<f64> = ModelDescriptor::from_json_str(DIGITS).unwrap();
    assert_eq!(roundtrip(&model), model);
  }

  #[test]
  fn dense_activation_must_be_implemented() {
    let json = DIGITS.replace("\"softmax\"", "\"tanh\"");
    assert!(matches!(
      ModelDescriptor::<f64>::from_json_str(&json),
      Err(Error::UnimplementedActivation(ActivationKind::Tanh))
    ));
  }

  #[test]
  fn ragged_weights() {
    let json = DIGITS.replace("[[1, 0], [0, 1], [1, 1]]", "[[1, 0], [0], [1, 1]]");
    assert!(matches!(ModelDescriptor::<f64>::from_json_str(&json), Err(Error::Shape(_))));
  }

  #[test]
  fn malformed_json() {
    assert!(matches!(ModelDescriptor::<f64>::from_json_str("{\"type\": 3}"), Err(Error::Json(_))));
  }

  #[test]
  fn json_roundtrip() {
    let model: ModelDescriptor = ModelDescriptor::from_json_str(DIGITS).unwrap();
    let json = serde_json::to_string(&model.to_source()).unwrap();
    assert_eq!(ModelDescriptor::from_json_str(&json).unwrap(), model);

    let path = temp_path("model.json");
    model.save_json(&path).unwrap();
    assert_eq!(ModelDescriptor::load_json(&path).unwrap(), model);
    fs::remove_file(&path).unwrap();
  }

  #[test]
  fn snapshot_roundtrip() {
    let model: ModelDescriptor<f32> = ModelDescriptor::from_json_str(DIGITS).unwrap();
    let path = temp_path("model.bin");
    model.save(&path).unwrap();
    assert_eq!(ModelDescriptor::<f32>::load(&path).unwrap(), model);
    fs::remove_file(&path).unwrap();
  }

  #[test]
  fn missing_file() {
    let result = ModelDescriptor::<f64>::load_json(temp_path("missing.json"));
    assert!(matches!(result, Err(Error::Io { .. })));
  }

  #[test]
  fn shareable() {
    fn assert_sync<S: Send + Sync>() {}
    assert_sync::<ModelDescriptor<f32>>();
    assert_sync::<ModelDescriptor<f64>>();
  }
}
