use log::{ debug, warn };

use crate::{
  activation::ActivationKind,
  config::Settings,
  error::{ Error, Result },
  layer::{ self, LayerKind },
  model::ModelDescriptor,
  ops::NumericOps,
  scalar::Real,
  tensor::Tensor,
};


/// Value flowing between layers.
///
/// Spatial layers consume and produce volumes, `Flatten` turns a volume
/// into a sequence and dense layers produce single-row matrices.

#[derive(Debug, Clone, PartialEq)]
pub enum Signal<T: Real = f64> {
  /// `channels × rows × cols`
  Volume(Tensor<T>),
  /// `rows × cols`
  Matrix(Tensor<T>),
  /// Flat sequence of values.
  Sequence(Tensor<T>),
}

impl<T: Real> Signal<T> {
  /// Wrap a network input. Matrices are promoted to one channel.

  pub fn input(tensor: &Tensor<T>) -> Result<Self> {
    match tensor.rank() {
      3 => Ok(Self::Volume(tensor.clone())),
      2 => Ok(Self::Volume(tensor.reshape(&[1, tensor.dims()[0], tensor.dims()[1]])?)),
      _ => Err(Error::Shape(format!("network input must be an image, got {}", tensor.shape()))),
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      Self::Volume(_) => "volume",
      Self::Matrix(_) => "matrix",
      Self::Sequence(_) => "sequence",
    }
  }

  pub fn tensor(&self) -> &Tensor<T> {
    match self {
      Self::Volume(t) | Self::Matrix(t) | Self::Sequence(t) => t,
    }
  }

  pub fn into_tensor(self) -> Tensor<T> {
    match self {
      Self::Volume(t) | Self::Matrix(t) | Self::Sequence(t) => t,
    }
  }
}


/// Outcome of [Network::classify].

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction<T: Real = f64> {
  pub index: usize,
  pub label: Option<String>,
  pub score: T,
}


/// A model ready for inference.
///
/// The descriptor is never modified, so a `Network` can serve any number
/// of concurrent [infer](Network::infer) calls.

#[derive(Debug, Clone)]
pub struct Network<T: Real = f64> {
  model: ModelDescriptor<T>,
  settings: Settings,
}

impl<T: Real> Network<T> {
  pub fn new(model: ModelDescriptor<T>, settings: Settings) -> Result<Self> {
    settings.validate()?;
    if let Some(width) = model.output_width().filter(|&w| w != settings.labels.len() ) {
      warn!("Model produces {} scores but {} labels are configured", width, settings.labels.len());
    }
    Ok(Self { model, settings })
  }

  pub fn model(&self) -> &ModelDescriptor<T> {
    &self.model
  }

  pub fn settings(&self) -> &Settings {
    &self.settings
  }

  /// Run one forward pass over `input`, a `channels × rows × cols` image.

  pub fn infer(&self, input: &Tensor<T>) -> Result<Tensor<T>> {
    Inference::new(&self.model, &self.settings).run(input)
  }

  /// Run a forward pass and pick the highest scoring class.

  pub fn classify(&self, input: &Tensor<T>) -> Result<Prediction<T>> {
    let output = self.infer(input)?;
    let index = output.argmax()
      .ok_or_else(|| Error::Shape(format!("cannot pick a class from {}", output.shape())) )?;
    Ok(Prediction {
      index,
      label: self.settings.label(index).map(str::to_string),
      score: output.raw()[index],
    })
  }
}

impl<T: Real> From<ModelDescriptor<T>> for Network<T> {
  fn from(model: ModelDescriptor<T>) -> Self {
    Self { model, settings: Settings::default() }
  }
}


/// Run one forward pass of `model` with default settings.

pub fn infer<T: Real>(model: &ModelDescriptor<T>, input: &Tensor<T>) -> Result<Tensor<T>> {
  Inference::new(model, &Settings::default()).run(input)
}


/// State of a single forward pass.
///
/// Each parameter list of the descriptor gets its own cursor, advanced
/// whenever a layer consumes an entry from it.

struct Inference<'a, T: Real> {
  model: &'a ModelDescriptor<T>,
  settings: &'a Settings,
  signal: Option<Signal<T>>,
  dense_seen: usize,
  strided_seen: usize,
  activations_seen: usize,
}

impl<'a, T: Real> Inference<'a, T> {
  fn new(model: &'a ModelDescriptor<T>, settings: &'a Settings) -> Self {
    Self {
      model,
      settings,
      signal: None,
      dense_seen: 0,
      strided_seen: 0,
      activations_seen: 0,
    }
  }

  fn run(mut self, input: &Tensor<T>) -> Result<Tensor<T>> {
    for (index, &kind) in self.model.layers().iter().enumerate() {
      let signal = self.step(index, kind, input)?;
      debug!("Layer {} ({}) produced {}", index, kind, signal.tensor().shape());
      self.signal = Some(signal);
    }
    self.signal
      .map(Signal::into_tensor)
      .ok_or_else(|| Error::Configuration("model has no layers".to_string()) )
  }

  fn step(&mut self, index: usize, kind: LayerKind, input: &Tensor<T>) -> Result<Signal<T>> {
    let activation = if kind.takes_activation() { Some(self.next_activation()) } else { None };
    match kind {
      LayerKind::Input => Signal::input(input),

      LayerKind::Convoluted => {
        let volume = self.volume(index, kind)?;
        let slot = self.next_slot();
        let filters = &self.model.filters()[slot];
        let stride = self.model.strides()[slot];
        Ok(Signal::Volume(layer::convolve(&volume, filters, stride)?))
      },

      LayerKind::Maxpool => {
        let volume = self.volume(index, kind)?;
        let stride = self.model.strides()[self.next_slot()];
        Ok(Signal::Volume(layer::max_pool(&volume, self.settings.pool_window, stride)?))
      },

      LayerKind::Flatten => {
        let volume = self.volume(index, kind)?;
        self.next_slot();
        Ok(Signal::Sequence(layer::flatten(&volume)?))
      },

      LayerKind::FullyConnected => {
        let matrix = match self.signal.take() {
          Some(Signal::Matrix(matrix)) => matrix,
          Some(Signal::Sequence(sequence)) => {
            let len = sequence.size();
            sequence.reshape(&[1, len])?
          },
          other => return Err(transition(index, kind, other.as_ref())),
        };
        let weights = &self.model.weights()[self.dense_seen];
        self.dense_seen += 1;
        let activation = activation.unwrap_or(ActivationKind::Pass);
        Ok(Signal::Matrix(layer::dense(&matrix, activation, weights)?))
      },

      LayerKind::Recurrent => Err(Error::UnsupportedLayer { index, kind }),
    }
  }

  fn volume(&mut self, index: usize, kind: LayerKind) -> Result<Tensor<T>> {
    match self.signal.take() {
      Some(Signal::Volume(volume)) => Ok(volume),
      other => Err(transition(index, kind, other.as_ref())),
    }
  }

  fn next_slot(&mut self) -> usize {
    self.strided_seen += 1;
    self.strided_seen - 1
  }

  fn next_activation(&mut self) -> ActivationKind {
    let kind = self.model.activations()[self.activations_seen];
    self.activations_seen += 1;
    kind
  }
}

fn transition<T: Real>(index: usize, kind: LayerKind, found: Option<&Signal<T>>) -> Error {
  Error::Transition { index, kind, found: found.map_or("nothing", Signal::name) }
}
