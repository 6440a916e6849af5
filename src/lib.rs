//! Forward-pass inference for small convolutional networks.
//! Tiny. Few dependencies. CPU only.
//!
//! # Features
//!
//! - **Layer stack interpreter**: Models are a flat list of `Input`,
//! `Convoluted`, `Maxpool`, `Flatten` and `Fully_Connected` layers, with their
//! parameters addressed positionally, just like the JSON files describing them.
//!
//! - **Validated up front**: Descriptors are checked when they are built, so an
//! inconsistent model fails at load time rather than halfway through a pass.
//!
//! - **Shareable**: A [ModelDescriptor] is immutable once built and may be used
//! by any number of threads at once.
//!
//! - **Generic precision**: Networks run on `f32` or `f64`, or any other type
//! implementing [scalar::Real].
//!
//! # Examples
//!
//! Classifying an image:
//! ```
//! use convnet::{ ModelDescriptor, Network, Settings, Tensor };
//!
//! let model = ModelDescriptor::from_json_str(r#"{
//!   "type": ["Input", "Flatten", "Fully_Connected"],
//!   "activity_functions": ["flatten", "softmax"],
//!   "weights": [[[1, 0], [0, 1], [0, 0], [0, 0]]],
//!   "filters": [[0]],
//!   "stride": [1]
//! }"#).unwrap();
//!
//! let settings = Settings { labels: vec!["left".into(), "right".into()], ..Settings::default() };
//! let network = Network::new(model, settings).unwrap();
//!
//! let image = Tensor::new(&[1, 2, 2], vec![0.0, 3.0, 0.0, 0.0]).unwrap();
//! let prediction = network.classify(&image).unwrap();
//! assert_eq!(prediction.label.as_deref(), Some("right"));
//! ```
//!
//! ## More examples
//! Check the `/demos` folder for more example code.
//!
//!
//! # Optional features
//!
//! Some features can be toggled in your `Cargo.toml`.
//!
//! - `unsafe` *(default)*: Accelerated matrix math using [matrixmultiply] crate.

mod internal;
mod shape;
mod tensor;

pub mod ops;
pub mod scalar;
pub mod activation;
pub mod layer;
pub mod model;
pub mod config;
pub mod network;
pub mod error;

pub use shape::Shape;
pub use tensor::Tensor;
pub use error::{ Error, Result };
pub use activation::ActivationKind;
pub use layer::LayerKind;
pub use model::{ ModelDescriptor, ModelSource, FilterEntry, FilterBank };
pub use config::Settings;
pub use network::{ Network, Signal, Prediction, infer };
