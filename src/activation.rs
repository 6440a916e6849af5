use std::str::FromStr;

use serde::{Serialize, Deserialize};

use crate::{
  error::{ Error, Result },
  ops::RealOps,
  scalar::Real,
  tensor::Tensor,
};


/// Nonlinearity applied to the output of a dense layer.
///
/// Only `Input`, `Pass`, `Relu`, `Sigmoid` and `SoftMax` have numeric
/// behavior. The remaining kinds exist so that any descriptor can be
/// represented, but applying them is an error.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum ActivationKind {
  Input,
  Pass,
  Sigmoid,
  Relu,
  LeakyRelu,
  Tanh,
  SoftMax,
  Maxpool,
  Flatten,
}

impl ActivationKind {
  pub const ALL: [ActivationKind; 9] = [
    Self::Input, Self::Pass, Self::Sigmoid, Self::Relu, Self::LeakyRelu,
    Self::Tanh, Self::SoftMax, Self::Maxpool, Self::Flatten,
  ];

  /// Name used in model descriptions.

  pub fn name(&self) -> &'static str {
    match self {
      Self::Input => "input",
      Self::Pass => "pass",
      Self::Sigmoid => "sigmoid",
      Self::Relu => "relu",
      Self::LeakyRelu => "leaky relu",
      Self::Tanh => "tanh",
      Self::SoftMax => "softmax",
      Self::Maxpool => "maxpool",
      Self::Flatten => "flatten",
    }
  }

  pub fn is_implemented(&self) -> bool {
    matches!(self, Self::Input | Self::Pass | Self::Relu | Self::Sigmoid | Self::SoftMax)
  }

  /// Apply the activation to a matrix.
  ///
  /// `Relu` is an identity here. Convolutions floor their output at
  /// zero on their own, and dense layers configured with `relu` pass
  /// their product through unchanged.

  pub fn apply<T: Real>(&self, input: &Tensor<T>) -> Result<Tensor<T>> {
    input.expect_rank(2)?;
    match self {
      Self::Input | Self::Pass | Self::Relu => Ok(input.clone()),
      Self::Sigmoid => Ok(input.sigmoid()),
      Self::SoftMax => input.softmax(),
      Self::LeakyRelu | Self::Tanh | Self::Maxpool | Self::Flatten =>
        Err(Error::UnimplementedActivation(*self)),
    }
  }
}

impl FromStr for ActivationKind {
  type Err = Error;

  fn from_str(name: &str) -> Result<Self> {
    match name {
      "input" => Ok(Self::Input),
      "pass" => Ok(Self::Pass),
      "sigmoid" => Ok(Self::Sigmoid),
      "relu" => Ok(Self::Relu),
      "leaky relu" | "leadky relu" => Ok(Self::LeakyRelu),
      "tanh" | "tahn" => Ok(Self::Tanh),
      "softmax" => Ok(Self::SoftMax),
      "maxpool" => Ok(Self::Maxpool),
      "flatten" => Ok(Self::Flatten),
      _ => Err(Error::UnknownActivation(name.to_string())),
    }
  }
}

impl TryFrom<String> for ActivationKind {
  type Error = Error;

  fn try_from(name: String) -> Result<Self> {
    name.parse()
  }
}

impl From<ActivationKind> for &'static str {
  fn from(kind: ActivationKind) -> Self {
    kind.name()
  }
}

impl std::fmt::Display for ActivationKind {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "{}", self.name())
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use rand::Rng;
  use crate::ops::NumericOps;

  fn row(values: &[f64]) -> Tensor {
    Tensor::new(&[1, values.len()], values.to_vec()).unwrap()
  }

  #[test]
  fn names() {
    for kind in ActivationKind::ALL {
      assert_eq!(kind.name().parse::<ActivationKind>().unwrap(), kind);
    }
    assert_eq!("tahn".parse::<ActivationKind>().unwrap(), ActivationKind::Tanh);
    assert_eq!("leadky relu".parse::<ActivationKind>().unwrap(), ActivationKind::LeakyRelu);
    assert!(matches!("swish".parse::<ActivationKind>(), Err(Error::UnknownActivation(name)) if name == "swish"));
  }

  #[test]
  fn serde_names() {
    let kinds: Vec<ActivationKind> = serde_json::from_str(r#"["relu", "softmax"]"#).unwrap();
    assert_eq!(kinds, vec![ActivationKind::Relu, ActivationKind::SoftMax]);
    assert_eq!(serde_json::to_string(&ActivationKind::LeakyRelu).unwrap(), r#""leaky relu""#);
    assert!(serde_json::from_str::<ActivationKind>(r#""gelu""#).is_err());
  }

  #[test]
  fn identities() {
    let m = Tensor::new(&[2,2], vec![-1., 2., -3., 4.]).unwrap();
    for kind in [ActivationKind::Input, ActivationKind::Pass, ActivationKind::Relu] {
      assert_eq!(kind.apply(&m).unwrap(), m);
    }
  }

  #[test]
  fn sigmoid() {
    let out = ActivationKind::Sigmoid.apply(&row(&[0., 2.])).unwrap();
    assert_eq!(out.raw()[0], 0.5);
    assert!((out.raw()[1] - 1. / (1. + (-2f64).exp())).abs() < 1e-12);
  }

  #[test]
  fn softmax_sums_to_one() {
    let out = ActivationKind::SoftMax.apply(&row(&[1., -2., 0.5, 3.])).unwrap();
    assert_eq!(out.dims(), &[1,4]);
    assert!((out.sum() - 1.).abs() < 1e-12);
  }

  #[test]
  fn softmax_shift_invariant() {
    let mut rng = rand::thread_rng();
    for _ in 0..20 {
      let values: Vec<f64> = (0..10).map(|_| rng.gen_range(-5.0..5.0) ).collect();
      let shift = rng.gen_range(-50.0..50.0);
      let shifted: Vec<f64> = values.iter().map(|v| v + shift ).collect();
      let a = ActivationKind::SoftMax.apply(&row(&values)).unwrap();
      let b = ActivationKind::SoftMax.apply(&row(&shifted)).unwrap();
      for (x, y) in a.raw().iter().zip(b.raw()) {
        assert!((x - y).abs() < 1e-9);
      }
    }
  }

  #[test]
  fn unimplemented() {
    let m = row(&[1., 2.]);
    for kind in ActivationKind::ALL.into_iter().filter(|kind| !kind.is_implemented() ) {
      assert!(matches!(kind.apply(&m), Err(Error::UnimplementedActivation(k)) if k == kind));
    }
  }

  #[test]
  fn requires_matrix() {
    assert!(ActivationKind::Pass.apply(&Tensor::<f64>::vec(&[1., 2.])).is_err());
  }
}
