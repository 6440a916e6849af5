use crate::{
  activation::ActivationKind,
  error::Result,
  ops::NumericOps,
  scalar::Real,
  tensor::Tensor,
};


/// Fully connected layer: `activation(input · weights)`.

pub fn dense<T: Real>(input: &Tensor<T>, activation: ActivationKind, weights: &Tensor<T>) -> Result<Tensor<T>> {
  let product = input.mm(weights)?;
  activation.apply(&product)
}
