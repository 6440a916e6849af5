use crate::{
  error::Result,
  scalar::Real,
  tensor::Tensor,
};


/// Concatenate channels, rows and columns, in that order, into one sequence.

pub fn flatten<T: Real>(input: &Tensor<T>) -> Result<Tensor<T>> {
  input.expect_rank(3)?;
  Ok(Tensor::vec(input.raw()))
}
