use crate::{
  error::Result,
  scalar::Real,
};


/// Low-level compute operations.

pub trait Cops<T: Real> {
  fn matmul(&self, rhs: &Self) -> Vec<T>;
}


/// Reductions, products and sub-region extraction.

pub trait NumericOps<T: Real>: Sized {
  /// Sum of all elements, regardless of rank.
  fn sum(&self) -> T;

  /// Greatest element, `None` when empty.
  fn max(&self) -> Option<T>;

  /// Position of the greatest element of a flat or single-row tensor.
  fn argmax(&self) -> Option<usize>;

  /// Elementwise product of two equally shaped tensors.
  fn multiply(&self, rhs: &Self) -> Result<Self>;

  /// Row-by-column matrix product.
  fn mm(&self, rhs: &Self) -> Result<Self>;

  /// Square region of the last two dimensions, starting at row `y`
  /// and column `x`. Leading dimensions are kept whole.
  fn window(&self, y: usize, x: usize, side: usize) -> Result<Self>;
}


/// Elementwise nonlinearities.

pub trait RealOps<T: Real>: Sized {
  fn exp(&self) -> Self;
  fn relu(&self) -> Self;
  fn sigmoid(&self) -> Self;

  /// Normalized exponentials of the first row. Further rows are ignored.
  fn softmax(&self) -> Result<Self>;
}
