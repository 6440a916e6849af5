use serde::{Serialize, Deserialize};

use crate::internal::*;


/// The shape of a [Tensor](crate::Tensor).
///
/// Tensors in this crate are always stored contiguously in row-major
/// order, so the strides follow directly from the dimensions.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<usize>", into = "Vec<usize>")]
pub struct Shape {
  pub(crate) dims: Vec<usize>,
  pub(crate) strides: Vec<usize>,
}

impl Shape {
  pub fn new(dims: &[usize]) -> Self {
    Self {
      dims: dims.to_vec(),
      strides: Self::make_strides(dims),
    }
  }

  fn make_strides(dims: &[usize]) -> Vec<usize> {
    if dims.is_empty() { return vec![] }
    let mut strides = vec![0; dims.len()];
    strides[dims.len() - 1] = 1;
    for i in (1..dims.len()).rev() {
      strides[i - 1] = dims[i] * strides[i];
    }
    strides
  }

  pub fn size(&self) -> usize {
    self.dims.iter().product()
  }

  pub fn rank(&self) -> usize {
    self.dims.len()
  }

  pub fn dims(&self) -> &[usize] {
    &self.dims
  }

  pub fn strides(&self) -> &[usize] {
    &self.strides
  }

  /// Flat buffer position of the element at `indices`.
  /// Missing trailing indices count as zero.

  pub(crate) fn index(&self, indices: &[usize]) -> usize {
    debug_assert!(indices.len() <= self.rank());
    indices.iter()
      .zip(&self.strides)
      .map(|(&i, &s)| i * s )
      .sum()
  }

  pub(crate) fn contains(&self, indices: &[usize]) -> bool {
    indices.len() == self.rank() &&
      indices.iter().zip(&self.dims).all(|(&i, &n)| i < n )
  }

  /// Drop the leading dimension.

  pub fn inner(&self) -> Self {
    Self::new(&self.dims[1.min(self.rank())..])
  }

  /// Add a leading dimension of size `n`.

  pub fn outer(&self, n: usize) -> Self {
    let mut dims = self.dims.clone();
    dims.insert(0, n);
    Self::new(&dims)
  }
}

impl From<Vec<usize>> for Shape {
  fn from(dims: Vec<usize>) -> Self {
    Self::new(&dims)
  }
}

impl From<Shape> for Vec<usize> {
  fn from(shape: Shape) -> Self {
    shape.dims
  }
}

impl std::ops::Index<isize> for Shape {
  type Output = usize;

  fn index(&self, i: isize) -> &usize {
    let idx = negative_index(i, self.rank());
    &self.dims[idx]
  }
}

impl std::fmt::Display for Shape {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "Shape{:?}", self.dims)
  }
}
