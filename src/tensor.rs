use std::fmt::Debug;

use serde::{Serialize, Deserialize};

mod cops;
mod lops;

use crate::{
  error::{ Error, Result },
  shape::Shape,
  scalar::Real,
};


/// Contiguous row-major array of rank 1 (flat sequence), rank 2
/// (rows × columns) or rank 3 (channels × rows × columns).
///
/// Tensors are plain values: every operation allocates a fresh result
/// and leaves its inputs untouched, so a tensor may be freely shared
/// between threads once built.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TensorDump<T>", into = "TensorDump<T>", bound = "T: Real")]
pub struct Tensor<T: Real = f64> {
  shape: Shape,
  data: Vec<T>,
}

#[derive(Serialize, Deserialize)]
struct TensorDump<T> {
  dims: Vec<usize>,
  data: Vec<T>,
}

impl<T: Real> TryFrom<TensorDump<T>> for Tensor<T> {
  type Error = Error;

  fn try_from(dump: TensorDump<T>) -> Result<Self> {
    Self::new(&dump.dims, dump.data)
  }
}

impl<T: Real> From<Tensor<T>> for TensorDump<T> {
  fn from(tensor: Tensor<T>) -> Self {
    Self { dims: tensor.shape.dims, data: tensor.data }
  }
}

impl<T: Real> Tensor<T> {
  pub fn from_shape(shape: Shape, data: Vec<T>) -> Result<Self> {
    if shape.size() != data.len() {
      return Err(shape_error(format!("{} doesn't match data length {}", shape, data.len())))
    }
    Ok(Self { shape, data })
  }

  pub fn new(dims: &[usize], data: Vec<T>) -> Result<Self> {
    Self::from_shape(Shape::new(dims), data)
  }

  pub fn vec(vec: &[T]) -> Self {
    Self::from_vec(vec.to_vec())
  }

  pub fn from_vec(vec: Vec<T>) -> Self {
    Self { shape: Shape::new(&[vec.len()]), data: vec }
  }

  pub fn fill(dims: &[usize], filler: T) -> Self {
    Self { shape: Shape::new(dims), data: vec![filler; dims.iter().product()] }
  }

  pub fn zeros(dims: &[usize]) -> Self {
    Self::fill(dims, T::zero())
  }

  /// Build a matrix from nested rows. All rows must have equal length.

  pub fn from_rows(rows: &[Vec<T>]) -> Result<Self> {
    let cols = rows.first().map(|row| row.len() ).unwrap_or(0);
    if let Some(row) = rows.iter().position(|row| row.len() != cols ) {
      return Err(shape_error(format!(
        "row {row} has {} columns, expected {cols}", rows[row].len())))
    }
    Self::new(&[rows.len(), cols], rows.concat())
  }

  /// Build a multi-channel tensor from nested channels of rows.
  /// All channels must have equal dimensions.

  pub fn from_channels(channels: &[Vec<Vec<T>>]) -> Result<Self> {
    let channels = channels.iter()
      .map(|rows| Self::from_rows(rows) )
      .collect::<Result<Vec<_>>>()?;
    Self::stack(&channels)
  }

  /// Join equally shaped tensors along a new leading dimension.

  pub fn stack(tensors: &[Self]) -> Result<Self> {
    let Some(first) = tensors.first() else {
      return Err(shape_error("cannot stack zero tensors"))
    };
    if let Some(other) = tensors.iter().find(|t| t.shape != first.shape ) {
      return Err(shape_error(format!("cannot stack {} with {}", first.shape, other.shape)))
    }
    let data = tensors.iter()
      .map(|t| t.data.as_slice() )
      .collect::<Vec<_>>()
      .concat();
    Self::from_shape(first.shape.outer(tensors.len()), data)
  }

  pub fn shape(&self) -> &Shape {
    &self.shape
  }

  pub fn dims(&self) -> &[usize] {
    &self.shape.dims
  }

  pub fn rank(&self) -> usize {
    self.shape.rank()
  }

  pub fn size(&self) -> usize {
    self.shape.size()
  }

  pub fn raw(&self) -> &[T] {
    &self.data
  }

  pub fn into_raw(self) -> Vec<T> {
    self.data
  }

  pub fn get(&self, indices: &[usize]) -> Option<T> {
    if !self.shape.contains(indices) { return None }
    Some(self.data[self.shape.index(indices)])
  }

  /// Copy out the sub-tensor at position `index` of the leading dimension.

  pub fn at(&self, index: usize) -> Option<Self> {
    if self.rank() == 0 || index >= self.shape[0] { return None }
    let inner = self.shape.inner();
    let start = self.shape.index(&[index]);
    let data = self.data[start..start + inner.size()].to_vec();
    Some(Self { shape: inner, data })
  }

  /// Iterate over the sub-tensors of the leading dimension.

  pub fn iter(&self) -> impl Iterator<Item = Self> + '_ {
    let n = if self.rank() == 0 { 0 } else { self.shape[0] };
    (0..n).filter_map(move |i| self.at(i) )
  }

  pub fn reshape(&self, dims: &[usize]) -> Result<Self> {
    Self::new(dims, self.data.clone())
  }

  /// Nested rows of a matrix.

  pub fn to_rows(&self) -> Result<Vec<Vec<T>>> {
    self.expect_rank(2)?;
    Ok(self.data.chunks(self.shape[1].max(1)).map(|row| row.to_vec() ).collect())
  }

  /// Nested channels of a multi-channel tensor.

  pub fn to_channels(&self) -> Result<Vec<Vec<Vec<T>>>> {
    self.expect_rank(3)?;
    self.iter().map(|channel| channel.to_rows() ).collect()
  }

  pub fn vectorize<F>(&self, cb: F) -> Self
  where
    F: FnMut(T) -> T,
  {
    let data = self.data.iter().copied().map(cb).collect();
    Self { shape: self.shape.clone(), data }
  }

  pub fn zip<F>(&self, rhs: &Self, cb: F) -> Result<Self>
  where
    F: Fn((T, T)) -> T,
  {
    if self.shape != rhs.shape {
      return Err(shape_error(format!("cannot combine {} with {}", self.shape, rhs.shape)))
    }
    let data = self.data.iter().copied()
      .zip(rhs.data.iter().copied())
      .map(cb)
      .collect();
    Ok(Self { shape: self.shape.clone(), data })
  }

  pub(crate) fn expect_rank(&self, rank: usize) -> Result<()> {
    if self.rank() != rank {
      return Err(shape_error(format!("expected a rank {rank} tensor, got {}", self.shape)))
    }
    Ok(())
  }
}

pub(crate) fn shape_error(message: impl Into<String>) -> Error {
  Error::Shape(message.into())
}

impl<T: Real> std::fmt::Display for Tensor<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "Tensor{:?} ", self.shape.dims)?;
    print_chunks(0, &self.shape, &self.data, f)?;
    Ok(())
  }
}

fn print_chunks<T: Debug>(idx: usize, shape: &Shape, vec: &[T], f: &mut std::fmt::Formatter) -> std::fmt::Result {
  let indent = (0..idx * 2).map(|_| " ").collect::<String>();
  if shape.rank() == 0 || vec.is_empty() {
    writeln!(f, "{indent}{:?}", vec)?;
  } else if idx == shape.rank() - 1 {
    writeln!(f, "{indent}{:?}", vec)?;
  } else {
    let chunks = vec.chunks(vec.len() / shape.dims[idx]);
    writeln!(f, "{indent}[")?;
    for chunk in chunks {
      print_chunks(idx + 1, shape, chunk, f)?;
    }
    writeln!(f, "{indent}]")?;
  }
  Ok(())
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_checks_length() {
    assert!(Tensor::new(&[2,2], vec![1.0, 2.0, 3.0]).is_err());
    assert_eq!(Tensor::new(&[2,2], vec![1.0, 2.0, 3.0, 4.0]).unwrap().size(), 4);
  }

  #[test]
  fn from_rows() {
    let m = Tensor::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
    assert_eq!(m.dims(), &[2,3]);
    assert_eq!(m.get(&[1,0]), Some(4.0));
    assert_eq!(m.get(&[2,0]), None);
    assert_eq!(m.to_rows().unwrap(), vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
  }

  #[test]
  fn ragged_rows() {
    let rows = vec![vec![1.0, 2.0], vec![3.0]];
    assert!(matches!(Tensor::<f64>::from_rows(&rows), Err(Error::Shape(_))));
  }

  #[test]
  fn from_channels() {
    let channels = vec![
      vec![vec![1.0, 2.0], vec![3.0, 4.0]],
      vec![vec![5.0, 6.0], vec![7.0, 8.0]],
    ];
    let t = Tensor::from_channels(&channels).unwrap();
    assert_eq!(t.dims(), &[2,2,2]);
    assert_eq!(t.get(&[1,0,1]), Some(6.0));
    assert_eq!(t.to_channels().unwrap(), channels);

    let uneven = vec![vec![vec![1.0]], vec![vec![1.0, 2.0]]];
    assert!(Tensor::from_channels(&uneven).is_err());
  }

  #[test]
  fn index() {
    let x = Tensor::new(&[2,2,2], vec![1., 2., 3., 4., 5., 6., 7., 8.]).unwrap();
    assert_eq!(x.at(0).unwrap(), Tensor::new(&[2,2], vec![1., 2., 3., 4.]).unwrap());
    assert_eq!(x.at(1).unwrap().at(1).unwrap(), Tensor::vec(&[7., 8.]));
    assert!(x.at(2).is_none());
    assert_eq!(x.iter().count(), 2);
  }

  #[test]
  fn stack() {
    let a = Tensor::vec(&[1.0, 2.0]);
    let b = Tensor::vec(&[3.0, 4.0]);
    let s = Tensor::stack(&[a.clone(), b]).unwrap();
    assert_eq!(s.dims(), &[2,2]);
    assert!(Tensor::stack(&[a, Tensor::vec(&[1.0])]).is_err());
    assert!(Tensor::<f64>::stack(&[]).is_err());
  }

  #[test]
  fn zip_requires_equal_shapes() {
    let a = Tensor::vec(&[1.0, 2.0]);
    let b = Tensor::vec(&[3.0, 4.0, 5.0]);
    assert!(a.zip(&b, |(x, y)| x + y ).is_err());
  }

  #[test]
  fn serde_roundtrip_validates() {
    let t = Tensor::new(&[1,2], vec![0.5f32, 1.5]).unwrap();
    let json = serde_json::to_string(&t).unwrap();
    assert_eq!(serde_json::from_str::<Tensor<f32>>(&json).unwrap(), t);

    let broken = r#"{"dims":[2,2],"data":[1.0]}"#;
    assert!(serde_json::from_str::<Tensor<f32>>(broken).is_err());
  }

  #[test]
  fn display() {
    let t = Tensor::new(&[2,2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    let text = t.to_string();
    assert!(text.starts_with("Tensor[2, 2]"));
    assert!(text.contains("[3.0, 4.0]"));
  }
}
