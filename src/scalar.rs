use num_traits::Float;
use serde::{ Serialize, de::DeserializeOwned };


/// All element types a [Tensor](crate::Tensor) may hold.
///
/// Implemented for `f32` and `f64`. Besides plain float arithmetic the
/// trait carries the low-level row-major matrix product, so that
/// accelerated kernels can be plugged in per type.

pub trait Real: Float + std::iter::Sum + std::fmt::Debug + std::fmt::Display
  + Send + Sync + Serialize + DeserializeOwned + 'static
{
  /// Multiply the `m × k` row-major matrix `lhs` with the `k × n`
  /// row-major matrix `rhs`.
  fn matmul(lhs: &[Self], rhs: &[Self], m: usize, k: usize, n: usize) -> Vec<Self> {
    let mut data = vec![Self::zero(); m * n];
    for i in 0..m {
      for j in 0..n {
        let mut acc = Self::zero();
        for l in 0..k {
          acc = acc + lhs[i * k + l] * rhs[l * n + j];
        }
        data[i * n + j] = acc;
      }
    }
    data
  }
}

impl Real for f32 {
  #[cfg(feature = "unsafe")]
  fn matmul(lhs: &[f32], rhs: &[f32], m: usize, k: usize, n: usize) -> Vec<f32> {
    debug_assert!(lhs.len() == m * k && rhs.len() == k * n);
    let mut data = vec![0.0; m * n];
    unsafe {
      matrixmultiply::sgemm(
        m, k, n,
        1.0,
        lhs.as_ptr(), k as isize, 1,
        rhs.as_ptr(), n as isize, 1,
        0.0,
        data.as_mut_ptr(), n as isize, 1,
      );
    }
    data
  }
}

impl Real for f64 {
  #[cfg(feature = "unsafe")]
  fn matmul(lhs: &[f64], rhs: &[f64], m: usize, k: usize, n: usize) -> Vec<f64> {
    debug_assert!(lhs.len() == m * k && rhs.len() == k * n);
    let mut data = vec![0.0; m * n];
    unsafe {
      matrixmultiply::dgemm(
        m, k, n,
        1.0,
        lhs.as_ptr(), k as isize, 1,
        rhs.as_ptr(), n as isize, 1,
        0.0,
        data.as_mut_ptr(), n as isize, 1,
      );
    }
    data
  }
}
