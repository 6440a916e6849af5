use crate::{
  tensor::Tensor,
  scalar::Real,
  ops::Cops,
};


impl<T: Real> Cops<T> for Tensor<T> {
  fn matmul(&self, rhs: &Self) -> Vec<T> {
    let rows_l = self.shape[-2];
    let cols_l = self.shape[-1];
    let cols_r = rhs.shape[-1];
    T::matmul(&self.data, &rhs.data, rows_l, cols_l, cols_r)
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::ops::NumericOps;

  #[test]
  fn matmul() {
    let x = Tensor::new(&[2,3], vec![1., 2., 3., 4., 5., 6.]).unwrap();
    let y = Tensor::new(&[3,2], vec![1., 2., 3., 4., 5., 6.]).unwrap();
    assert_eq!(x.mm(&y).unwrap(), Tensor::new(&[2,2], vec![22., 28., 49., 64.]).unwrap());
  }

  #[test]
  fn matmul_vector() {
    let x = Tensor::new(&[2,3], vec![1., 2., 3., 4., 5., 6.]).unwrap();
    let y = Tensor::new(&[3,1], vec![1., 2., 3.]).unwrap();
    assert_eq!(x.mm(&y).unwrap(), Tensor::new(&[2,1], vec![14., 32.]).unwrap());
  }

  #[test]
  fn matmul_single_precision() {
    let x = Tensor::new(&[1,2], vec![1.0f32, 2.0]).unwrap();
    let y = Tensor::new(&[2,2], vec![1.0f32, 0.0, 0.0, 1.0]).unwrap();
    assert_eq!(x.matmul(&y), vec![1.0, 2.0]);
  }
}
