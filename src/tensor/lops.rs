use crate::{
  error::{ Error, Result },
  shape::Shape,
  tensor::{ Tensor, shape_error },
  scalar::Real,
  ops::{ Cops, NumericOps, RealOps },
};


impl<T: Real> NumericOps<T> for Tensor<T> {
  fn sum(&self) -> T {
    self.data.iter().copied().sum()
  }

  fn max(&self) -> Option<T> {
    self.data.iter().copied().reduce(|acc, a| if a > acc { a } else { acc } )
  }

  fn argmax(&self) -> Option<usize> {
    if self.rank() > 2 || (self.rank() == 2 && self.shape[0] != 1) { return None }
    let mut best: Option<(usize, T)> = None;
    for (i, value) in self.data.iter().copied().enumerate() {
      if best.map_or(true, |(_, max)| value > max ) {
        best = Some((i, value));
      }
    }
    best.map(|(i, _)| i )
  }

  fn multiply(&self, rhs: &Self) -> Result<Self> {
    self.zip(rhs, |(a, b)| a * b )
  }

  fn mm(&self, rhs: &Self) -> Result<Self> {
    self.expect_rank(2)?;
    rhs.expect_rank(2)?;
    if self.shape[1] != rhs.shape[0] {
      return Err(Error::MatMulMismatch { lhs: self.shape.clone(), rhs: rhs.shape.clone() })
    }
    let data = self.matmul(rhs);
    Tensor::new(&[self.shape[0], rhs.shape[1]], data)
  }

  fn window(&self, y: usize, x: usize, side: usize) -> Result<Self> {
    if self.rank() < 2 {
      return Err(shape_error(format!("cannot take a window of {}", self.shape)))
    }
    let rows = self.shape[-2];
    let cols = self.shape[-1];
    if y + side > rows || x + side > cols {
      return Err(shape_error(format!(
        "window of {side} at ({y}, {x}) exceeds {}", self.shape)))
    }
    let plane = rows * cols;
    let planes = if plane == 0 { 0 } else { self.size() / plane };
    let mut data = Vec::with_capacity(planes * side * side);
    for p in 0..planes {
      for r in y..y + side {
        let start = p * plane + r * cols + x;
        data.extend_from_slice(&self.data[start..start + side]);
      }
    }
    let mut dims = self.shape.dims.clone();
    let rank = dims.len();
    dims[rank - 2] = side;
    dims[rank - 1] = side;
    Tensor::from_shape(Shape::new(&dims), data)
  }
}

impl<T: Real> RealOps<T> for Tensor<T> {
  fn exp(&self) -> Self {
    self.vectorize(|a| a.exp() )
  }

  fn relu(&self) -> Self {
    self.vectorize(|a| a.max(T::zero()) )
  }

  fn sigmoid(&self) -> Self {
    self.vectorize(|a| T::one() / (T::one() + (-a).exp()) )
  }

  fn softmax(&self) -> Result<Self> {
    let row = match self.rank() {
      1 => self.clone(),
      2 => self.at(0).ok_or_else(|| shape_error("softmax of a matrix without rows") )?,
      _ => return Err(shape_error(format!("cannot apply softmax to {}", self.shape))),
    };
    let Some(max) = row.max() else {
      return Err(shape_error("softmax of an empty row"))
    };
    let exps = (&row - max).exp();
    let total = exps.sum();
    (exps / total).reshape(&[1, row.size()])
  }
}

impl<T: Real> std::ops::Neg for &Tensor<T> {
  type Output = Tensor<T>;

  fn neg(self) -> Self::Output {
    self.vectorize(|a| -a )
  }
}

impl<T: Real> std::ops::Neg for Tensor<T> {
  type Output = Tensor<T>;

  fn neg(self) -> Self::Output {
    -&self
  }
}

macro_rules! add_operator {
  ($trait:ident, $meth:ident, $symbol:tt) => {
    impl<T: Real> std::ops::$trait<T> for &Tensor<T> { // &tensor * T
      type Output = Tensor<T>;

      fn $meth(self, rhs: T) -> Tensor<T> {
        self.vectorize(|a| a $symbol rhs )
      }
    }

    impl<T: Real> std::ops::$trait<T> for Tensor<T> { // tensor * T
      type Output = Tensor<T>;

      fn $meth(self, rhs: T) -> Tensor<T> {
        (&self) $symbol rhs
      }
    }

    impl std::ops::$trait<&Tensor<f32>> for f32 { // f32 * &tensor
      type Output = Tensor<f32>;

      fn $meth(self, tensor: &Tensor<f32>) -> Tensor<f32> {
        tensor.vectorize(|a| self $symbol a )
      }
    }

    impl std::ops::$trait<Tensor<f32>> for f32 { // f32 * tensor
      type Output = Tensor<f32>;

      fn $meth(self, tensor: Tensor<f32>) -> Tensor<f32> {
        self $symbol &tensor
      }
    }

    impl std::ops::$trait<&Tensor<f64>> for f64 { // f64 * &tensor
      type Output = Tensor<f64>;

      fn $meth(self, tensor: &Tensor<f64>) -> Tensor<f64> {
        tensor.vectorize(|a| self $symbol a )
      }
    }

    impl std::ops::$trait<Tensor<f64>> for f64 { // f64 * tensor
      type Output = Tensor<f64>;

      fn $meth(self, tensor: Tensor<f64>) -> Tensor<f64> {
        self $symbol &tensor
      }
    }
  };
}

add_operator!(Add, add, +);
add_operator!(Sub, sub, -);
add_operator!(Mul, mul, *);
add_operator!(Div, div, /);
