use crate::{
  error::{ Result, configuration },
  internal::window_positions,
  ops::NumericOps,
  scalar::Real,
  tensor::Tensor,
};


/// Valid-padding convolution of a `channels × rows × cols` input with a
/// bank of `channels × k × k` filters, one output channel per filter.
///
/// Every output value is floored at zero, whatever activation the layer
/// was configured with.

pub fn convolve<T: Real>(input: &Tensor<T>, filters: &[Tensor<T>], stride: usize) -> Result<Tensor<T>> {
  input.expect_rank(3)?;
  let Some(first) = filters.first() else {
    return Err(configuration("convolution needs at least one filter"))
  };
  for filter in filters {
    filter.expect_rank(3)?;
    if filter.dims() != first.dims() {
      return Err(configuration(format!(
        "filters of one bank differ in shape: {} vs {}", first.shape(), filter.shape())))
    }
  }
  let (depth, side) = (first.dims()[0], first.dims()[1]);
  if first.dims()[2] != side {
    return Err(configuration(format!("filter {} is not square", first.shape())))
  }
  if depth != input.dims()[0] {
    return Err(configuration(format!(
      "filter depth {depth} doesn't match {} input channels", input.dims()[0])))
  }

  let out_rows = window_positions(input.dims()[1], side, stride)?;
  let out_cols = window_positions(input.dims()[2], side, stride)?;

  let mut data = Vec::with_capacity(filters.len() * out_rows * out_cols);
  for filter in filters {
    for oy in 0..out_rows {
      for ox in 0..out_cols {
        let patch = input.window(oy * stride, ox * stride, side)?;
        let response = patch.multiply(filter)?.sum();
        data.push(response.max(T::zero()));
      }
    }
  }
  Tensor::new(&[filters.len(), out_rows, out_cols], data)
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::Error;

  fn image(side: usize) -> Tensor {
    Tensor::new(&[1, side, side], (0..side * side).map(|i| i as f64 ).collect()).unwrap()
  }

  #[test]
  fn output_size() {
    let filter = Tensor::fill(&[1,3,3], 1.0);
    let out = convolve(&Tensor::fill(&[1,28,28], 0.5), &[filter.clone()], 1).unwrap();
    assert_eq!(out.dims(), &[1,26,26]);

    let out = convolve(&Tensor::fill(&[1,28,28], 0.5), &[filter], 2).unwrap();
    assert_eq!(out.dims(), &[1,13,13]);
  }

  #[test]
  fn sums_windows() {
    let filter = Tensor::fill(&[1,2,2], 1.0);
    let out = convolve(&image(3), &[filter], 1).unwrap();
    // 0 1 2 / 3 4 5 / 6 7 8
    assert_eq!(out.raw(), &[8., 12., 20., 24.]);
  }

  #[test]
  fn floors_at_zero() {
    let filter = Tensor::fill(&[1,2,2], -1.0);
    let out = convolve(&image(3), &[filter], 1).unwrap();
    assert!(out.raw().iter().all(|&v| v == 0.0 ));
  }

  #[test]
  fn one_channel_per_filter() {
    let input = Tensor::stack(&[image(4).at(0).unwrap(), Tensor::fill(&[4,4], 1.0)]).unwrap();
    let identity = Tensor::new(&[2,1,1], vec![1., 0.]).unwrap();
    let ones = Tensor::new(&[2,1,1], vec![0., 1.]).unwrap();
    let out = convolve(&input, &[identity, ones], 1).unwrap();
    assert_eq!(out.dims(), &[2,4,4]);
    assert_eq!(out.at(0).unwrap(), image(4).at(0).unwrap());
    assert!(out.at(1).unwrap().raw().iter().all(|&v| v == 1.0 ));
  }

  #[test]
  fn sums_across_channels() {
    let input = Tensor::fill(&[3,2,2], 1.0);
    let filter = Tensor::fill(&[3,2,2], 0.5);
    let out = convolve(&input, &[filter], 1).unwrap();
    assert_eq!(out.raw(), &[6.0]);
  }

  #[test]
  fn rejects_bad_configuration() {
    let input = image(4);
    assert!(matches!(convolve(&input, &[], 1), Err(Error::Configuration(_))));
    assert!(convolve(&input, &[Tensor::fill(&[2,2,2], 1.0)], 1).is_err());
    assert!(convolve(&input, &[Tensor::fill(&[1,2,3], 1.0)], 1).is_err());
    assert!(convolve(&input, &[Tensor::fill(&[1,2,2], 1.0)], 0).is_err());
    assert!(convolve(&input, &[Tensor::fill(&[1,5,5], 1.0)], 1).is_err());
  }
}
