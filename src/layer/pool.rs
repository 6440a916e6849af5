use crate::{
  error::Result,
  internal::window_positions,
  ops::NumericOps,
  scalar::Real,
  tensor::{ Tensor, shape_error },
};


/// Per-channel maximum over square windows, valid padding.

pub fn max_pool<T: Real>(input: &Tensor<T>, window: usize, stride: usize) -> Result<Tensor<T>> {
  input.expect_rank(3)?;
  let (channels, rows, cols) = (input.dims()[0], input.dims()[1], input.dims()[2]);
  let out_rows = window_positions(rows, window, stride)?;
  let out_cols = window_positions(cols, window, stride)?;

  let mut data = Vec::with_capacity(channels * out_rows * out_cols);
  for channel in input.iter() {
    for oy in 0..out_rows {
      for ox in 0..out_cols {
        let max = channel.window(oy * stride, ox * stride, window)?.max()
          .ok_or_else(|| shape_error("empty pooling window") )?;
        data.push(max);
      }
    }
  }
  Tensor::new(&[channels, out_rows, out_cols], data)
}
