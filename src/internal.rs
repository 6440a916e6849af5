use crate::error::{ Result, configuration, shape };


#[inline]
pub fn negative_index(i: isize, n: usize) -> usize {
  if i < 0 {
    (n as isize + i) as usize
  } else {
    i as usize
  }
}


/// Number of window positions along one axis for a valid-padding scan.

pub fn window_positions(input: usize, window: usize, stride: usize) -> Result<usize> {
  if stride == 0 {
    return Err(configuration("stride must be positive"))
  }
  if window == 0 || window > input {
    return Err(shape(format!("window of {window} does not fit an extent of {input}")))
  }
  Ok((input - window) / stride + 1)
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn negative() {
    assert_eq!(negative_index(-1, 3), 2);
    assert_eq!(negative_index(1, 3), 1);
  }

  #[test]
  fn positions() {
    assert_eq!(window_positions(28, 3, 1).unwrap(), 26);
    assert_eq!(window_positions(26, 2, 2).unwrap(), 13);
    assert_eq!(window_positions(5, 2, 2).unwrap(), 2);
    assert_eq!(window_positions(3, 3, 7).unwrap(), 1);
    assert!(window_positions(2, 3, 1).is_err());
    assert!(window_positions(4, 2, 0).is_err());
  }
}
