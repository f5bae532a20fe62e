//! Weight initialization and matrix helpers.

use nalgebra::DMatrix;
use rand::{ Rng, distributions::uniform::SampleUniform };

use crate::{
  error::{ Error, Result },
  ops::BaseOps,
  scalar::{ Inner, Numeric, Real },
  Tensor,
};


/// An `[in_size, out_size]` matrix drawn from the standard normal
/// distribution, multiplied by `scale` if one is given.

pub fn random_weight<T, R>(in_size: usize, out_size: usize, scale: Option<T>, rng: &mut R) -> Tensor<T>
where
  T: Real,
  R: Rng + ?Sized,
{
  let weight = Tensor::randn(&[in_size, out_size], rng);
  match scale {
    Some(scale) => weight * scale,
    None => weight,
  }
}


/// Like [random_weight], but square matrices are made orthogonal.
///
/// The orthogonal matrix is the left singular vectors of a standard
/// normal matrix. `scale` only applies when no orthogonal matrix
/// could be created.

pub fn orthogonal_weight<T, R>(in_size: usize, out_size: usize, scale: Option<T>, rng: &mut R) -> Tensor<T>
where
  T: Real,
  R: Rng + ?Sized,
{
  if in_size != out_size {
    return random_weight(in_size, out_size, scale, rng)
  }
  let n = in_size;
  let normal: Tensor<f64> = Tensor::randn(&[n, n], rng);
  let svd = DMatrix::from_row_slice(n, n, &normal.into_raw()).svd(true, false);
  let u = match svd.u {
    Some(u) => u,
    None => return random_weight(n, n, scale, rng),
  };
  Tensor::init(&[n, n], |i| T::from(u[(i / n, i % n)]).unwrap_or_else(T::zero) )
}


/// Random values in `[0, max_value)` to give symbolic placeholders
/// realistic initial contents. Integer types never reach `max_value`.

pub fn test_value<T, R>(dims: &[usize], max_value: T, rng: &mut R) -> Tensor<T>
where
  T: Numeric + SampleUniform,
  R: Rng + ?Sized,
{
  Tensor::uniform(dims, max_value, rng)
}


/// The `index`-th slice of width `size` along the last dimension
/// of a concatenation of 2 or 3 dimensional matrices.

pub fn get_submatrix<I, M>(matrices: &M, index: usize, size: usize) -> Result<M>
where
  I: Inner,
  M: BaseOps<I>,
{
  let start = (index * size) as isize;
  let end = ((index + 1) * size) as isize;
  match matrices.rank() {
    3 => Ok(matrices.range(&[0..-1, 0..-1, start..end])),
    2 => Ok(matrices.range(&[0..-1, start..end])),
    found => Err(Error::Rank { expected: "2 or 3", found }),
  }
}
