use std::ops::Range;

use std::ops::{ Add, Sub, Mul, Div };

use crate::Shape;
use crate::scalar::{ Inner, Numeric, Real };


/// Borrowed, strided view of a matrix in some tensor's storage.

#[derive(Debug, Clone, Copy)]
pub struct MatrixRef<'a, T> {
  pub data: &'a [T],
  pub offset: usize,
  pub rows: usize,
  pub cols: usize,
  pub row_stride: isize,
  pub col_stride: isize,
}

impl<T: Copy> MatrixRef<'_, T> {
  #[inline]
  fn get(&self, row: usize, col: usize) -> T {
    let i = self.offset as isize + row as isize * self.row_stride + col as isize * self.col_stride;
    self.data[i as usize]
  }
}


/// Low-level general matrix multiplication.
///
/// The provided implementation is a plain triple loop. `f32` and `f64`
/// dispatch to [matrixmultiply] when the `unsafe` feature is enabled.

pub trait Gemm: Numeric {
  fn gemm(lhs: MatrixRef<Self>, rhs: MatrixRef<Self>) -> Vec<Self> {
    debug_assert_eq!(lhs.cols, rhs.rows);
    let mut data = vec![Self::zero(); lhs.rows * rhs.cols];
    for i in 0..lhs.rows {
      for j in 0..rhs.cols {
        let mut acc = Self::zero();
        for k in 0..lhs.cols {
          acc += lhs.get(i, k) * rhs.get(k, j);
        }
        data[i * rhs.cols + j] = acc;
      }
    }
    data
  }
}


/// Structural operations that are implemented for
/// all [Inner] types, symbolic or not.

pub trait BaseOps<I: Inner>: Clone {
  fn scalar(item: I) -> Self;
  fn shape(&self) -> Shape;
  fn range(&self, ranges: &[Range<isize>]) -> Self;
  fn reshape(&self, dims: &[usize]) -> Self;
  fn reshape_as(&self, other: &Self) -> Self;
  fn unsqueeze(&self, dim: isize) -> Self;
  fn transpose(&self, dim1: isize, dim2: isize) -> Self;

  fn dim(&self, dim: isize) -> usize {
    self.shape()[dim]
  }

  fn rank(&self) -> usize {
    self.shape().rank()
  }
}


/// Operations on [Numeric] inner types.
///
/// Reductions collapse `dim` and every dimension behind it.

pub trait NumericOps<I: Numeric>:
  Add<Output = Self> + Sub<Output = Self> + Mul<Output = Self> + Div<Output = Self> + Sized
{
  fn sum(&self, dim: isize) -> Self;
  fn max(&self, dim: isize) -> Self;

  /// One where an element differs from `value`, zero where it matches.
  fn not_equal(&self, value: I) -> Self;
}


/// Operations on [Real] inner types.

pub trait RealOps<I: Real>: std::ops::Neg + Sized {
  fn mm(&self, rhs: &Self) -> Self;
  fn log(&self) -> Self;
  fn exp(&self) -> Self;
  fn tanh(&self) -> Self;
  fn sigmoid(&self) -> Self;

  /// Rows of this `[n, d]` table selected by integer valued `indices`.
  /// The result has the shape of `indices` with `d` appended.
  fn look_up(&self, indices: &Self) -> Self;

  /// One element from each row of this `[n, m]` matrix,
  /// selected by the `[n]` integer valued `indices`.
  fn pick(&self, indices: &Self) -> Self;
}


/// High-level operations, implemented exclusively on top of
/// the lower level traits. They work the same on concrete tensors
/// and on symbolic [Variables](crate::Variable).

pub trait Hops<I>: BaseOps<I> + NumericOps<I> + RealOps<I>
where
  I: Real,
  for<'a> &'a Self: Add<&'a Self, Output = Self> + Sub<&'a Self, Output = Self>
    + Mul<&'a Self, Output = Self> + Div<&'a Self, Output = Self>,
{
  fn softmax(&self, dim: isize) -> Self {
    let exp = (self - &self.max(dim).unsqueeze(-1)).exp();
    &exp / &exp.sum(dim).unsqueeze(-1)
  }
}
