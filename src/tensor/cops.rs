use crate::{
  tensor::Tensor,
  scalar::Real,
  ops::{ Gemm, MatrixRef },
};


impl<T: Real> Tensor<T> {
  pub(crate) fn matmul(&self, rhs: &Self) -> Vec<T> {
    let rows_l = self.shape[-2];
    let cols_l = self.shape[-1];
    let cols_r = rhs.shape[-1];

    if rows_l == 0 || cols_l == 0 || cols_r == 0 {
      return vec![T::zero(); rows_l * cols_r]
    }

    let data_l = self.data.borrow();
    let data_r = rhs.data.borrow();

    T::gemm(
      MatrixRef {
        data: &data_l,
        offset: self.shape.offset,
        rows: rows_l,
        cols: cols_l,
        row_stride: self.shape.strides[0],
        col_stride: self.shape.strides[1],
      },
      MatrixRef {
        data: &data_r,
        offset: rhs.shape.offset,
        rows: rhs.shape[-2],
        cols: cols_r,
        row_stride: rhs.shape.strides[0],
        col_stride: rhs.shape.strides[1],
      },
    )
  }
}

#[cfg(feature = "unsafe")]
impl Gemm for f32 {
  fn gemm(lhs: MatrixRef<f32>, rhs: MatrixRef<f32>) -> Vec<f32> {
    let mut data = vec![0.0; lhs.rows * rhs.cols];
    unsafe {
      matrixmultiply::sgemm(
        lhs.rows,
        lhs.cols,
        rhs.cols,
        1.0,
        lhs.data.as_ptr().add(lhs.offset),
        lhs.row_stride,
        lhs.col_stride,
        rhs.data.as_ptr().add(rhs.offset),
        rhs.row_stride,
        rhs.col_stride,
        0.0,
        data.as_mut_ptr(),
        rhs.cols as isize,
        1,
      );
    }
    data
  }
}

#[cfg(feature = "unsafe")]
impl Gemm for f64 {
  fn gemm(lhs: MatrixRef<f64>, rhs: MatrixRef<f64>) -> Vec<f64> {
    let mut data = vec![0.0; lhs.rows * rhs.cols];
    unsafe {
      matrixmultiply::dgemm(
        lhs.rows,
        lhs.cols,
        rhs.cols,
        1.0,
        lhs.data.as_ptr().add(lhs.offset),
        lhs.row_stride,
        lhs.col_stride,
        rhs.data.as_ptr().add(rhs.offset),
        rhs.row_stride,
        rhs.col_stride,
        0.0,
        data.as_mut_ptr(),
        rhs.cols as isize,
        1,
      );
    }
    data
  }
}

#[cfg(not(feature = "unsafe"))]
impl Gemm for f32 {}

#[cfg(not(feature = "unsafe"))]
impl Gemm for f64 {}
