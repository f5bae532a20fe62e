use std::ops::Range;

use num_traits::NumCast;

use crate::{
  shape::Shape,
  tensor::Tensor,
  scalar::{ Inner, Numeric, Signed, Real },
  ops::{ BaseOps, NumericOps, RealOps },
};


impl<T: Inner> BaseOps<T> for Tensor<T> {
  fn scalar(item: T) -> Self {
    Self::new(&[], vec![item])
  }

  fn shape(&self) -> Shape {
    self.shape.clone()
  }

  fn dim(&self, dim: isize) -> usize {
    self.shape[dim]
  }

  fn rank(&self) -> usize {
    self.shape.rank()
  }

  fn range(&self, ranges: &[Range<isize>]) -> Self {
    let shape = self.shape.range(ranges);
    let data = self.data.clone();
    Self { shape, data }
  }

  fn reshape(&self, dims: &[usize]) -> Self {
    self.contiguous().view(dims)
  }

  fn reshape_as(&self, other: &Self) -> Self {
    self.reshape(&other.shape.dims)
  }

  fn unsqueeze(&self, dim: isize) -> Self {
    let shape = self.shape.unsqueeze(dim);
    let data = self.data.clone();
    Self { shape, data }
  }

  fn transpose(&self, dim1: isize, dim2: isize) -> Self {
    let shape = self.shape.transpose(dim1, dim2);
    let data = self.data.clone();
    Self { shape, data }
  }
}

impl<T: Numeric> NumericOps<T> for Tensor<T> {
  fn sum(&self, dim: isize) -> Self {
    self.collapse(dim, |values| values.param_iter().sum() )
  }

  fn max(&self, dim: isize) -> Self {
    self.collapse(dim, |values| {
      values.param_iter()
        .reduce(|a, b| if b > a { b } else { a } )
        .unwrap_or_else(|| panic!("Cannot take maximum of empty {}", values.shape))
    })
  }

  fn not_equal(&self, value: T) -> Self {
    self.vectorize(|a| if a != value { T::one() } else { T::zero() })
  }
}

impl<T: Real> RealOps<T> for Tensor<T> {
  fn mm(&self, rhs: &Self) -> Self {
    assert!(rhs.rank() == 2, "Right hand side of matrix product must be a matrix, got {}", rhs.shape);
    let cols_r = rhs.shape[-1];

    // Vectors are treated as single row, higher ranks as stacks of rows
    let lhs = match self.rank() {
      0 => panic!("Cannot multiply scalar with matrix"),
      1 => self.unsqueeze(0),
      2 => self.clone(),
      _ => self.reshape(&[0, self.shape[-1]]),
    };
    assert_eq!(lhs.shape[-1], rhs.shape[-2],
      "Cannot multiply {} by {}", self.shape, rhs.shape);

    let data = lhs.matmul(rhs);

    let mut dims = self.shape.dims[..self.rank() - 1].to_vec();
    dims.push(cols_r);
    Self::new(&dims, data)
  }

  fn log(&self) -> Self {
    self.vectorize(|a| a.ln() )
  }

  fn exp(&self) -> Self {
    self.vectorize(|a| a.exp() )
  }

  fn tanh(&self) -> Self {
    self.vectorize(|a| a.tanh() )
  }

  fn sigmoid(&self) -> Self {
    self.vectorize(|a| T::one() / (T::one() + (-a).exp()) )
  }

  fn look_up(&self, indices: &Self) -> Self {
    assert!(self.rank() == 2, "Look-up table must be a matrix, got {}", self.shape);
    let table = self.contiguous();
    let rows = table.shape[0];
    let width = table.shape[1];
    let data = {
      let raw = table.raw();
      let offset = table.shape.offset;
      let mut data = Vec::with_capacity(indices.size() * width);
      for index in indices.param_iter() {
        let row = to_index(index, rows);
        let start = offset + row * width;
        data.extend_from_slice(&raw[start..start + width]);
      }
      data
    };
    let mut dims = indices.shape.dims.clone();
    dims.push(width);
    Self::new(&dims, data)
  }

  fn pick(&self, indices: &Self) -> Self {
    assert!(self.rank() == 2 && indices.rank() == 1 && indices.shape[0] == self.shape[0],
      "Cannot pick {} from {}", indices.shape, self.shape);
    let cols = self.shape[1];
    let data = {
      let raw = self.raw();
      indices.param_iter()
        .enumerate()
        .map(|(row, index)| raw[self.shape.index(&[row, to_index(index, cols)])] )
        .collect()
    };
    Self::new(&indices.shape.dims, data)
  }
}

fn to_index<T: Real>(value: T, bound: usize) -> usize {
  let index = <usize as NumCast>::from(value)
    .filter(|&i| T::from(i) == Some(value) && i < bound );
  index.unwrap_or_else(|| panic!("Index {:?} out of range for dimension of size {}", value, bound))
}

impl<T: Signed> std::ops::Neg for &Tensor<T> {
  type Output = Tensor<T>;

  fn neg(self) -> Self::Output {
    self * (-T::one())
  }
}

impl<T: Signed> std::ops::Neg for Tensor<T> {
  type Output = Tensor<T>;

  fn neg(self) -> Self::Output {
    -&self
  }
}

macro_rules! add_operator {
  ($trait:ident, $meth:ident, $symbol:tt) => {
    impl<T: Numeric> std::ops::$trait for &Tensor<T> { // &tensor * &other
      type Output = Tensor<T>;

      fn $meth(self, rhs: Self) -> Tensor<T> {
        self.zip(rhs, |(a, b)| a $symbol b )
      }
    }

    impl<T: Numeric> std::ops::$trait for Tensor<T> { // tensor * other
      type Output = Tensor<T>;

      fn $meth(self, rhs: Self) -> Tensor<T> {
        &self $symbol &rhs
      }
    }

    impl<T: Numeric> std::ops::$trait<Tensor<T>> for &Tensor<T> { // &tensor * other
      type Output = Tensor<T>;

      fn $meth(self, rhs: Tensor<T>) -> Tensor<T> {
        self $symbol &rhs
      }
    }

    impl<T: Numeric> std::ops::$trait<&Tensor<T>> for Tensor<T> { // tensor * &other
      type Output = Tensor<T>;

      fn $meth(self, rhs: &Tensor<T>) -> Tensor<T> {
        &self $symbol rhs
      }
    }

    impl<T: Numeric> std::ops::$trait<T> for &Tensor<T> { // &tensor * T
      type Output = Tensor<T>;

      fn $meth(self, rhs: T) -> Tensor<T> {
        self.vectorize(|a| a $symbol rhs )
      }
    }

    impl<T: Numeric> std::ops::$trait<T> for Tensor<T> { // tensor * T
      type Output = Tensor<T>;

      fn $meth(self, rhs: T) -> Tensor<T> {
        &self $symbol rhs
      }
    }
  };
}

add_operator!(Add, add, +);
add_operator!(Sub, sub, -);
add_operator!(Mul, mul, *);
add_operator!(Div, div, /);
