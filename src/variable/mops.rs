use std::fmt::Debug;

use crate::{
  shape::Shape,
  tensor::Tensor,
  variable::{ Variable, BinaryOp, UnaryOp },
  scalar::Real,
  ops::{ BaseOps, NumericOps, RealOps },
};


impl<T: Real> BaseOps<T> for Variable<T> {
  fn scalar(item: T) -> Self {
    Self::from_tensor(Tensor::scalar(item))
  }

  fn shape(&self) -> Shape {
    self.node.data.borrow().shape()
  }

  fn range(&self, ranges: &[std::ops::Range<isize>]) -> Self {
    self.unary_op(Range { ranges: ranges.to_vec() })
  }

  fn reshape(&self, dims: &[usize]) -> Self {
    self.unary_op(Reshape { dims: dims.to_vec() })
  }

  fn reshape_as(&self, other: &Self) -> Self {
    self.binary_op(ReshapeAs, other)
  }

  fn unsqueeze(&self, dim: isize) -> Self {
    self.unary_op(Unsqueeze { dim })
  }

  fn transpose(&self, dim1: isize, dim2: isize) -> Self {
    self.unary_op(Transpose { dim1, dim2 })
  }
}

impl<T: Real> NumericOps<T> for Variable<T> {
  fn sum(&self, dim: isize) -> Self {
    self.unary_op(Sum { dim })
  }

  fn max(&self, dim: isize) -> Self {
    self.unary_op(Max { dim })
  }

  fn not_equal(&self, value: T) -> Self {
    self.unary_op(NotEqual { value })
  }
}

impl<T: Real> RealOps<T> for Variable<T> {
  fn mm(&self, rhs: &Self) -> Self {
    self.binary_op(MatMul, rhs)
  }

  fn log(&self) -> Self {
    self.unary_op(Log)
  }

  fn exp(&self) -> Self {
    self.unary_op(Exp)
  }

  fn tanh(&self) -> Self {
    self.unary_op(Tanh)
  }

  fn sigmoid(&self) -> Self {
    self.unary_op(Sigmoid)
  }

  fn look_up(&self, indices: &Self) -> Self {
    self.binary_op(LookUp, indices)
  }

  fn pick(&self, indices: &Self) -> Self {
    self.binary_op(Pick, indices)
  }
}

impl<T: Real> std::ops::Neg for &Variable<T> {
  type Output = Variable<T>;

  fn neg(self) -> Self::Output {
    self * -T::one()
  }
}

impl<T: Real> std::ops::Neg for Variable<T> {
  type Output = Variable<T>;

  fn neg(self) -> Self::Output {
    -&self
  }
}

macro_rules! add_operator {
  ($op:ident, $meth:ident, $symbol:tt) => {
    impl<T: Real> std::ops::$op for &Variable<T> { // &tensor * &other
      type Output = Variable<T>;

      fn $meth(self, rhs: Self) -> Variable<T> {
        self.binary_op($op, rhs)
      }
    }

    impl<T: Real> std::ops::$op for Variable<T> { // tensor * other
      type Output = Variable<T>;

      fn $meth(self, rhs: Self) -> Variable<T> {
        &self $symbol &rhs
      }
    }

    impl<T: Real> std::ops::$op<Variable<T>> for &Variable<T> { // &tensor * other
      type Output = Variable<T>;

      fn $meth(self, rhs: Variable<T>) -> Variable<T> {
        self $symbol &rhs
      }
    }

    impl<T: Real> std::ops::$op<&Variable<T>> for Variable<T> { // tensor * &other
      type Output = Variable<T>;

      fn $meth(self, rhs: &Variable<T>) -> Variable<T> {
        &self $symbol rhs
      }
    }

    impl<T: Real> std::ops::$op<T> for &Variable<T> { // &tensor * T
      type Output = Variable<T>;

      fn $meth(self, rhs: T) -> Variable<T> {
        self $symbol &Variable::scalar(rhs)
      }
    }

    impl<T: Real> std::ops::$op<T> for Variable<T> { // tensor * T
      type Output = Variable<T>;

      fn $meth(self, rhs: T) -> Variable<T> {
        &self $symbol &Variable::scalar(rhs)
      }
    }
  };
}

add_operator!(Add, add, +);
add_operator!(Sub, sub, -);
add_operator!(Mul, mul, *);
add_operator!(Div, div, /);


#[derive(Debug, Clone)]
pub struct Add;

impl<T: Real> BinaryOp<T> for Add {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T> {
    lhs + rhs
  }
}


#[derive(Debug, Clone)]
pub struct Sub;

impl<T: Real> BinaryOp<T> for Sub {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T> {
    lhs - rhs
  }
}


#[derive(Debug, Clone)]
pub struct Mul;

impl<T: Real> BinaryOp<T> for Mul {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T> {
    lhs * rhs
  }
}


#[derive(Debug, Clone)]
pub struct Div;

impl<T: Real> BinaryOp<T> for Div {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T> {
    lhs / rhs
  }
}


#[derive(Debug, Clone)]
pub struct MatMul;

impl<T: Real> BinaryOp<T> for MatMul {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T> {
    lhs.mm(rhs)
  }
}


#[derive(Debug, Clone)]
pub struct LookUp;

impl<T: Real> BinaryOp<T> for LookUp {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T> {
    lhs.look_up(rhs)
  }
}


#[derive(Debug, Clone)]
pub struct Pick;

impl<T: Real> BinaryOp<T> for Pick {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T> {
    lhs.pick(rhs)
  }
}


#[derive(Debug, Clone)]
pub struct ReshapeAs;

impl<T: Real> BinaryOp<T> for ReshapeAs {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T> {
    lhs.reshape_as(rhs)
  }
}


#[derive(Debug, Clone)]
pub struct Range {
  ranges: Vec<std::ops::Range<isize>>,
}

impl<T: Real> UnaryOp<T> for Range {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.range(&self.ranges)
  }
}


#[derive(Debug, Clone)]
pub struct Reshape {
  dims: Vec<usize>,
}

impl<T: Real> UnaryOp<T> for Reshape {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.reshape(&self.dims)
  }
}


#[derive(Debug, Clone)]
pub struct Unsqueeze {
  dim: isize,
}

impl<T: Real> UnaryOp<T> for Unsqueeze {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.unsqueeze(self.dim)
  }
}


#[derive(Debug, Clone)]
pub struct Transpose {
  dim1: isize,
  dim2: isize,
}

impl<T: Real> UnaryOp<T> for Transpose {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.transpose(self.dim1, self.dim2)
  }
}


#[derive(Debug, Clone)]
pub struct Sum {
  dim: isize,
}

impl<T: Real> UnaryOp<T> for Sum {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.sum(self.dim)
  }
}


#[derive(Debug, Clone)]
pub struct Max {
  dim: isize,
}

impl<T: Real> UnaryOp<T> for Max {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.max(self.dim)
  }
}


#[derive(Debug, Clone)]
pub struct NotEqual<T> {
  value: T,
}

impl<T: Real> UnaryOp<T> for NotEqual<T> {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.not_equal(self.value)
  }
}


#[derive(Debug, Clone)]
pub struct Log;

impl<T: Real> UnaryOp<T> for Log {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.log()
  }
}


#[derive(Debug, Clone)]
pub struct Exp;

impl<T: Real> UnaryOp<T> for Exp {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.exp()
  }
}


#[derive(Debug, Clone)]
pub struct Tanh;

impl<T: Real> UnaryOp<T> for Tanh {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.tanh()
  }
}


#[derive(Debug, Clone)]
pub struct Sigmoid;

impl<T: Real> UnaryOp<T> for Sigmoid {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.sigmoid()
  }
}
