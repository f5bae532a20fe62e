use rand::distributions::uniform::SampleUniform;
use num_traits::{ NumAssignOps, Num, NumCast, Float };

use crate::ops::Gemm;


/// All types that may be used in a [Tensor](crate::Tensor).
///
/// This trait gets implemented automatically for all types
/// that satisfy its dependent traits.

pub trait Inner: PartialEq + Clone + Copy + std::fmt::Debug + 'static {}
impl<T: PartialEq + Clone + Copy + std::fmt::Debug + 'static> Inner for T {}


/// All numeric types.
///
/// This trait gets implemented automatically for all types
/// that satisfy its dependent traits.

pub trait Numeric: Inner + PartialOrd + Num + NumCast + NumAssignOps + std::iter::Sum {}
impl<T: Inner + PartialOrd + Num + NumCast + NumAssignOps + std::iter::Sum> Numeric for T {}


/// All signed numeric types.

pub trait Signed: Numeric + num_traits::Signed {}
impl<T: Numeric + num_traits::Signed> Signed for T {}


/// Continuous numeric types that model weights and probabilities are stored in.
///
/// Implemented for `f32` and `f64`, the types with an accelerated [Gemm].

pub trait Real: Signed + Float + SampleUniform + Gemm {}
impl<T: Signed + Float + SampleUniform + Gemm> Real for T {}
