use std::rc::Rc;
use std::cell::{ Ref, RefCell };

use rand::{ Rng, distributions::uniform::SampleUniform };
use serde::{ Serialize, Deserialize };

mod cops;
mod lops;

use crate::{
  internal::*,
  shape::Shape,
  variable::Variable,
  scalar::{ Inner, Numeric, Real },
  ops::{ BaseOps, Hops },
};


/// Multidimensional array.
///
/// Tensors may contain any type that satisfies [Inner], but
/// additional methods are available for [Numeric] and [Real] inner types.
///
/// Slicing, transposing and broadcasting produce views that share
/// storage with the original tensor. Tensors are never mutated in place.
///
/// [Real] tensors can be wrapped in a [Variable] by
/// calling [tracked](Tensor::tracked).

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tensor<T: Inner> {
  shape: Shape,
  data: Rc<RefCell<Vec<T>>>,
}

impl<T: Real> Hops<T> for Tensor<T> {}

impl<T: Inner> PartialEq for Tensor<T> {
  fn eq(&self, rhs: &Self) -> bool {
    if self.shape.squeeze().dims != rhs.shape.squeeze().dims { return false }
    let data_l = self.data.borrow();
    let data_r = rhs.data.borrow();
    for (i, j) in self.shape.iter().zip(rhs.shape.iter()) {
      if data_l[i] != data_r[j] { return false }
    }
    true
  }
}

impl<T: Inner> Tensor<T> {
  pub fn from_shape(shape: Shape, data: Vec<T>) -> Self {
    assert_eq!(shape.size(), data.len(),
      "{} doesn't match data length {}", shape, data.len());
    Self { shape, data: Rc::new(RefCell::new(data)) }
  }

  pub fn new(shape: &[usize], data: Vec<T>) -> Self {
    Self::from_shape(Shape::new(shape), data)
  }

  pub fn vec(vec: &[T]) -> Self {
    Self::new(&[vec.len()], vec.to_vec())
  }

  pub fn fill(shape: &[usize], filler: T) -> Self {
    Self::new(shape, vec![filler; shape.iter().product()])
  }

  pub fn init(shape: &[usize], cb: impl FnMut(usize) -> T) -> Self {
    let shape = Shape::new(shape);
    let data = (0..shape.size()).map(cb).collect();
    Self::from_shape(shape, data)
  }

  pub fn raw(&self) -> Ref<Vec<T>> {
    self.data.borrow()
  }

  pub fn into_raw(self) -> Vec<T> {
    let contiguous = self.shape.contiguous()
      && self.shape.offset == 0
      && self.shape.size() == self.data.borrow().len();
    if contiguous {
      Rc::unwrap_or_clone(self.data).into_inner()
    } else {
      self.param_iter().collect()
    }
  }

  pub fn to_vec(&self) -> Vec<T> {
    self.param_iter().collect()
  }

  pub fn size(&self) -> usize {
    self.shape.size()
  }

  pub fn contiguous(&self) -> Self {
    if self.shape.contiguous() {
      self.clone()
    } else {
      self.detach()
    }
  }

  /// Copy into fresh, contiguous storage.

  pub fn detach(&self) -> Self {
    self.vectorize(|a| a )
  }

  pub fn broadcast(&self, other: &Self) -> Self {
    Self {
      shape: self.shape.broadcast(&other.shape),
      data: self.data.clone(),
    }
  }

  pub fn zip<O,F>(&self, rhs: &Self, cb: F) -> Tensor<O>
  where
    O: Inner,
    F: Fn((T, T)) -> O,
  {
    let lhs = self.broadcast(rhs);
    let rhs = rhs.broadcast(self);
    let data: Vec<O> = lhs.param_iter()
      .zip(rhs.param_iter())
      .map(cb)
      .collect();
    Tensor::new(&lhs.shape.dims, data)
  }

  pub fn vectorize<O,F>(&self, cb: F) -> Tensor<O>
  where
    O: Inner,
    F: FnMut(T) -> O,
  {
    let data = self.param_iter().map(cb).collect();
    Tensor::new(&self.shape.dims, data)
  }

  /// Replace `dim` and all dimensions behind it with
  /// a single value computed from each sub tensor.

  pub fn collapse<O,F>(&self, dim: isize, mut cb: F) -> Tensor<O>
  where
    O: Inner,
    F: FnMut(Self) -> O,
  {
    let dim = negative_index(dim, self.shape.rank(), false);
    let outer: usize = self.shape.dims[..dim].iter().product();
    let inner: usize = self.shape.dims[dim..].iter().product();
    let flat = self.contiguous().view(&[outer, inner]);
    let data = (0..outer).map(|i| cb(flat.at(&[i])) ).collect();
    Tensor::new(&self.shape.dims[..dim], data)
  }

  /// Iterate over sub tensors along `dim`.

  pub fn iter(&self, dim: isize) -> TensorSliceIterator<T> {
    TensorSliceIterator::new(self, dim)
  }

  pub fn param_iter(&self) -> TensorIterator<T> {
    TensorIterator::new(self)
  }

  pub fn at(&self, indices: &[usize]) -> Self {
    let shape = self.shape.take(indices);
    let data = self.data.clone();
    Self { shape, data }
  }

  pub fn item(&self) -> T {
    assert!(self.shape.squeeze().rank() == 0,
      "Can't extract item from non-scalar {}", self.shape);
    self.raw()[self.shape.offset]
  }

  pub fn view(&self, shape: &[usize]) -> Self {
    let shape = self.shape.view(shape);
    let data = self.data.clone();
    Self { shape, data }
  }

}

impl<T: Numeric> Tensor<T> {
  pub fn ones(shape: &[usize]) -> Self {
    Self::fill(shape, T::one())
  }

  pub fn zeros(shape: &[usize]) -> Self {
    Self::fill(shape, T::zero())
  }

  pub fn arrange(shape: &[usize], start: T, step: T) -> Self {
    Self::init(shape, |i| T::from(i).unwrap() * step + start )
  }

  pub fn cast<I: Numeric>(&self) -> Tensor<I> {
    self.vectorize(|a| I::from(a)
      .unwrap_or_else(|| panic!("Cannot cast {:?} to {}", a, std::any::type_name::<I>())) )
  }
}

impl<T: Numeric + SampleUniform> Tensor<T> {
  /// Uniform samples from `[0, max)`.

  pub fn uniform<R: Rng + ?Sized>(shape: &[usize], max: T, rng: &mut R) -> Self {
    Self::init(shape, |_| rng.gen_range(T::zero(), max) )
  }
}

impl<T: Real> Tensor<T> {
  /// Samples from the standard normal distribution.

  pub fn randn<R: Rng + ?Sized>(shape: &[usize], rng: &mut R) -> Self {
    let len = shape.iter().product();
    let mut data = vec![T::zero(); len];
    for i in 0..(len as f64 / 2.0).ceil() as usize {
      let j = i * 2;
      let (r1, r2): (T, T) = randn(&mut *rng);
      data[j] = r1;
      data[(j + 1) % len] = r2;
    }
    Self::new(shape, data)
  }

  pub fn tracked(&self) -> Variable<T> {
    Variable::from_tensor(self.clone())
  }
}

impl<T: Inner> std::fmt::Display for Tensor<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "Tensor{:?} ", self.shape.dims)?;
    print_chunks(0, &self.shape, &self.to_vec(), f)?;
    Ok(())
  }
}

fn print_chunks<T: std::fmt::Debug>(idx: usize, shape: &Shape, vec: &[T], f: &mut std::fmt::Formatter) -> std::fmt::Result {
  let indent = (0..idx * 2).map(|_| " ").collect::<String>();
  if shape.rank() == 0 {
    write!(f, "{indent}{:?}", vec[0])?;
  } else if idx == shape.rank() - 1 || vec.is_empty() {
    writeln!(f, "{indent}{:?}", vec)?;
  } else {
    let chunks = vec.chunks(vec.len() / shape.dims[idx]);
    writeln!(f, "{indent}[")?;
    for chunk in chunks {
      print_chunks(idx + 1, shape, chunk, f)?;
    }
    writeln!(f, "{indent}]")?;
  }
  Ok(())
}


pub struct TensorSliceIterator<T: Inner> {
  tensor: Tensor<T>,
  index: usize,
}

impl<T: Inner> TensorSliceIterator<T> {
  fn new(tensor: &Tensor<T>, dim: isize) -> Self {
    let tensor = if tensor.shape.rank() == 0 {
      tensor.unsqueeze(0)
    } else {
      tensor.transpose(0, dim)
    };
    Self {
      tensor,
      index: 0,
    }
  }
}

impl<T: Inner> Iterator for TensorSliceIterator<T> {
  type Item = Tensor<T>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.index == self.tensor.shape[0] { return None }
    let out = self.tensor.at(&[self.index]);
    self.index += 1;
    Some(out)
  }
}


pub struct TensorIterator<'a, T: Inner> {
  data: Ref<'a, Vec<T>>,
  shape_iter: Box<dyn Iterator<Item=usize> + 'a>,
}

impl<'a, T: Inner> TensorIterator<'a, T> {
  fn new(tensor: &'a Tensor<T>) -> Self {
    Self {
      data: tensor.data.borrow(),
      shape_iter: tensor.shape.iter(),
    }
  }
}

impl<T: Inner> Iterator for TensorIterator<'_, T> {
  type Item = T;

  fn next(&mut self) -> Option<Self::Item> {
    self.shape_iter.next().map(|i| self.data[i] )
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use rand::{ SeedableRng, rngs::StdRng };

  #[test]
  fn index() {
    let x = Tensor::new(&[2,2,2], vec![1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(x.at(&[0,0]), Tensor::vec(&[1, 2]));
    assert_eq!(x.at(&[1,1]), Tensor::vec(&[7, 8]));
    assert_eq!(x.at(&[0,1,1]), Tensor::vec(&[4]));
    assert_eq!(x.at(&[0]), Tensor::new(&[2,2], vec![1, 2, 3, 4]));
  }

  #[test]
  fn broadcast() {
    let x = Tensor::new(&[1,2,3], vec![1, 2, 3, 4, 5, 6]);

    let y = Tensor::new(&[    1], vec![1]);
    assert_eq!(&x + &y, Tensor::new(&[1,2,3], vec![2, 3, 4, 5, 6, 7]));

    let y = Tensor::new(&[    3], vec![1, 2, 3]);
    assert_eq!(&x + &y, Tensor::new(&[1,2,3], vec![2, 4, 6, 5, 7, 9]));

    let y = Tensor::new(&[  2,3], vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(&x + &y, Tensor::new(&[1,2,3], vec![2, 4, 6, 8, 10, 12]));
  }

  #[test]
  fn iterate_columns() {
    let x = Tensor::new(&[3,2], vec![1, 2, 3, 4, 5, 6]);
    let columns: Vec<_> = x.iter(1).map(|c| c.to_vec() ).collect();
    assert_eq!(columns, vec![vec![1, 3, 5], vec![2, 4, 6]]);
  }

  #[test]
  fn into_raw_view() {
    let x = Tensor::new(&[3,2], vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(x.transpose(0, 1).into_raw(), vec![1, 3, 5, 2, 4, 6]);
    assert_eq!(x.range(&[1..-1]).into_raw(), vec![3, 4, 5, 6]);
  }

  #[test]
  fn cast() {
    let ids = Tensor::vec(&[0usize, 3, 7]);
    assert_eq!(ids.cast::<f32>(), Tensor::vec(&[0.0, 3.0, 7.0]));
  }

  #[test]
  fn randn_seeded() {
    let a: Tensor<f32> = Tensor::randn(&[3,3], &mut StdRng::seed_from_u64(1));
    let b: Tensor<f32> = Tensor::randn(&[3,3], &mut StdRng::seed_from_u64(1));
    assert_eq!(a, b);
    assert_eq!(a.size(), 9);
  }

  #[test]
  fn uniform_bounds() {
    let mut rng = StdRng::seed_from_u64(3);
    let ints: Tensor<i64> = Tensor::uniform(&[50], 4, &mut rng);
    assert!(ints.param_iter().all(|a| (0..4).contains(&a) ));
  }
}
