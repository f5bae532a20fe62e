use std::ops::Range;
use std::fmt::Debug;

use serde::{ Serialize, Deserialize };

use crate::internal::*;


/// The shape of a [Tensor](crate::Tensor).
///
/// Besides its dimensions, a shape stores the strides and offset
/// used to locate its elements in the underlying storage, which lets
/// tensors be sliced, transposed and broadcasted without copying.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
  pub dims: Vec<usize>,
  pub(crate) strides: Vec<isize>,
  pub(crate) offset: usize,
}

impl Shape {
  pub fn new(dims: &[usize]) -> Self {
    let strides = Self::make_strides(dims);
    Self {
      dims: dims.to_vec(),
      strides,
      offset: 0,
    }
  }

  fn make_strides(dims: &[usize]) -> Vec<isize> {
    if dims.is_empty() { return vec![] }
    let mut strides = vec![0; dims.len()];
    strides[dims.len() - 1] = 1;
    for i in (1..dims.len()).rev() {
      strides[i - 1] = dims[i] as isize * strides[i];
    }
    strides
  }

  pub fn size(&self) -> usize {
    self.dims.iter().product()
  }

  pub fn rank(&self) -> usize {
    self.dims.len()
  }

  pub(crate) fn index(&self, indices: &[usize]) -> usize {
    assert!(indices.len() <= self.rank());
    // Append missing dimensions as zero
    (indices.iter()
      .chain(std::iter::repeat(&0))
      .zip(&self.strides)
      .map(|(&i, &s)| i as isize * s)
      .sum::<isize>() + self.offset as isize
    ) as usize
  }

  pub fn contiguous(&self) -> bool {
    self.strides == Self::make_strides(&self.dims)
  }

  /// Storage indices of all elements, in row-major order.

  pub fn iter(&self) -> Box<dyn Iterator<Item=usize> + '_> {
    if self.contiguous() {
      Box::new(self.offset..self.offset + self.size())
    } else {
      Box::new(ShapeIterator::new(self))
    }
  }

  /// Reinterpret a contiguous shape with new dimensions.
  /// A single `0` acts as placeholder for whatever size remains.

  pub fn view(&self, shape: &[usize]) -> Self {
    assert!(self.contiguous(), "Cannot view non-contiguous {}", self);
    let dims: Vec<usize> = shape.iter().enumerate().map(|(i, &n)| if n == 0 {
      let product: usize =
        shape[0..i].iter()
        .chain(shape[i + 1..shape.len()].iter())
        .product();
      if product == 0 { 0 } else { self.size() / product }
    } else {
      n
    }).collect();
    assert_eq!(dims.iter().product::<usize>(), self.size(),
      "Cannot view {} as {:?}", self, dims);
    let strides = Self::make_strides(&dims);
    Self { dims, strides, offset: self.offset }
  }

  pub fn take(&self, indices: &[usize]) -> Self {
    for (d, &i) in indices.iter().enumerate() {
      assert!(i < self.dims[d], "Index {} out of bounds for dimension {} of {}", i, d, self);
    }
    let dims = self.dims[indices.len()..].to_vec();
    let strides = self.strides[indices.len()..].to_vec();
    let offset = self.index(indices);
    Self { dims, strides, offset }
  }

  /// Slice leading dimensions. Negative bounds count from the back,
  /// with `-1` as end meaning "through the last element".

  pub fn range(&self, ranges: &[Range<isize>]) -> Self {
    let mut offset = 0;
    let mut dims = self.dims.clone();
    for (d, range) in ranges.iter().enumerate() {
      let dim = self.dims[d];
      let start = negative_index(range.start, dim, true).min(dim);
      let end = negative_index(range.end, dim, true).min(dim).max(start);
      offset += self.strides[d] * start as isize;
      dims[d] = end - start
    }
    Self { dims, strides: self.strides.clone(), offset: (self.offset as isize + offset) as usize }
  }

  /// Drop all dimensions of size one.

  pub fn squeeze(&self) -> Self {
    let mut dims = vec![];
    let mut strides = vec![];
    for (d, &n) in self.dims.iter().enumerate() {
      if n != 1 {
        dims.push(n);
        strides.push(self.strides[d]);
      }
    }
    Self { dims, strides, offset: self.offset }
  }

  pub fn unsqueeze(&self, dim: isize) -> Self {
    let d = negative_index(dim, self.rank(), true);
    let mut shape = self.clone();
    shape.strides.insert(d, if d < shape.dims.len() {
      shape.strides[d].abs() * shape.dims[d] as isize
    } else { 1 });
    shape.dims.insert(d, 1);
    shape
  }

  /// Right-aligned numpy style broadcast of this shape against `other`.

  pub fn broadcast(&self, other: &Self) -> Self {
    let mut dims = vec![];
    let mut strides = vec![];
    self.dims.iter()
      .rev()
      .chain(std::iter::repeat(&1))
      .zip(other.dims.iter()
        .rev()
        .chain(std::iter::repeat(&1)))
      .take(self.rank().max(other.rank()))
      .inspect(|(&a, &b)|
        assert!(a == b || a == 1 || b == 1, "Could not broadcast {} & {}", self, other) )
      .zip(self.strides.iter()
        .rev()
        .chain(std::iter::repeat(&0)))
      .for_each(|((&dl, &dr), &stride)| {
        dims.push(if dl == 1 { dr } else { dl });
        strides.push(if dl == 1 && dr != 1 { 0 } else { stride });
      });
    let dims: Vec<_> = dims.into_iter().rev().collect();
    let strides: Vec<_> = strides.into_iter().rev().collect();
    Self { dims, strides, offset: self.offset }
  }

  pub fn transpose(&self, dim1: isize, dim2: isize) -> Self {
    let dim1 = negative_index(dim1, self.rank(), false);
    let dim2 = negative_index(dim2, self.rank(), false);
    let mut shape = self.clone();
    shape.dims.swap(dim1, dim2);
    shape.strides.swap(dim1, dim2);
    shape
  }
}

impl std::ops::Index<isize> for Shape {
  type Output = usize;

  fn index(&self, i: isize) -> &usize {
    let idx = negative_index(i, self.rank(), false);
    &self.dims[idx]
  }
}

impl std::fmt::Display for Shape {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "Shape{:?}", self.dims)
  }
}


/// Iterate through a [Shape]'s indices.

pub struct ShapeIterator<'a> {
  shape: &'a Shape,
  counter: Vec<usize>,
  idx: isize,
  finished: bool,
}

impl<'a> ShapeIterator<'a> {
  fn new(shape: &'a Shape) -> Self {
    Self {
      counter: vec![0; shape.rank()],
      idx: shape.offset as isize,
      finished: shape.size() == 0,
      shape,
    }
  }
}

impl<'a> Iterator for ShapeIterator<'a> {
  type Item = usize;

  fn next(&mut self) -> Option<Self::Item> {
    if self.finished { return None }
    let out = self.idx as usize;
    let len = self.counter.len();
    if len == 0 { self.finished = true }
    // Walk backward through dimensions
    for cd in (0..len).rev() {
      // Increment counter on full turn of right hand dimension
      if cd == len - 1 || self.counter[cd + 1] == 0 {
        let count = &mut self.counter[cd];
        // Full turn?
        if *count == self.shape.dims[cd] - 1 {
          if cd == 0 { self.finished = true; break }
          *count = 0;
          let backstride = (self.shape.dims[cd] as isize - 1) * self.shape.strides[cd];
          self.idx -= backstride;
        } else {
          *count += 1;
          self.idx += self.shape.strides[cd];
        }
      } else {
        break
      }
    }
    Some(out)
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn strides() {
    let shape = Shape::new(&[3,2,2]);
    assert_eq!(shape.strides, vec![4,2,1]);

    let shape = Shape::new(&[2,3,2]);
    assert_eq!(shape.strides, vec![6,2,1]);
  }

  #[test]
  fn index() {
    let shape = Shape::new(&[2,3]);
    assert_eq!(shape.index(&[0]), 0);
    assert_eq!(shape.index(&[1,0]), 3);
  }

  #[test]
  fn range() {
    let shape = Shape::new(&[4,4,4]).range(&[1..3, 1..3, 1..3]);
    assert_eq!(shape.dims, vec![2,2,2]);
    assert_eq!(shape.offset, 21);
    let indices: Vec<_> = shape.iter().collect();
    assert_eq!(indices, vec![21, 22, 25, 26, 37, 38, 41, 42]);
  }

  #[test]
  fn range_shifted() {
    let shape = Shape::new(&[4,2]);
    let tail = shape.range(&[1..-1]);
    assert_eq!(tail.dims, vec![3,2]);
    assert_eq!(tail.offset, 2);
    let head = shape.range(&[0..-2]);
    assert_eq!(head.dims, vec![3,2]);
    assert_eq!(head.offset, 0);
  }

  #[test]
  fn range_empty() {
    let shape = Shape::new(&[1,3]).range(&[1..-1]);
    assert_eq!(shape.dims, vec![0,3]);
    assert_eq!(shape.iter().count(), 0);
  }

  #[test]
  fn view_placeholder() {
    let shape = Shape::new(&[3,2,4]).view(&[0, 4]);
    assert_eq!(shape.dims, vec![6,4]);
    let shape = Shape::new(&[0,2,4]).view(&[0, 4]);
    assert_eq!(shape.dims, vec![0,4]);
  }

  #[test]
  fn unsqueeze() {
    let shape = Shape::new(&[3,2,2]).unsqueeze(-1);
    assert_eq!(shape.dims, vec![3,2,2,1]);
    assert_eq!(shape.strides, vec![4,2,1,1]);

    let shape = Shape::new(&[2,3,2]).unsqueeze(0);
    assert_eq!(shape.dims, vec![1,2,3,2]);
    assert_eq!(shape.strides, vec![12,6,2,1]);
  }

  #[test]
  fn squeeze() {
    let shape = Shape::new(&[3,2,1]).squeeze();
    assert_eq!(shape.dims, vec![3,2]);
    assert_eq!(shape.strides, vec![2,1]);

    let shape = Shape::new(&[2,1,3,1,2]).transpose(0, 1).squeeze();
    assert_eq!(shape.dims, vec![2,3,2]);
    assert_eq!(shape.strides, vec![6,2,1]);
  }

  #[test]
  fn broadcast() {
    let shape = Shape::new(&[2,3,2]).broadcast(&Shape::new(&[2,1,2]));
    assert_eq!(shape.dims, vec![2,3,2]);
    assert_eq!(shape.strides, vec![6,2,1]);

    let shape = Shape::new(&[2,1,2]).broadcast(&Shape::new(&[2,3,1]));
    assert_eq!(shape.dims, vec![2,3,2]);
    assert_eq!(shape.strides, vec![2,0,1]);

    let indices: Vec<_> = shape.iter().collect();
    assert_eq!(indices, vec![0, 1, 0, 1, 0, 1, 2, 3, 2, 3, 2, 3]);
  }

  #[test]
  fn transpose() {
    let shape = Shape::new(&[2,3]).transpose(0,1);
    assert_eq!(shape.dims, vec![3,2]);
    assert_eq!(shape.strides, vec![1,3]);
    assert_eq!(shape.index(&[1,0]), 1);
    assert_eq!(shape.index(&[1,1]), 4);
  }
}
