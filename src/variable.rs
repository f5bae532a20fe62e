use std::rc::Rc;
use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::atomic::{ AtomicUsize, Ordering };
use std::fmt::Debug;

mod mops;
mod graph;

pub use graph::Graph;

use crate::{
  tensor::Tensor,
  scalar::Real,
  ops::Hops,
};


pub fn make_id() -> usize {
  static LAST_ID: AtomicUsize = AtomicUsize::new(0);
  LAST_ID.fetch_add(1, Ordering::Relaxed)
}


/// Unary computational operation.

pub trait UnaryOp<T: Real>: Debug {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T>;
}


/// Binary computational operation.

pub trait BinaryOp<T: Real>: Debug {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T>;
}


#[derive(Debug)]
enum Op<T: Real> {
  Unary(Box<dyn UnaryOp<T>>),
  Binary(Box<dyn BinaryOp<T>>),
}


/// Node in a computation graph, containing a [Variable]'s current value,
/// as well as the operation used to create it.

#[derive(Debug)]
struct Node<T: Real> {
  id: usize,
  data: RefCell<Tensor<T>>,
  op: Option<Op<T>>,
  previous: Vec<Rc<Self>>,
}

impl<T: Real> Node<T> {
  fn forward(&self) {
    if let Some(op) = &self.op {
      let value = {
        let lhs = self.previous[0].data.borrow();
        match op {
          Op::Unary(op) => op.run(&lhs),
          Op::Binary(op) => op.run(&lhs, &self.previous[1].data.borrow()),
        }
      };
      self.data.replace(value);
    }
  }
}


/// Variables are symbolic expressions over tensors. They record the
/// operation used to create them, so the whole expression can be
/// re-evaluated once its inputs receive new values.
///
/// Variables get created by calling [tracked](Tensor::tracked) on any
/// [Real] tensor. Every operation is evaluated eagerly on creation, so
/// inputs should be given representative test values.

#[derive(Debug, Clone)]
pub struct Variable<T: Real> {
  node: Rc<Node<T>>,
}

impl<T: Real> Hops<T> for Variable<T> {}

impl<T: Real> PartialEq for Variable<T> {
  fn eq(&self, rhs: &Self) -> bool {
    *self.node.data.borrow() == *rhs.node.data.borrow()
  }
}

impl<T: Real> Variable<T> {
  pub(crate) fn from_tensor(tensor: Tensor<T>) -> Self {
    Self {
      node: Rc::new(Node {
        id: make_id(),
        data: RefCell::new(tensor),
        op: None,
        previous: vec![],
      }),
    }
  }

  fn operation(op: Op<T>, data: Tensor<T>, previous: Vec<Rc<Node<T>>>) -> Self {
    Self {
      node: Rc::new(Node {
        id: make_id(),
        data: RefCell::new(data),
        op: Some(op),
        previous,
      }),
    }
  }

  /// Current value of this Variable.

  pub fn tensor(&self) -> Tensor<T> {
    self.node.data.borrow().clone()
  }

  pub fn is_leaf(&self) -> bool {
    self.node.op.is_none()
  }

  /// Give this Variable a new value. Dependent variables only
  /// pick it up once they get re-evaluated.

  pub fn assign(&self, tensor: &Tensor<T>) {
    self.node.data.replace(tensor.clone());
  }

  pub fn unary_op(&self, op: impl UnaryOp<T> + 'static) -> Self {
    let data = op.run(&self.node.data.borrow());
    Self::operation(
      Op::Unary(Box::new(op)),
      data,
      vec![self.node.clone()],
    )
  }

  pub fn binary_op(&self, op: impl BinaryOp<T> + 'static, rhs: &Self) -> Self {
    let data = op.run(&self.node.data.borrow(), &rhs.node.data.borrow());
    Self::operation(
      Op::Binary(Box::new(op)),
      data,
      vec![self.node.clone(), rhs.node.clone()],
    )
  }

  /// Reevaluate this Variable's graph to produce a new output.

  pub fn forward(&self) {
    for node in self.history() {
      node.forward();
    }
  }

  fn history(&self) -> Vec<Rc<Node<T>>> {
    let mut history = vec![];
    Self::history_recurse(&self.node, &mut history, &mut HashSet::new());
    history
  }

  fn history_recurse(node: &Rc<Node<T>>, history: &mut Vec<Rc<Node<T>>>, visited: &mut HashSet<usize>) {
    if visited.contains(&node.id) { return }
    visited.insert(node.id);
    for prev in &node.previous {
      Self::history_recurse(prev, history, visited);
    }
    history.push(node.clone());
  }
}

impl<T: Real> std::fmt::Display for Variable<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    let title = if self.node.op.is_some() {
      "Computed"
    } else {
      "Tracked"
    };
    write!(f, "{title} {}", self.node.data.borrow())
  }
}
