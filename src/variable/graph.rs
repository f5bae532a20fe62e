use std::rc::Rc;

use itertools::Itertools;
use log::debug;

use crate::{
  scalar::Real,
  variable::{ Variable, Node },
  Tensor,
};


/// Compiled function from a set of input [Variables](Variable)
/// to a set of output Variables.
///
/// The schedule of operations is resolved once, on construction.
/// [run](Graph::run) then feeds new input tensors, which may differ in
/// shape from the ones the graph was built with, and re-evaluates
/// every operation the outputs depend on.

#[derive(Debug, Clone)]
pub struct Graph<T: Real> {
  inputs: Vec<Variable<T>>,
  outputs: Vec<Variable<T>>,
  schedule: Vec<Rc<Node<T>>>,
}

impl<T: Real> Graph<T> {
  pub fn new(inputs: &[Variable<T>], outputs: &[Variable<T>]) -> Self {
    for input in inputs {
      assert!(input.is_leaf(), "Graph input {} is computed by another operation", input);
    }
    let schedule: Vec<_> = outputs
      .iter()
      .flat_map(|out| out.history() )
      .filter(|node| node.op.is_some() )
      .sorted_by_key(|node| node.id )
      .unique_by(|node| node.id )
      .collect();
    debug!("Compiled graph with {} operations from {} inputs to {} outputs",
      schedule.len(), inputs.len(), outputs.len());
    Self {
      inputs: inputs.into(),
      outputs: outputs.into(),
      schedule,
    }
  }

  /// Feed `inputs` in declaration order and return the
  /// recomputed values of all outputs.

  pub fn run(&self, inputs: &[&Tensor<T>]) -> Vec<Tensor<T>> {
    assert_eq!(inputs.len(), self.inputs.len(),
      "Graph expects {} inputs, got {}", self.inputs.len(), inputs.len());
    for (input, data) in self.inputs.iter().zip(inputs) {
      input.assign(data);
    }
    for node in &self.schedule {
      node.forward();
    }
    self.outputs.iter().map(|out| out.tensor() ).collect()
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::ops::{ BaseOps, NumericOps, RealOps };

  #[test]
  fn rerun() {
    let x1 = Tensor::vec(&[1.0, 2.0]).tracked();
    let x2 = Tensor::ones(&[3]).tracked();
    let w = Tensor::new(&[2,3], vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0]).tracked();

    let y = x1.mm(&w);
    let z = (&y * &x2).sum(0);

    let graph = Graph::new(&[x1, x2], &[y, z]);
    let out = graph.run(&[&Tensor::vec(&[5.0, 6.0]), &Tensor::vec(&[2.0, 2.0, 2.0])]);
    assert_eq!(out[0], Tensor::vec(&[5.0, 6.0, 0.0]));
    assert_eq!(out[1].item(), 22.0);
  }

  #[test]
  fn rerun_new_shape() {
    let x = Tensor::ones(&[2,1]).tracked();
    let y = x.range(&[1..-1]).sum(0);
    let graph = Graph::new(&[x], &[y]);
    let out = graph.run(&[&Tensor::new(&[4,1], vec![1.0, 2.0, 3.0, 4.0])]);
    assert_eq!(out[0].item(), 9.0);
    let out = graph.run(&[&Tensor::new(&[1,1], vec![1.0])]);
    assert_eq!(out[0].item(), 0.0);
  }

  #[test]
  #[should_panic]
  fn computed_input() {
    let x = Tensor::vec(&[1.0]).tracked();
    let y = x.exp();
    Graph::new(&[y.clone()], &[y]);
  }
}
