use rand::RngCore;
use serde::{ Serialize, Deserialize };

use crate::{
  error::Result,
  matrix::{ get_submatrix, orthogonal_weight, random_weight },
  network::{ Layer, Parameters },
  ops::*,
  scalar::Real,
  Tensor, Variable,
};


/// Word embedding: one row of `projection_W` per vocabulary class.

#[derive(Debug, Clone)]
pub struct ProjectionLayer {
  vocabulary_size: usize,
  projection_dim: usize,
}

impl ProjectionLayer {
  pub fn new(vocabulary_size: usize, projection_dim: usize) -> Self {
    Self { vocabulary_size, projection_dim }
  }
}

impl<T: Real> Layer<T> for ProjectionLayer {
  fn param_shapes(&self) -> Vec<(String, Vec<usize>)> {
    vec![("projection_W".to_string(), vec![self.vocabulary_size, self.projection_dim])]
  }

  fn param_init_values(&self, rng: &mut dyn RngCore) -> Vec<(String, Tensor<T>)> {
    let scale = T::from(0.01).unwrap_or_else(T::zero);
    vec![
      ("projection_W".to_string(), random_weight(self.vocabulary_size, self.projection_dim, Some(scale), rng)),
    ]
  }

  fn minibatch_output(&self, params: &Parameters<T>, input: &Variable<T>) -> Result<Variable<T>> {
    Ok(params.get("projection_W")?.look_up(input))
  }

  fn onestep_output(&self, params: &Parameters<T>, input: &Variable<T>) -> Result<Variable<T>> {
    self.minibatch_output(params, input)
  }
}


#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
  #[default]
  Tanh,
  /// Gated linear unit: one half of the pre-activation,
  /// gated by the sigmoid of the other half.
  Glu,
}


/// Feed-forward layer between the projection and the output layer.

#[derive(Debug, Clone)]
pub struct HiddenLayer {
  in_size: usize,
  out_size: usize,
  activation: Activation,
}

impl HiddenLayer {
  pub fn new(in_size: usize, out_size: usize, activation: Activation) -> Self {
    Self { in_size, out_size, activation }
  }

  // GLU computes the value and the gate from one matrix
  fn width(&self) -> usize {
    match self.activation {
      Activation::Tanh => self.out_size,
      Activation::Glu => self.out_size * 2,
    }
  }

  fn output<T: Real>(&self, params: &Parameters<T>, input: &Variable<T>) -> Result<Variable<T>> {
    let preact = input.mm(params.get("hidden_W")?) + params.get("hidden_b")?;
    match self.activation {
      Activation::Tanh => Ok(preact.tanh()),
      Activation::Glu => {
        let value = get_submatrix(&preact, 0, self.out_size)?;
        let gate = get_submatrix(&preact, 1, self.out_size)?;
        Ok(value * gate.sigmoid())
      },
    }
  }
}

impl<T: Real> Layer<T> for HiddenLayer {
  fn param_shapes(&self) -> Vec<(String, Vec<usize>)> {
    vec![
      ("hidden_W".to_string(), vec![self.in_size, self.width()]),
      ("hidden_b".to_string(), vec![self.width()]),
    ]
  }

  fn param_init_values(&self, rng: &mut dyn RngCore) -> Vec<(String, Tensor<T>)> {
    let width = self.width();
    let scale = T::from(0.01).unwrap_or_else(T::zero);
    vec![
      ("hidden_W".to_string(), orthogonal_weight(self.in_size, width, Some(scale), rng)),
      ("hidden_b".to_string(), Tensor::zeros(&[width])),
    ]
  }

  fn minibatch_output(&self, params: &Parameters<T>, input: &Variable<T>) -> Result<Variable<T>> {
    self.output(params, input)
  }

  fn onestep_output(&self, params: &Parameters<T>, input: &Variable<T>) -> Result<Variable<T>> {
    self.output(params, input)
  }
}
