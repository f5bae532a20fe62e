use rand::RngCore;

use crate::{
  error::Result,
  matrix::orthogonal_weight,
  network::{ Layer, Parameters },
  ops::*,
  scalar::Real,
  Tensor, Variable,
};


/// Softmax layer that turns its input into a probability
/// for every class in the vocabulary.

#[derive(Debug, Clone)]
pub struct OutputLayer {
  in_size: usize,
  out_size: usize,
}

impl OutputLayer {
  pub fn new(in_size: usize, out_size: usize) -> Self {
    Self { in_size, out_size }
  }

  fn preact<T: Real>(&self, params: &Parameters<T>, input: &Variable<T>) -> Result<Variable<T>> {
    Ok(input.mm(params.get("output_W")?) + params.get("output_b")?)
  }
}

impl<T: Real> Layer<T> for OutputLayer {
  fn param_shapes(&self) -> Vec<(String, Vec<usize>)> {
    vec![
      ("output_W".to_string(), vec![self.in_size, self.out_size]),
      ("output_b".to_string(), vec![self.out_size]),
    ]
  }

  fn param_init_values(&self, rng: &mut dyn RngCore) -> Vec<(String, Tensor<T>)> {
    let scale = T::from(0.01).unwrap_or_else(T::zero);
    vec![
      ("output_W".to_string(), orthogonal_weight(self.in_size, self.out_size, Some(scale), rng)),
      ("output_b".to_string(), Tensor::zeros(&[self.out_size])),
    ]
  }

  /// Input is indexed by time step, sequence and feature. Time steps
  /// and sequences are merged before the softmax, so the output
  /// is a `[time steps * sequences, out_size]` matrix.

  fn minibatch_output(&self, params: &Parameters<T>, input: &Variable<T>) -> Result<Variable<T>> {
    Ok(self.preact(params, input)?
      .reshape(&[0, self.out_size])
      .softmax(-1))
  }

  /// Input is indexed by sequence and feature.

  fn onestep_output(&self, params: &Parameters<T>, input: &Variable<T>) -> Result<Variable<T>> {
    Ok(self.preact(params, input)?.softmax(-1))
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use approx::assert_relative_eq;
  use rand::{ SeedableRng, rngs::StdRng };

  fn params(layer: &OutputLayer) -> Parameters<f64> {
    let mut rng = StdRng::seed_from_u64(4);
    Parameters::from_tensors(layer.param_init_values(&mut rng))
  }

  #[test]
  fn init() {
    let layer = OutputLayer::new(3, 5);
    let params = params(&layer);
    assert_eq!(params.get("output_W").unwrap().shape().dims, vec![3,5]);
    assert_eq!(params.get("output_b").unwrap().tensor(), Tensor::zeros(&[5]));
    params.check_shapes(&Layer::<f64>::param_shapes(&layer)).unwrap();
  }

  #[test]
  fn minibatch_rows_sum_to_one() {
    let layer = OutputLayer::new(3, 5);
    let params = params(&layer);
    let input = Tensor::arrange(&[4,2,3], -1.0, 0.25).tracked();
    let output = layer.minibatch_output(&params, &input).unwrap();
    assert_eq!(output.shape().dims, vec![8,5]);
    for row in output.tensor().iter(0) {
      assert_relative_eq!(row.sum(0).item(), 1.0, epsilon = 1e-12);
    }
  }

  #[test]
  fn onestep() {
    let layer = OutputLayer::new(3, 5);
    let params = params(&layer);
    let input = Tensor::ones(&[2,3]).tracked();
    let output = layer.onestep_output(&params, &input).unwrap().tensor();
    assert_eq!(output.shape().dims, vec![2,5]);
    assert_eq!(output.at(&[0]), output.at(&[1]));
  }

  #[test]
  fn missing_parameter() {
    let layer = OutputLayer::new(3, 5);
    let params: Parameters<f32> = Parameters::from_tensors(vec![]);
    let input = Tensor::ones(&[2,3]).tracked();
    assert!(layer.onestep_output(&params, &input).is_err());
  }
}
