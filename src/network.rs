use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::debug;
use rand::{ Rng, RngCore };
use serde::{ Serialize, Deserialize, de::DeserializeOwned };

mod layers;
mod output;

pub use layers::{ Activation, HiddenLayer, ProjectionLayer };
pub use output::OutputLayer;

use crate::{
  error::{ Error, Result },
  matrix::test_value,
  ops::*,
  scalar::{ Inner, Real },
  vocabulary::Vocabulary,
  Tensor, Variable,
};


/// Building block of a [Network].
///
/// Layers only describe how their parameters get initialized and how
/// their output is computed. The parameters themselves are owned by
/// the network and handed in as [Parameters].

pub trait Layer<T: Real>: std::fmt::Debug {
  /// Names and dimensions of the parameters this layer reads.
  fn param_shapes(&self) -> Vec<(String, Vec<usize>)>;

  fn param_init_values(&self, rng: &mut dyn RngCore) -> Vec<(String, Tensor<T>)>;

  /// Output for inputs indexed by time step and sequence.
  fn minibatch_output(&self, params: &Parameters<T>, input: &Variable<T>) -> Result<Variable<T>>;

  /// Output for a single time step of each sequence.
  fn onestep_output(&self, params: &Parameters<T>, input: &Variable<T>) -> Result<Variable<T>>;
}


/// Named model weights, ordered by name.

#[derive(Debug, Clone)]
pub struct Parameters<T: Real> {
  vars: BTreeMap<String, Variable<T>>,
}

impl<T: Real> Parameters<T> {
  pub fn from_tensors<I: IntoIterator<Item = (String, Tensor<T>)>>(tensors: I) -> Self {
    let vars = tensors.into_iter()
      .map(|(name, tensor)| (name, tensor.tracked()) )
      .collect();
    Self { vars }
  }

  pub fn get(&self, name: &str) -> Result<&Variable<T>> {
    self.vars.get(name).ok_or_else(|| Error::MissingParameter(name.to_string()) )
  }

  /// Fail unless every named parameter exists with exactly the given dimensions.

  pub fn check_shapes(&self, shapes: &[(String, Vec<usize>)]) -> Result<()> {
    for (name, expected) in shapes {
      let found = self.get(name)?.shape().dims;
      if &found != expected {
        return Err(Error::Shape { name: name.clone(), expected: expected.clone(), found })
      }
    }
    Ok(())
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.vars.keys().map(|name| name.as_str() )
  }

  pub fn len(&self) -> usize {
    self.vars.len()
  }

  pub fn is_empty(&self) -> bool {
    self.vars.is_empty()
  }

  /// Current values of all parameters.

  pub fn tensors(&self) -> BTreeMap<String, Tensor<T>> {
    self.vars.iter()
      .map(|(name, var)| (name.clone(), var.tensor()) )
      .collect()
  }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
  pub projection_dim: usize,
  pub hidden_dim: usize,
  pub hidden_layer: Activation,
}

impl Default for NetworkConfig {
  fn default() -> Self {
    Self {
      projection_dim: 100,
      hidden_dim: 300,
      hidden_layer: Activation::Tanh,
    }
  }
}

impl NetworkConfig {
  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
  }
}


#[derive(Serialize, Deserialize)]
struct NetworkState<T: Inner> {
  config: NetworkConfig,
  vocabulary: Vocabulary,
  parameters: BTreeMap<String, Tensor<T>>,
}


/// Neural network language model.
///
/// Predicts the class of the next word from the class of the current
/// one: projection, hidden layer and softmax output. The network is
/// built symbolically twice. The mini-batch structure maps
/// `minibatch_input` (`[T, S]` class IDs) to `prediction_probs`
/// (`[T-1, S]`), the probability the network gives to each actual
/// next word. The one-step structure maps `onestep_input` (`[S]`)
/// to a distribution over all classes (`[S, V]`).

#[derive(Debug)]
pub struct Network<T: Real> {
  config: NetworkConfig,
  vocabulary: Vocabulary,
  params: Parameters<T>,
  minibatch_input: Variable<T>,
  minibatch_mask: Variable<T>,
  prediction_probs: Variable<T>,
  onestep_input: Variable<T>,
  onestep_output: Variable<T>,
}

impl<T: Real> Network<T> {
  /// Network with freshly initialized weights.

  pub fn new<R: Rng>(config: NetworkConfig, vocabulary: Vocabulary, rng: &mut R) -> Result<Self> {
    let (projection, hidden, output) = Self::layers(&config, &vocabulary);
    let rng: &mut dyn RngCore = rng;
    let mut tensors: Vec<(String, Tensor<T>)> = projection.param_init_values(rng);
    tensors.extend(hidden.param_init_values(rng));
    tensors.extend(output.param_init_values(rng));
    Self::from_parameters(config, vocabulary, tensors)
  }

  /// Network with given weights.

  pub fn from_parameters<I>(config: NetworkConfig, vocabulary: Vocabulary, tensors: I) -> Result<Self>
  where
    I: IntoIterator<Item = (String, Tensor<T>)>,
  {
    let (projection, hidden, output) = Self::layers(&config, &vocabulary);
    let params = Parameters::from_tensors(tensors);
    params.check_shapes(&Layer::<T>::param_shapes(&projection))?;
    params.check_shapes(&Layer::<T>::param_shapes(&hidden))?;
    params.check_shapes(&Layer::<T>::param_shapes(&output))?;
    let num_classes = vocabulary.num_classes();
    let mut rng = rand::thread_rng();

    // Placeholders get replaced on every run
    let minibatch_input = test_value(&[2, 1], num_classes, &mut rng).cast::<T>().tracked();
    let minibatch_mask = Tensor::<T>::ones(&[2, 1]).tracked();
    let onestep_input = test_value(&[1], num_classes, &mut rng).cast::<T>().tracked();

    let projected = projection.minibatch_output(&params, &minibatch_input)?;
    let hidden_state = hidden.minibatch_output(&params, &projected)?;
    // The last time step has no next word to predict
    let hidden_state = hidden_state.range(&[0..-2]);
    let probs = output.minibatch_output(&params, &hidden_state)?;
    let targets = minibatch_input.range(&[1..-1]);
    let prediction_probs = probs
      .pick(&targets.reshape(&[0]))
      .reshape_as(&targets);

    let projected = projection.onestep_output(&params, &onestep_input)?;
    let hidden_state = hidden.onestep_output(&params, &projected)?;
    let onestep_output = output.onestep_output(&params, &hidden_state)?;

    debug!("Built network over {} classes with {} parameters {:?}",
      num_classes, params.len(), params.names().collect::<Vec<_>>());

    Ok(Self {
      config,
      vocabulary,
      params,
      minibatch_input,
      minibatch_mask,
      prediction_probs,
      onestep_input,
      onestep_output,
    })
  }

  fn layers(config: &NetworkConfig, vocabulary: &Vocabulary) -> (ProjectionLayer, HiddenLayer, OutputLayer) {
    let num_classes = vocabulary.num_classes();
    (
      ProjectionLayer::new(num_classes, config.projection_dim),
      HiddenLayer::new(config.projection_dim, config.hidden_dim, config.hidden_layer),
      OutputLayer::new(config.hidden_dim, num_classes),
    )
  }

  pub fn config(&self) -> &NetworkConfig {
    &self.config
  }

  pub fn vocabulary(&self) -> &Vocabulary {
    &self.vocabulary
  }

  pub fn params(&self) -> &Parameters<T> {
    &self.params
  }

  /// Class IDs indexed by time step and sequence.

  pub fn minibatch_input(&self) -> &Variable<T> {
    &self.minibatch_input
  }

  pub fn minibatch_mask(&self) -> &Variable<T> {
    &self.minibatch_mask
  }

  pub fn prediction_probs(&self) -> &Variable<T> {
    &self.prediction_probs
  }

  pub fn onestep_input(&self) -> &Variable<T> {
    &self.onestep_input
  }

  pub fn onestep_output(&self) -> &Variable<T> {
    &self.onestep_output
  }
}

impl<T: Real + Serialize + DeserializeOwned> Network<T> {
  /// Write config, vocabulary and weights to a single file.

  pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
    let state = NetworkState {
      config: self.config.clone(),
      vocabulary: self.vocabulary.clone(),
      parameters: self.params.tensors(),
    };
    std::fs::write(path, postcard::to_allocvec(&state)?)?;
    Ok(())
  }

  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
    let bytes = std::fs::read(path)?;
    let state: NetworkState<T> = postcard::from_bytes(&bytes)?;
    Self::from_parameters(state.config, state.vocabulary, state.parameters)
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use approx::assert_relative_eq;
  use rand::{ SeedableRng, rngs::StdRng };

  fn config() -> NetworkConfig {
    NetworkConfig { projection_dim: 4, hidden_dim: 6, hidden_layer: Activation::Tanh }
  }

  #[test]
  fn config_defaults() {
    let config: NetworkConfig = serde_json::from_str(r#"{ "hidden_layer": "glu" }"#).unwrap();
    assert_eq!(config.projection_dim, 100);
    assert_eq!(config.hidden_dim, 300);
    assert_eq!(config.hidden_layer, Activation::Glu);
  }

  #[test]
  fn parameter_shapes() {
    let vocab = Vocabulary::from_words(&["a", "b", "c"]);
    let network: Network<f32> = Network::new(config(), vocab, &mut StdRng::seed_from_u64(0)).unwrap();
    let params = network.params();
    assert_eq!(params.names().collect::<Vec<_>>(),
      vec!["hidden_W", "hidden_b", "output_W", "output_b", "projection_W"]);
    assert_eq!(params.get("projection_W").unwrap().shape().dims, vec![6,4]);
    assert_eq!(params.get("output_W").unwrap().shape().dims, vec![6,6]);
  }

  #[test]
  fn prediction_probs_follow_input() {
    let vocab = Vocabulary::from_words(&["a", "b"]);
    let network: Network<f64> = Network::new(config(), vocab, &mut StdRng::seed_from_u64(1)).unwrap();
    let input = network.minibatch_input();
    input.assign(&Tensor::new(&[3,2], vec![0.0, 0.0, 3.0, 4.0, 1.0, 1.0]));
    let probs = network.prediction_probs();
    probs.forward();
    let probs = probs.tensor();
    assert_eq!(probs.shape().dims, vec![2,2]);
    assert!(probs.param_iter().all(|p| p > 0.0 && p < 1.0 ));
  }

  #[test]
  fn onestep_distribution() {
    let vocab = Vocabulary::from_words(&["a", "b"]);
    let network: Network<f64> = Network::new(config(), vocab, &mut StdRng::seed_from_u64(1)).unwrap();
    network.onestep_input().assign(&Tensor::vec(&[0.0, 3.0, 4.0]));
    let output = network.onestep_output();
    output.forward();
    let output = output.tensor();
    assert_eq!(output.shape().dims, vec![3,5]);
    for row in output.iter(0) {
      assert_relative_eq!(row.sum(0).item(), 1.0, epsilon = 1e-12);
    }
  }

  #[test]
  fn mismatched_shapes() {
    let vocab = Vocabulary::from_words(&["a", "b"]);
    let network: Network<f64> = Network::new(config(), vocab.clone(), &mut StdRng::seed_from_u64(2)).unwrap();
    let mut tensors = network.params().tensors();
    tensors.insert("output_W".to_string(), Tensor::zeros(&[4,5]));
    let result = Network::from_parameters(config(), vocab, tensors);
    match result {
      Err(Error::Shape { name, expected, found }) => {
        assert_eq!(name, "output_W");
        assert_eq!(expected, vec![6,5]);
        assert_eq!(found, vec![4,5]);
      },
      other => panic!("Expected shape error, got {:?}", other.map(|_| () )),
    }
  }

  #[test]
  fn config_must_match_weights() {
    let vocab = Vocabulary::from_words(&["a", "b"]);
    let network: Network<f32> = Network::new(config(), vocab.clone(), &mut StdRng::seed_from_u64(3)).unwrap();
    let glu = NetworkConfig { hidden_layer: Activation::Glu, ..config() };
    let result = Network::from_parameters(glu, vocab, network.params().tensors());
    assert!(matches!(result, Err(Error::Shape { .. })));
  }

  #[test]
  fn missing_parameters() {
    let vocab = Vocabulary::from_words(&["a"]);
    let result: Result<Network<f32>> = Network::from_parameters(config(), vocab, vec![]);
    assert!(matches!(result, Err(Error::MissingParameter(_))));
  }
}
