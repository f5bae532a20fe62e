use rand::{ Rng, distributions::{ Distribution, WeightedIndex } };

use crate::{
  error::{ Error, Result },
  network::Network,
  scalar::Real,
  variable::Graph,
  Tensor,
};


/// Samples sentences from a [Network] one word at a time.

#[derive(Debug)]
pub struct TextGenerator<'a, T: Real> {
  network: &'a Network<T>,
  graph: Graph<T>,
}

impl<'a, T: Real> TextGenerator<'a, T> {
  pub fn new(network: &'a Network<T>) -> Self {
    let graph = Graph::new(
      &[network.onestep_input().clone()],
      &[network.onestep_output().clone()],
    );
    Self { network, graph }
  }

  /// Words of a sentence, without sentence markers. Sampling
  /// stops at `</s>` or after `max_length` words.

  pub fn generate<R: Rng + ?Sized>(&self, max_length: usize, rng: &mut R) -> Result<Vec<String>> {
    let vocabulary = self.network.vocabulary();
    let end_class = vocabulary.word_class(vocabulary.sentence_end_id());
    let mut class_id = vocabulary.word_class(vocabulary.sentence_start_id());
    let mut words = vec![];
    while words.len() < max_length {
      let input = Tensor::vec(&[T::from(class_id).unwrap_or_else(T::zero)]);
      let probs = self.graph.run(&[&input]).remove(0);
      class_id = sample(probs.param_iter().map(|p| p.to_f64().unwrap_or(0.0) ), rng)?;
      if class_id == end_class { break }
      let members = vocabulary.class_words(class_id);
      let member = sample(members.iter().map(|&id| vocabulary.membership_prob(id) ), rng)?;
      words.push(vocabulary.word(members[member]).to_string());
    }
    Ok(words)
  }
}

fn sample<R: Rng + ?Sized>(weights: impl Iterator<Item = f64>, rng: &mut R) -> Result<usize> {
  let distribution = WeightedIndex::new(weights)
    .map_err(|err| Error::Number(format!("Cannot sample from distribution: {}", err)) )?;
  Ok(distribution.sample(rng))
}


#[cfg(test)]
mod tests {
  use super::*;
  use rand::{ SeedableRng, rngs::StdRng };
  use crate::{
    network::{ Activation, NetworkConfig },
    vocabulary::Vocabulary,
  };

  // With zero weights the output bias alone decides the next class
  fn network(bias: Vec<f64>) -> Network<f64> {
    let config = NetworkConfig { projection_dim: 1, hidden_dim: 1, hidden_layer: Activation::Tanh };
    let vocabulary = Vocabulary::from_words(&["a", "b"]);
    Network::from_parameters(config, vocabulary, vec![
      ("projection_W".to_string(), Tensor::zeros(&[5, 1])),
      ("hidden_W".to_string(), Tensor::zeros(&[1, 1])),
      ("hidden_b".to_string(), Tensor::zeros(&[1])),
      ("output_W".to_string(), Tensor::zeros(&[1, 5])),
      ("output_b".to_string(), Tensor::vec(&bias)),
    ]).unwrap()
  }

  #[test]
  fn max_length() {
    let network = network(vec![-100.0, -100.0, -100.0, 0.0, -100.0]);
    let generator = TextGenerator::new(&network);
    let words = generator.generate(4, &mut StdRng::seed_from_u64(0)).unwrap();
    assert_eq!(words, vec!["a", "a", "a", "a"]);
  }

  #[test]
  fn stops_at_sentence_end() {
    let network = network(vec![-100.0, 0.0, -100.0, -100.0, -100.0]);
    let generator = TextGenerator::new(&network);
    let words = generator.generate(10, &mut StdRng::seed_from_u64(0)).unwrap();
    assert!(words.is_empty());
  }
}
