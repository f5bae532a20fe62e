use log::{ debug, trace };

use crate::{
  batch::Batch,
  error::{ Error, Result },
  network::Network,
  ops::*,
  scalar::Real,
  variable::Graph,
  Tensor,
};


/// Scores text with a [Network] language model.
///
/// A compiled [Graph] takes class IDs and a mask, both indexed by time
/// step and sequence, and returns the log probability the network
/// assigns to every word that has a predecessor. Positions that are
/// masked out, or whose class is ignored, come out as zero and are
/// skipped when sequences get collected.

#[derive(Debug)]
pub struct TextScorer<T: Real> {
  graph: Graph<T>,
}

impl<T: Real> TextScorer<T> {
  pub fn new(network: &Network<T>, classes_to_ignore: &[usize]) -> Self {
    let input = network.minibatch_input();
    let mask = network.minibatch_mask();
    let targets = input.range(&[1..-1]);

    // Only time steps with a valid target word count
    let mut target_mask = mask.range(&[1..-1]);
    for &class_id in classes_to_ignore {
      let class_id = T::from(class_id).unwrap_or_else(T::nan);
      target_mask = target_mask * targets.not_equal(class_id);
    }
    let logprobs = network.prediction_probs().log() * &target_mask;

    debug!("Compiling scorer ignoring classes {:?}", classes_to_ignore);
    let graph = Graph::new(&[input.clone(), mask.clone()], &[logprobs, target_mask]);
    Self { graph }
  }

  /// Log probabilities of the words of each sequence in a mini-batch.
  ///
  /// All three inputs are indexed by time step and sequence. The network
  /// log probability of each word is combined with the log probability of
  /// the word within its class. The first word of each sequence is only
  /// conditioned on, so every list is one shorter than its sequence.
  /// The membership probability used at output step `t` is the one of
  /// the predicted word, found at time step `t + 1` of `membership_probs`.

  pub fn score_batch(&self, word_ids: &Tensor<usize>, membership_probs: &Tensor<T>, mask: &Tensor<T>) -> Result<Vec<Vec<T>>> {
    let logprobs = self.logprobs(word_ids, membership_probs, mask);
    for seq_logprobs in &logprobs {
      if seq_logprobs.iter().copied().sum::<T>().is_nan() {
        return Err(Error::Number("Sequence logprob has NaN value.".to_string()))
      }
    }
    trace!("Scored batch of {} sequences", logprobs.len());
    Ok(logprobs)
  }

  /// Perplexity of all text in `batches`.

  pub fn compute_perplexity<I: IntoIterator<Item = Batch<T>>>(&self, batches: I) -> Result<T> {
    let mut total_logprob = T::zero();
    let mut num_words = 0;
    for batch in batches {
      let logprobs = self.score_batch(&batch.word_ids, &batch.membership_probs, &batch.mask)?;
      for seq_logprobs in logprobs {
        total_logprob += seq_logprobs.iter().copied().sum::<T>();
        num_words += seq_logprobs.len();
      }
    }
    if num_words == 0 { return Err(Error::NoWords) }
    let num_words = T::from(num_words).unwrap_or_else(T::infinity);
    let cross_entropy = -total_logprob / num_words;
    Ok(cross_entropy.exp())
  }

  /// Log probability of a single sentence, given the class ID and the
  /// class membership probability of each of its words.

  pub fn score_sequence(&self, word_ids: &[usize], membership_probs: &[T]) -> Result<T> {
    assert_eq!(word_ids.len(), membership_probs.len(),
      "Got {} words but {} membership probabilities", word_ids.len(), membership_probs.len());
    let dims = [word_ids.len(), 1];
    let logprobs = self.logprobs(
      &Tensor::new(&dims, word_ids.to_vec()),
      &Tensor::new(&dims, membership_probs.to_vec()),
      &Tensor::ones(&dims),
    );
    let logprob: T = logprobs.iter().flatten().copied().sum();
    if logprob.is_nan() {
      return Err(Error::Number("Sentence logprob has NaN value.".to_string()))
    }
    Ok(logprob)
  }

  fn logprobs(&self, word_ids: &Tensor<usize>, membership_probs: &Tensor<T>, mask: &Tensor<T>) -> Vec<Vec<T>> {
    let outputs = self.graph.run(&[&word_ids.cast::<T>(), mask]);
    let logprobs = &outputs[0] + &membership_probs.range(&[1..-1]).log();
    let target_mask = &outputs[1];
    let threshold = T::one() / (T::one() + T::one());
    logprobs.iter(1)
      .zip(target_mask.iter(1))
      .map(|(seq_logprobs, seq_mask)| seq_logprobs.param_iter()
        .zip(seq_mask.param_iter())
        .filter(|&(_, m)| m >= threshold )
        .map(|(logprob, _)| logprob )
        .collect())
      .collect()
  }
}
