use std::marker::PhantomData;

use log::warn;

use crate::{
  ops::BaseOps,
  scalar::Real,
  vocabulary::{ Vocabulary, UNKNOWN },
  Tensor,
};


/// Mini-batch of sentences, indexed by time step and sequence.
///
/// `word_ids` hold the softmax class of each word, which is what the
/// network predicts. Positions past the end of a sentence are padded
/// with class 0, membership 1 and mask 0.

#[derive(Debug, Clone)]
pub struct Batch<T: Real> {
  pub word_ids: Tensor<usize>,
  pub membership_probs: Tensor<T>,
  pub mask: Tensor<T>,
}

impl<T: Real> Batch<T> {
  /// Pack encoded sentences (vocabulary word IDs) side by side.

  pub fn new(sequences: &[Vec<usize>], vocabulary: &Vocabulary) -> Self {
    let num_steps = sequences.iter().map(|seq| seq.len() ).max().unwrap_or(0);
    let num_sequences = sequences.len();
    let mut word_ids = vec![0; num_steps * num_sequences];
    let mut membership_probs = vec![T::one(); num_steps * num_sequences];
    let mut mask = vec![T::zero(); num_steps * num_sequences];
    for (s, sequence) in sequences.iter().enumerate() {
      for (t, &word) in sequence.iter().enumerate() {
        let i = t * num_sequences + s;
        word_ids[i] = vocabulary.word_class(word);
        membership_probs[i] = T::from(vocabulary.membership_prob(word)).unwrap_or_else(T::zero);
        mask[i] = T::one();
      }
    }
    let dims = [num_steps, num_sequences];
    Self {
      word_ids: Tensor::new(&dims, word_ids),
      membership_probs: Tensor::new(&dims, membership_probs),
      mask: Tensor::new(&dims, mask),
    }
  }

  pub fn num_sequences(&self) -> usize {
    self.mask.shape().dims[1]
  }
}


/// Turns lines of text into [Batches](Batch) of up to `batch_size`
/// sentences. Empty lines are skipped.

pub struct BatchIterator<'a, T, L> {
  lines: L,
  vocabulary: &'a Vocabulary,
  batch_size: usize,
  unknown_words: usize,
  _marker: PhantomData<T>,
}

impl<'a, T, L, S> BatchIterator<'a, T, L>
where
  T: Real,
  L: Iterator<Item = S>,
  S: AsRef<str>,
{
  pub fn new<I: IntoIterator<IntoIter = L>>(lines: I, vocabulary: &'a Vocabulary, batch_size: usize) -> Self {
    assert!(batch_size > 0, "Batch size must be positive");
    Self {
      lines: lines.into_iter(),
      vocabulary,
      batch_size,
      unknown_words: 0,
      _marker: PhantomData,
    }
  }

  /// Number of words replaced by `<unk>` so far.

  pub fn unknown_words(&self) -> usize {
    self.unknown_words
  }
}

impl<T, L, S> Iterator for BatchIterator<'_, T, L>
where
  T: Real,
  L: Iterator<Item = S>,
  S: AsRef<str>,
{
  type Item = Batch<T>;

  fn next(&mut self) -> Option<Self::Item> {
    let unk = self.vocabulary.unk_id();
    let mut sequences = Vec::with_capacity(self.batch_size);
    for line in self.lines.by_ref() {
      let line = line.as_ref();
      if line.trim().is_empty() { continue }
      let sequence = self.vocabulary.encode(line);
      let unknown = sequence.iter().filter(|&&id| id == unk ).count();
      if unknown > 0 && self.unknown_words == 0 {
        warn!("Input contains words missing from the vocabulary, they are scored as {}", UNKNOWN);
      }
      self.unknown_words += unknown;
      sequences.push(sequence);
      if sequences.len() == self.batch_size { break }
    }
    if sequences.is_empty() { return None }
    Some(Batch::new(&sequences, self.vocabulary))
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn padding() {
    let vocab = Vocabulary::from_words(&["a", "b"]);
    let a = vocab.word_class(vocab.word_id("a").unwrap());
    let b = vocab.word_class(vocab.word_id("b").unwrap());
    let start = vocab.word_class(vocab.sentence_start_id());
    let end = vocab.word_class(vocab.sentence_end_id());

    let batch: Batch<f32> = BatchIterator::new(["a b", "b"], &vocab, 2).next().unwrap();
    assert_eq!(batch.word_ids, Tensor::new(&[4,2], vec![
      start, start,
      a, b,
      b, end,
      end, 0,
    ]));
    assert_eq!(batch.mask, Tensor::new(&[4,2], vec![
      1.0, 1.0,
      1.0, 1.0,
      1.0, 1.0,
      1.0, 0.0,
    ]));
    assert_eq!(batch.membership_probs, Tensor::ones(&[4,2]));
  }

  #[test]
  fn batch_sizes() {
    let vocab = Vocabulary::from_words(&["a"]);
    let lines = vec!["a", "", "a a", "a", "  "];
    let batches: Vec<Batch<f64>> = BatchIterator::new(lines, &vocab, 2).collect();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].num_sequences(), 2);
    assert_eq!(batches[0].mask.dim(0), 4);
    assert_eq!(batches[1].num_sequences(), 1);
    assert_eq!(batches[1].mask.dim(0), 3);
  }

  #[test]
  fn unknown_words() {
    let vocab = Vocabulary::from_words(&["a"]);
    let mut iter: BatchIterator<f32, _> = BatchIterator::new(["a x y", "z"], &vocab, 1);
    let batch = iter.next().unwrap();
    assert_eq!(batch.word_ids.at(&[2, 0]).item(), vocab.word_class(vocab.unk_id()));
    assert_eq!(iter.unknown_words(), 2);
    iter.next();
    assert_eq!(iter.unknown_words(), 3);
    assert!(iter.next().is_none());
  }
}
