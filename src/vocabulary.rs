use std::collections::HashMap;
use std::fs::File;
use std::io::{ BufRead, BufReader };
use std::path::Path;

use log::debug;
use serde::{ Serialize, Deserialize };

use crate::error::{ Error, Result };


pub const SENTENCE_START: &str = "<s>";
pub const SENTENCE_END: &str = "</s>";
pub const UNKNOWN: &str = "<unk>";


/// Mapping from words to the softmax classes the network predicts.
///
/// Each word belongs to exactly one class and carries the probability
/// of the word given its class. Sentence markers and the unknown word
/// token are always present, each in a class of its own.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
  words: Vec<String>,
  ids: HashMap<String, usize>,
  word_classes: Vec<usize>,
  membership: Vec<f64>,
  classes: Vec<Vec<usize>>,
}

impl Vocabulary {
  /// Every word in a class of its own.

  pub fn from_words<S: AsRef<str>>(words: &[S]) -> Self {
    let mut builder = Builder::default();
    for word in words {
      builder.add(word.as_ref(), None, None);
    }
    builder.finish()
  }

  /// Read one entry per line: `word [class [probability]]`.
  ///
  /// Words that share a class name end up in the same class. Words without
  /// a probability share whatever mass their class has left evenly.

  pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
    let mut builder = Builder::default();
    for (i, line) in reader.lines().enumerate() {
      let line = line?;
      let fields: Vec<&str> = line.split_whitespace().collect();
      let invalid = |message: &str| Error::Vocabulary { line: i + 1, message: message.to_string() };
      match fields.as_slice() {
        [] => continue,
        [word] => builder.add(word, None, None),
        [word, class] => builder.add(word, Some(*class), None),
        [word, class, prob] => {
          let prob: f64 = prob.parse()
            .map_err(|_| invalid(&format!("{:?} is not a probability", prob)) )?;
          if !(0.0..=1.0).contains(&prob) {
            return Err(invalid(&format!("probability {} outside of [0, 1]", prob)))
          }
          builder.add(word, Some(*class), Some(prob))
        },
        _ => return Err(invalid("expected at most three fields")),
      };
      if builder.duplicate {
        return Err(invalid(&format!("word {:?} listed twice", fields[0])))
      }
    }
    let vocabulary = builder.finish();
    debug!("Read vocabulary of {} words in {} classes", vocabulary.len(), vocabulary.num_classes());
    Ok(vocabulary)
  }

  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
    Self::from_reader(BufReader::new(File::open(path)?))
  }

  /// Number of words, including the special tokens.

  pub fn len(&self) -> usize {
    self.words.len()
  }

  pub fn is_empty(&self) -> bool {
    self.words.is_empty()
  }

  pub fn num_classes(&self) -> usize {
    self.classes.len()
  }

  pub fn word_id(&self, word: &str) -> Option<usize> {
    self.ids.get(word).copied()
  }

  pub fn word(&self, id: usize) -> &str {
    &self.words[id]
  }

  pub fn word_class(&self, id: usize) -> usize {
    self.word_classes[id]
  }

  /// Probability of a word given its class.

  pub fn membership_prob(&self, id: usize) -> f64 {
    self.membership[id]
  }

  pub fn class_words(&self, class_id: usize) -> &[usize] {
    &self.classes[class_id]
  }

  pub fn sentence_start_id(&self) -> usize {
    self.ids[SENTENCE_START]
  }

  pub fn sentence_end_id(&self) -> usize {
    self.ids[SENTENCE_END]
  }

  pub fn unk_id(&self) -> usize {
    self.ids[UNKNOWN]
  }

  /// Word IDs of a line of text wrapped in sentence markers.
  /// Words missing from the vocabulary map to `<unk>`.

  pub fn encode(&self, line: &str) -> Vec<usize> {
    let unk = self.unk_id();
    std::iter::once(self.sentence_start_id())
      .chain(line.split_whitespace().map(|word| self.word_id(word).unwrap_or(unk) ))
      .chain(std::iter::once(self.sentence_end_id()))
      .collect()
  }
}


#[derive(Default)]
struct Builder {
  words: Vec<String>,
  ids: HashMap<String, usize>,
  word_classes: Vec<usize>,
  membership: Vec<Option<f64>>,
  class_names: HashMap<String, usize>,
  num_classes: usize,
  duplicate: bool,
}

impl Builder {
  fn add(&mut self, word: &str, class: Option<&str>, prob: Option<f64>) {
    if self.words.is_empty() {
      for special in [SENTENCE_START, SENTENCE_END, UNKNOWN] {
        self.push(special, None, Some(1.0));
      }
    }
    if [SENTENCE_START, SENTENCE_END, UNKNOWN].contains(&word) { return }
    self.duplicate = self.ids.contains_key(word);
    if !self.duplicate {
      self.push(word, class, prob);
    }
  }

  fn push(&mut self, word: &str, class: Option<&str>, prob: Option<f64>) {
    let class_id = match class {
      Some(name) => match self.class_names.get(name) {
        Some(&id) => id,
        None => {
          self.class_names.insert(name.to_string(), self.num_classes);
          self.num_classes += 1;
          self.num_classes - 1
        },
      },
      None => {
        self.num_classes += 1;
        self.num_classes - 1
      },
    };
    self.ids.insert(word.to_string(), self.words.len());
    self.words.push(word.to_string());
    self.word_classes.push(class_id);
    self.membership.push(prob);
  }

  fn finish(mut self) -> Vocabulary {
    if self.words.is_empty() {
      self.add(SENTENCE_START, None, None);
    }
    let mut classes = vec![vec![]; self.num_classes];
    for (id, &class_id) in self.word_classes.iter().enumerate() {
      classes[class_id].push(id);
    }
    let mut membership = vec![0.0; self.words.len()];
    for members in &classes {
      let given: f64 = members.iter().filter_map(|&id| self.membership[id] ).sum();
      let missing = members.iter().filter(|&&id| self.membership[id].is_none() ).count();
      let share = (1.0 - given).max(0.0) / missing.max(1) as f64;
      for &id in members {
        membership[id] = self.membership[id].unwrap_or(share);
      }
    }
    Vocabulary {
      words: self.words,
      ids: self.ids,
      word_classes: self.word_classes,
      membership,
      classes,
    }
  }
}
