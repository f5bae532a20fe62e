use approx::assert_relative_eq;
use rand::{ SeedableRng, rngs::StdRng };

use microlm::{
  network::Activation,
  ops::*,
  Batch, BatchIterator, Error, Network, NetworkConfig, Tensor, TextGenerator, TextScorer, Vocabulary,
};


const VOCABULARY: &str = "\
the function 0.7
a function
cat noun 0.5
dog noun 0.3
mouse noun
sees verb
chases verb
";

const TEXT: &str = "\
the cat sees a dog
a mouse chases the cat

the dog sees a unicorn
";


fn vocabulary() -> Vocabulary {
  Vocabulary::from_reader(VOCABULARY.as_bytes()).unwrap()
}

fn network(hidden_layer: Activation, seed: u64) -> Network<f64> {
  let config = NetworkConfig { projection_dim: 5, hidden_dim: 4, hidden_layer };
  Network::new(config, vocabulary(), &mut StdRng::seed_from_u64(seed)).unwrap()
}

fn encode(vocabulary: &Vocabulary, line: &str) -> (Vec<usize>, Vec<f64>) {
  let word_ids = vocabulary.encode(line);
  (
    word_ids.iter().map(|&id| vocabulary.word_class(id) ).collect(),
    word_ids.iter().map(|&id| vocabulary.membership_prob(id) ).collect(),
  )
}


#[test]
fn sequence_scores_add_up_to_perplexity() {
  for hidden_layer in [Activation::Tanh, Activation::Glu] {
    let network = network(hidden_layer, 3);
    let vocabulary = network.vocabulary();
    let scorer = TextScorer::new(&network, &[]);

    let mut total = 0.0;
    let mut num_words = 0;
    for line in TEXT.lines().filter(|line| !line.is_empty() ) {
      let (classes, membership) = encode(vocabulary, line);
      total += scorer.score_sequence(&classes, &membership).unwrap();
      num_words += classes.len() - 1;
    }
    let expected = (-total / num_words as f64).exp();

    for batch_size in [1, 2, 5] {
      let batches = BatchIterator::new(TEXT.lines(), vocabulary, batch_size);
      let perplexity = scorer.compute_perplexity(batches).unwrap();
      assert_relative_eq!(perplexity, expected, max_relative = 1e-9);
    }
  }
}

#[test]
fn padding_does_not_change_scores() {
  let network = network(Activation::Tanh, 8);
  let vocabulary = network.vocabulary();
  let scorer = TextScorer::new(&network, &[]);

  let batch: Batch<f64> = BatchIterator::new(["the cat sees a dog", "a dog"], vocabulary, 2)
    .next()
    .unwrap();
  let logprobs = scorer.score_batch(&batch.word_ids, &batch.membership_probs, &batch.mask).unwrap();
  assert_eq!(logprobs[0].len(), 6);
  assert_eq!(logprobs[1].len(), 3);

  let (classes, membership) = encode(vocabulary, "a dog");
  let single = scorer.score_sequence(&classes, &membership).unwrap();
  assert_relative_eq!(single, logprobs[1].iter().sum::<f64>(), max_relative = 1e-9);
}

#[test]
fn ignore_unknown_words() {
  let network = network(Activation::Tanh, 1);
  let vocabulary = network.vocabulary();
  let unk_class = vocabulary.word_class(vocabulary.unk_id());
  let scorer = TextScorer::new(&network, &[unk_class]);

  let mut batches: BatchIterator<f64, _> = BatchIterator::new(["the unicorn sees a dog"], vocabulary, 4);
  let batch = batches.next().unwrap();
  assert_eq!(batches.unknown_words(), 1);
  let logprobs = scorer.score_batch(&batch.word_ids, &batch.membership_probs, &batch.mask).unwrap();
  assert_eq!(logprobs[0].len(), 5);
}

#[test]
fn empty_text() {
  let network = network(Activation::Tanh, 1);
  let scorer = TextScorer::new(&network, &[]);
  let batches = BatchIterator::new(["", "   "], network.vocabulary(), 4);
  assert!(matches!(scorer.compute_perplexity(batches), Err(Error::NoWords)));
}

#[test]
fn changing_batch_shapes() {
  let network = network(Activation::Glu, 2);
  let scorer = TextScorer::new(&network, &[]);
  let vocabulary = network.vocabulary();
  let (classes, membership) = encode(vocabulary, "the cat");
  let before = scorer.score_sequence(&classes, &membership).unwrap();

  let long: Batch<f64> = BatchIterator::new(TEXT.lines(), vocabulary, 8).next().unwrap();
  scorer.score_batch(&long.word_ids, &long.membership_probs, &long.mask).unwrap();

  let after = scorer.score_sequence(&classes, &membership).unwrap();
  assert_eq!(before, after);
}

#[test]
fn save_and_load() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("model.bin");

  let network = network(Activation::Glu, 5);
  network.save(&path).unwrap();
  let loaded: Network<f64> = Network::load(&path).unwrap();

  assert_eq!(loaded.config(), network.config());
  assert_eq!(loaded.vocabulary(), network.vocabulary());
  assert_eq!(loaded.params().tensors(), network.params().tensors());

  let (classes, membership) = encode(network.vocabulary(), "a cat chases the mouse");
  let original = TextScorer::new(&network, &[]).score_sequence(&classes, &membership).unwrap();
  let restored = TextScorer::new(&loaded, &[]).score_sequence(&classes, &membership).unwrap();
  assert_eq!(original, restored);
}

#[test]
fn load_garbage() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("model.bin");
  std::fs::write(&path, [0xffu8; 3]).unwrap();
  assert!(matches!(Network::<f32>::load(&path), Err(Error::Decode(_))));
  assert!(matches!(Network::<f32>::load(dir.path().join("missing")), Err(Error::Io(_))));
}

#[test]
fn config_file() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("config.json");
  std::fs::write(&path, r#"{ "projection_dim": 7, "hidden_layer": "glu" }"#).unwrap();
  let config = NetworkConfig::load(&path).unwrap();
  assert_eq!(config, NetworkConfig { projection_dim: 7, hidden_dim: 300, hidden_layer: Activation::Glu });

  std::fs::write(&path, r#"{ "hidden_layer": "relu" }"#).unwrap();
  assert!(matches!(NetworkConfig::load(&path), Err(Error::Config(_))));
}

#[test]
fn generated_words_are_in_vocabulary() {
  let network = network(Activation::Tanh, 4);
  let generator = TextGenerator::new(&network);
  let mut rng = StdRng::seed_from_u64(11);
  for _ in 0..5 {
    let words = generator.generate(12, &mut rng).unwrap();
    assert!(words.len() <= 12);
    for word in words {
      assert!(network.vocabulary().word_id(&word).is_some());
      assert_ne!(word, "</s>");
    }
  }
}

#[test]
fn prediction_probs_shape() {
  let network = network(Activation::Tanh, 6);
  let input = network.minibatch_input();
  input.assign(&Tensor::new(&[4,3], vec![0.0; 12]));
  network.prediction_probs().forward();
  assert_eq!(network.prediction_probs().shape().dims, vec![3,3]);
}
