use std::path::PathBuf;

use clap::{ Parser, Subcommand, ValueEnum };
use log::{ info, warn, LevelFilter };
use rand::{ SeedableRng, rngs::StdRng };

use microlm::{
  BatchIterator, Network, NetworkConfig, TextGenerator, TextScorer, Vocabulary, Result,
};


#[derive(Parser, Debug)]
#[command(author, version, about = "Score and sample text with a neural network language model")]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Create a model with freshly initialized weights
  Init {
    /// Model file to write
    output: PathBuf,
    /// Vocabulary file, one `word [class [probability]]` entry per line
    #[arg(long)]
    vocabulary: PathBuf,
    /// Network configuration in JSON
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 0)]
    seed: u64,
  },
  /// Compute perplexity or sentence scores of a text file
  Score {
    model: PathBuf,
    input: PathBuf,
    #[arg(long, value_enum, default_value_t = Output::Perplexity)]
    output: Output,
    /// Leave <unk> out of the scores
    #[arg(long)]
    ignore_unk: bool,
    #[arg(long, default_value_t = 16)]
    batch_size: usize,
  },
  /// Generate sentences
  Sample {
    model: PathBuf,
    #[arg(long, default_value_t = 10)]
    num: usize,
    #[arg(long, default_value_t = 30)]
    max_length: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
  },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Output {
  Perplexity,
  UtteranceScores,
}


fn main() {
  if let Err(e) = simple_logger::SimpleLogger::new()
    .with_level(LevelFilter::Info)
    .env()
    .init()
  {
    eprintln!("Failed to initialize logging: {}", e);
  }

  if let Err(e) = run(Cli::parse()) {
    eprintln!("Error: {}", e);
    std::process::exit(1);
  }
}

fn run(cli: Cli) -> Result<()> {
  match cli.command {
    Command::Init { output, vocabulary, config, seed } => {
      let vocabulary = Vocabulary::load(&vocabulary)?;
      let config = match config {
        Some(path) => NetworkConfig::load(path)?,
        None => NetworkConfig::default(),
      };
      info!("Initializing {:?} over {} words in {} classes",
        config, vocabulary.len(), vocabulary.num_classes());
      let network: Network<f32> = Network::new(config, vocabulary, &mut StdRng::seed_from_u64(seed))?;
      network.save(&output)?;
      info!("Wrote {}", output.display());
    },

    Command::Score { model, input, output, ignore_unk, batch_size } => {
      let network: Network<f32> = Network::load(&model)?;
      let vocabulary = network.vocabulary();
      let ignored = if ignore_unk {
        vec![vocabulary.word_class(vocabulary.unk_id())]
      } else {
        vec![]
      };
      let scorer = TextScorer::new(&network, &ignored);
      let text = std::fs::read_to_string(&input)?;
      match output {
        Output::Perplexity => {
          let mut batches = BatchIterator::new(text.lines(), vocabulary, batch_size);
          let perplexity = scorer.compute_perplexity(&mut batches)?;
          if batches.unknown_words() > 0 {
            warn!("{} words were missing from the vocabulary", batches.unknown_words());
          }
          info!("Perplexity of {}", input.display());
          println!("{}", perplexity);
        },
        Output::UtteranceScores => {
          for line in text.lines().filter(|line| !line.trim().is_empty() ) {
            let word_ids = vocabulary.encode(line);
            let classes: Vec<_> = word_ids.iter().map(|&id| vocabulary.word_class(id) ).collect();
            let membership: Vec<_> = word_ids.iter().map(|&id| vocabulary.membership_prob(id) as f32 ).collect();
            let logprob = scorer.score_sequence(&classes, &membership)?;
            println!("{}\t{}", logprob, line);
          }
        },
      }
    },

    Command::Sample { model, num, max_length, seed } => {
      let network: Network<f32> = Network::load(&model)?;
      let generator = TextGenerator::new(&network);
      let mut rng = StdRng::seed_from_u64(seed);
      for _ in 0..num {
        println!("{}", generator.generate(max_length, &mut rng)?.join(" "));
      }
    },
  }
  Ok(())
}
