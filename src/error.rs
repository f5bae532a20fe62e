use thiserror::Error;


pub type Result<T> = std::result::Result<T, Error>;


#[derive(Debug, Error)]
pub enum Error {
  /// A log probability turned out to be NaN.
  #[error("{0}")]
  Number(String),

  #[error("Cannot compute perplexity without any words")]
  NoWords,

  #[error("Model has no parameter named {0}")]
  MissingParameter(String),

  #[error("Parameter {name} should have shape {expected:?}, got {found:?}")]
  Shape { name: String, expected: Vec<usize>, found: Vec<usize> },

  #[error("Expected a matrix of rank {expected}, got rank {found}")]
  Rank { expected: &'static str, found: usize },

  #[error("Invalid vocabulary entry on line {line}: {message}")]
  Vocabulary { line: usize, message: String },

  #[error(transparent)]
  Io(#[from] std::io::Error),

  #[error("Cannot decode model: {0}")]
  Decode(#[from] postcard::Error),

  #[error("Invalid network configuration: {0}")]
  Config(#[from] serde_json::Error),
}
