//! Neural network language model scoring.
//! Tiny. CPU only. Single threaded.
//!
//! # Features
//!
//! - **Text scoring** — [TextScorer] computes per-word log probabilities,
//! sentence scores and corpus perplexity from a [Network] and the class
//! membership probabilities of the words.
//!
//! - **Class-based vocabulary** — The network predicts softmax classes.
//! Each [Vocabulary] word belongs to a class and carries its probability
//! within that class.
//!
//! - **Graph recycling** — All model computation is expressed in
//! symbolic [Variables](Variable), compiled once into a [Graph] and
//! re-run with new input data. Batch shapes may change from run to run.
//!
//! - **Zero-copy views** — Tensors may be sliced, reshaped, transposed and
//! broadcasted without copying any data in most situations.
//!
//! # Examples
//!
//! Perplexity of some text under a freshly initialized model:
//! ```
//! use microlm::{ Network, NetworkConfig, Vocabulary, TextScorer, BatchIterator };
//! use rand::{ SeedableRng, rngs::StdRng };
//!
//! let vocabulary = Vocabulary::from_words(&["hello", "world"]);
//! let config = NetworkConfig { projection_dim: 8, hidden_dim: 16, ..Default::default() };
//! let network: Network<f32> = Network::new(config, vocabulary, &mut StdRng::seed_from_u64(0)).unwrap();
//!
//! let scorer = TextScorer::new(&network, &[]);
//! let batches = BatchIterator::new(["hello world", "world"], network.vocabulary(), 16);
//! let perplexity = scorer.compute_perplexity(batches).unwrap();
//! assert!(perplexity > 1.0);
//! ```
//!
//! Symbolic expressions:
//! ```
//! use microlm::{ ops::*, Tensor, Graph };
//!
//! let x = Tensor::vec(&[1.0, 2.0]).tracked();
//! let y = (&x * &x).sum(0);
//! let square_norm = Graph::new(&[x], &[y]);
//!
//! let out = square_norm.run(&[&Tensor::vec(&[3.0, 4.0, 0.0])]);
//! assert_eq!(out[0].item(), 25.0);
//! ```
//!
//! # Optional features
//!
//! - `unsafe` *(default)* — Accelerated matrix math using [matrixmultiply] crate.

mod internal;
mod shape;
mod tensor;
mod variable;

pub mod ops;
pub mod scalar;
pub mod error;
pub mod matrix;
pub mod vocabulary;
pub mod batch;
pub mod network;
pub mod scorer;
pub mod generator;

pub use shape::Shape;
pub use tensor::Tensor;
pub use variable::{ Variable, Graph, UnaryOp, BinaryOp };
pub use error::{ Error, Result };
pub use vocabulary::Vocabulary;
pub use batch::{ Batch, BatchIterator };
pub use network::{ Network, NetworkConfig, OutputLayer };
pub use scorer::TextScorer;
pub use generator::TextGenerator;
