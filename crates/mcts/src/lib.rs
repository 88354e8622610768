//! Monte Carlo Tree Search for tagline construction.
//!
//! This crate searches the space of taglines by appending one word at a time.
//! The search talks to three external collaborators, defined as traits in
//! `tagline_core`: one proposes next words, one completes a partial tagline,
//! and one rates complete taglines on four axes.
//!
//! # Features
//!
//! - **UCB1 Selection**: Balances mean outcome against visit scarcity
//! - **Arena Tree**: Nodes referenced by index, no parent ownership cycles
//! - **Concurrent Ratings**: The four axis ratings of a simulation run in parallel
//! - **Replayable History**: Every node records its statistics per iteration
//! - **Observer Hook**: State transitions are reported to pluggable observers
//!
//! # Example
//!
//! ```
//! use tagline_mcts::{Mcts, MctsConfig, RandomRollout};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let description = "A platform that helps teams ship reliable software faster";
//! let rollout = RandomRollout::from_description(
//!     ChaCha8Rng::seed_from_u64(42),
//!     description,
//!     5,
//!     4,
//! );
//!
//! let config = MctsConfig::with_iterations(20);
//! let mut mcts = Mcts::new(config, description, &rollout, &rollout, &rollout).unwrap();
//!
//! let result = mcts.run().unwrap();
//! assert_eq!(result.root_visits, 20);
//! println!("Best tagline: {:?}", result.best.map(|b| b.tagline));
//!
//! // Persist the tree without parent links
//! let exported = mcts.tree().export();
//! assert_eq!(exported.root().visit_count, 20);
//! ```

pub mod config;
pub mod export;
mod node;
pub mod observer;
pub mod rollout;
pub mod search;
mod tree;

pub use config::MctsConfig;
pub use export::{ExportedNode, ExportedTree};
pub use node::{EvaluationRecord, HistoryEntry, NodeId, NodeStats, SequenceNode};
pub use observer::{SearchObserver, TracingObserver};
pub use rollout::RandomRollout;
pub use search::{BestTagline, IterationReport, Mcts, SearchResult};
pub use tree::{Ancestors, Tree};
