//! Markov Module: per-corpus character chains and their weighted fusion
//!
//! # Components
//! - `symbol.rs`: chain alphabet (START/END markers) and context keys
//! - `table.rs`: transition counts for one corpus
//! - `fusion.rs`: blended distributions and bounded generation
//! - `persist.rs`: JSON model files

pub mod fusion;
pub mod persist;
pub mod symbol;
pub mod table;

pub use fusion::{FusedDistribution, FusionWeights, MarkovFusion};
pub use symbol::{Context, Symbol};
pub use table::{Successors, TransitionTable};
