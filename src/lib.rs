//! chronograph: a time-series computation engine built around a directed
//! acyclic graph of lazily-defined operators.
//!
//! Users compose [`node::Node`]s (sums, means, lags, alignments, EMAs,
//! window statistics, covariance) via the constructors in [`operator`];
//! [`scheduler::evaluate`] walks the resulting DAG over a half-open
//! interval `[t_start, t_end)` and materialises the requested node's
//! output as an ordered [`block::Block`] of `(time, value)` pairs.
//!
//! ```
//! use chronograph::operator::{arithmetic, source};
//! use chronograph::scheduler::evaluate;
//! use chronograph::timestamp::Timestamp;
//!
//! let x = source::pulse(1, 1.0).unwrap();
//! let y = source::pulse(1, 2.0).unwrap();
//! let sum = arithmetic::add(x, y).unwrap();
//! let out = evaluate(&sum, Timestamp::from_millis(0), Timestamp::from_millis(3)).unwrap();
//! assert_eq!(out.len(), 3);
//! ```

pub mod alignment;
pub mod block;
pub mod config;
pub mod error;
pub mod graph;
pub mod identity;
pub mod maybe;
pub mod node;
pub mod operator;
pub mod scheduler;
pub mod timestamp;
pub mod value;

pub use block::Block;
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use identity::obtain_node;
pub use maybe::Maybe;
pub use node::{Node, NodeId};
pub use scheduler::{evaluate, evaluate_with_config, value_type};
pub use timestamp::Timestamp;
pub use value::{Value, ValueKind};
