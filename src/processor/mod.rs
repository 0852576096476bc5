pub mod aggregator;
pub mod filter_engine;
pub mod state_normalizer;

pub use aggregator::*;
pub use filter_engine::*;
pub use state_normalizer::*;
