//! Graph algorithms
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod scc;
pub mod min_mean_cycle;
pub mod flow;

pub use self::min_mean_cycle::{MeanCycle, MinimumMeanCycle};
pub use self::scc::StronglyConnectedComponents;
