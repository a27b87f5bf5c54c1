//! Operator commands - CLI to workflow bridge

mod batches;
mod remote;
mod workflow;

pub use batches::*;
pub use remote::*;
pub use workflow::*;
