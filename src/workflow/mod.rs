pub mod generation_flow;
pub mod session;

pub use generation_flow::{GenerationBatch, GenerationFlow};
pub use session::{SaveReport, Session};
