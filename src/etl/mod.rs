pub mod extract;
pub mod load;
pub mod pipeline;
pub mod transform;

pub use extract::Extractor;
pub use load::Loader;
pub use pipeline::{Outcome, Pipeline, RunSummary};
pub use transform::Transformer;
