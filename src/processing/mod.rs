pub mod chunker;
pub mod map_reduce;
pub mod normalizer;
pub mod prompts;

pub use chunker::{Chunk, Chunker};
pub use map_reduce::{MapReduceSummarizer, Summary, SummaryLevel};
pub use normalizer::TextNormalizer;
