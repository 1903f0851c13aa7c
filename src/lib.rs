pub mod cli;
pub mod evaluate;
pub mod extractors;
pub mod masking;
pub mod models;
pub mod scoring;

pub use extractors::{PatternExtractor, SpanSource, extract_pattern_spans};
pub use masking::{MaskError, mask};
pub use models::{Label, MaskOutput, Metrics, Provenance, Span, SpanError};
pub use scoring::{build_found_typed, score_typed};
