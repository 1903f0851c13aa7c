mod label;
mod output;
mod span;

pub use label::Label;
pub use output::{
    Aggregate, CaseReport, EvalHeader, EvalReport, MaskOutput, Metrics,
    REDACTANT_OUTPUT_FORMAT_VERSION,
};
pub use span::{Provenance, Span, SpanError};
