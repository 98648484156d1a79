pub mod extractor;
pub mod sanitizer;

pub use extractor::{extract, AnalysisSet, DigitRecord};
pub use sanitizer::{sanitize, RawValue, SanitizedSequence, SanitizedValue};
