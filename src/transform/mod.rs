mod create_element;

pub use create_element::CreateElementTransformer;

use crate::error::TransformError;

/// Converts embedded markup source into call-expression source.
///
/// Implementations must be deterministic and free of side effects: the
/// scanners call them speculatively and retry with other slices on failure.
pub trait CodeTransformer {
    fn transform(&self, source: &str) -> Result<String, TransformError>;
}

impl<F> CodeTransformer for F
where
    F: Fn(&str) -> Result<String, TransformError>,
{
    fn transform(&self, source: &str) -> Result<String, TransformError> {
        self(source)
    }
}
