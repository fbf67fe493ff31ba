use crate::RcaResult;

/// Abstraction over the generative-text service.
///
/// Implementations return the raw completion text. An empty completion is an
/// error, so callers can treat `Ok` as usable output.
pub trait TextGenerator: Send + Sync {
    fn model_id(&self) -> &str;
    fn invoke(&self, prompt: &str) -> RcaResult<String>;
}
