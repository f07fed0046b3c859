use crate::error::Result;
use async_trait::async_trait;

/// Outbound HTTP as seen by the API client and the geocoders.
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get(&self, url: &str, headers: &[(&'static str, String)]) -> Result<HttpGetResult>;
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl HttpGetResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Progress callback for long enrichment runs: `(done, total)`.
pub trait ProgressPort: Send + Sync {
    fn report(&self, done: usize, total: usize);
}

impl<F> ProgressPort for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn report(&self, done: usize, total: usize) {
        self(done, total)
    }
}
