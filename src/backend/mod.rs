pub mod http;

use crate::error::Result;
use crate::models::Track;

/// The aggregation backend the client depends on.
/// Provider adapters, licensing and audio proxying all live behind it.
pub trait Backend: Send + Sync {
    /// Searches every provider. `allow_metadata_only` is forwarded untouched.
    fn search(&self, query: &str, allow_metadata_only: bool) -> Result<Vec<Track>>;
    /// Exchanges a provider media URL for a backend-proxied one.
    fn resolve_stream(&self, url: &str, provider: &str) -> Result<String>;
    /// Downloads cover art bytes.
    fn fetch_cover(&self, url: &str) -> Result<Vec<u8>>;
}
