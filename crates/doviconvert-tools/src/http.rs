//! Shared HTTP client setup for the release feed and asset downloads.

use doviconvert_common::{Error, Result};
use reqwest::{Client, RequestBuilder};

/// Default base URL of the release feed.
pub const DEFAULT_RELEASE_API: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("doviconvert/", env!("CARGO_PKG_VERSION"));

/// Build the client used for every feed and download request.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::network("client", format!("failed to build HTTP client: {e}")))
}

/// Attach a bearer token from `GITHUB_TOKEN` or `GH_TOKEN` when present.
pub(crate) fn authorize(request: RequestBuilder) -> RequestBuilder {
    match std::env::var("GITHUB_TOKEN").or_else(|_| std::env::var("GH_TOKEN")) {
        Ok(token) if !token.is_empty() => request.bearer_auth(token),
        _ => request,
    }
}
