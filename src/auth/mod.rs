pub mod browser;
pub mod oauth;

pub use browser::BrowserVerifier;
pub use oauth::TokenExchange;

/// Turns an authorization URL into an OAuth verifier code. `None` means
/// no verifier could be obtained; the token exchange converts that into
/// an authentication error. The browser driver is the production
/// provider, but the exchange never depends on UI automation directly.
pub trait VerifierSource {
    async fn obtain(&self, authorize_url: &str) -> Option<String>;
}
