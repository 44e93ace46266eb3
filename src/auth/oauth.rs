use crate::auth::VerifierSource;
use crate::error::Error;
use log::info;
use reqwest_oauth1::{OAuthClientProvider, Secrets, TokenReaderFuture};

/// Platform OAuth1 endpoints. Defaults target Twitter; tests override.
pub struct Endpoints {
    pub request_token_url: String,
    pub authorize_url: String,
    pub access_token_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            request_token_url: "https://api.twitter.com/oauth/request_token".to_string(),
            authorize_url: "https://api.twitter.com/oauth/authorize".to_string(),
            access_token_url: "https://api.twitter.com/oauth/access_token".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct RequestToken {
    pub token: String,
    pub secret: String,
}

#[derive(Debug)]
pub struct AccessToken {
    pub token: String,
    pub secret: String,
}

/// Three-legged OAuth1 handshake: request token, user authorization via
/// a [`VerifierSource`], access-token exchange. Strictly linear; any
/// failed leg aborts the run.
pub struct TokenExchange {
    consumer_key: String,
    consumer_secret: String,
    endpoints: Endpoints,
}

impl TokenExchange {
    pub fn new(consumer_key: String, consumer_secret: String) -> Self {
        Self::with_endpoints(consumer_key, consumer_secret, Endpoints::default())
    }

    pub fn with_endpoints(
        consumer_key: String,
        consumer_secret: String,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            consumer_key,
            consumer_secret,
            endpoints,
        }
    }

    pub async fn run(&self, source: &impl VerifierSource) -> Result<AccessToken, Error> {
        info!("[AUTH] Starting access token fetch process");
        let request_token = self.request_token().await?;
        info!("[AUTH] Successfully fetched request token");

        let authorize_url = self.authorize_url(&request_token);
        info!("[AUTH] Generated authorization URL");

        let verifier = source
            .obtain(&authorize_url)
            .await
            .ok_or_else(|| Error::Auth("verifier code unavailable".to_string()))?;

        info!("[AUTH] Exchanging verifier for access token");
        let access_token = self.access_token(&request_token, &verifier).await?;
        info!("[AUTH] Successfully obtained access tokens");
        Ok(access_token)
    }

    pub async fn request_token(&self) -> Result<RequestToken, Error> {
        let secrets = Secrets::new(self.consumer_key.as_str(), self.consumer_secret.as_str());
        let response = reqwest::Client::new()
            .oauth1(secrets)
            .post(&self.endpoints.request_token_url)
            .query(&[("oauth_callback", "oob"), ("x_auth_access_type", "write")])
            .send()
            .parse_oauth_token()
            .await
            .map_err(|e| Error::Auth(format!("request token exchange failed: {e}")))?;

        Ok(RequestToken {
            token: response.oauth_token,
            secret: response.oauth_token_secret,
        })
    }

    pub fn authorize_url(&self, request_token: &RequestToken) -> String {
        format!(
            "{}?oauth_token={}",
            self.endpoints.authorize_url, request_token.token
        )
    }

    pub async fn access_token(
        &self,
        request_token: &RequestToken,
        verifier: &str,
    ) -> Result<AccessToken, Error> {
        let secrets = Secrets::new(self.consumer_key.as_str(), self.consumer_secret.as_str())
            .token(request_token.token.as_str(), request_token.secret.as_str());
        let response = reqwest::Client::new()
            .oauth1(secrets)
            .post(&self.endpoints.access_token_url)
            .query(&[("oauth_verifier", verifier)])
            .send()
            .parse_oauth_token()
            .await
            .map_err(|e| Error::Auth(format!("access token exchange failed: {e}")))?;

        Ok(AccessToken {
            token: response.oauth_token,
            secret: response.oauth_token_secret,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::oneshot_http;
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };
    use tokio::net::TcpListener;

    const TOKEN_BODY: &str = "oauth_token=T1&oauth_token_secret=S1&oauth_callback_confirmed=true";

    #[tokio::test]
    async fn authorization_url_embeds_the_request_token() {
        let base = oneshot_http(
            "200 OK",
            "application/x-www-form-urlencoded",
            TOKEN_BODY,
        )
        .await;

        let exchange = TokenExchange::with_endpoints(
            "ck".to_string(),
            "cs".to_string(),
            Endpoints {
                request_token_url: format!("{base}/oauth/request_token"),
                authorize_url: "https://example.com/oauth/authorize".to_string(),
                access_token_url: "https://example.com/oauth/access_token".to_string(),
            },
        );

        let request_token = exchange.request_token().await.unwrap();
        assert_eq!(request_token.token, "T1");
        assert_eq!(request_token.secret, "S1");
        assert!(exchange
            .authorize_url(&request_token)
            .contains("oauth_token=T1"));
    }

    struct NoVerifier;

    impl VerifierSource for NoVerifier {
        async fn obtain(&self, _authorize_url: &str) -> Option<String> {
            None
        }
    }

    #[tokio::test]
    async fn missing_verifier_fails_before_the_access_token_exchange() {
        let base = oneshot_http(
            "200 OK",
            "application/x-www-form-urlencoded",
            TOKEN_BODY,
        )
        .await;

        // Bound but never expected to see a connection.
        let access_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let access_addr = access_listener.local_addr().unwrap();
        let contacted = Arc::new(AtomicBool::new(false));
        {
            let contacted = contacted.clone();
            tokio::spawn(async move {
                if access_listener.accept().await.is_ok() {
                    contacted.store(true, Ordering::SeqCst);
                }
            });
        }

        let exchange = TokenExchange::with_endpoints(
            "ck".to_string(),
            "cs".to_string(),
            Endpoints {
                request_token_url: format!("{base}/oauth/request_token"),
                authorize_url: "https://example.com/oauth/authorize".to_string(),
                access_token_url: format!("http://{access_addr}/oauth/access_token"),
            },
        );

        let err = exchange.run(&NoVerifier).await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
        assert!(err.to_string().contains("verifier"));
        assert!(!contacted.load(Ordering::SeqCst));
    }
}
