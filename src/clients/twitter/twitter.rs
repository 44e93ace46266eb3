use crate::error::Error;
use log::info;
use reqwest::StatusCode;
use reqwest_oauth1::{OAuthClientProvider, Secrets};
use serde_json::{json, Value};

const POST_URL: &str = "https://api.twitter.com/2/tweets";

pub struct TwitterAuth {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

pub struct Client {
    auth: TwitterAuth,
    post_url: String,
}

impl Client {
    pub fn new(auth: TwitterAuth) -> Self {
        Self::with_post_url(auth, POST_URL.to_string())
    }

    pub fn with_post_url(auth: TwitterAuth, post_url: String) -> Self {
        Self { auth, post_url }
    }

    /// Sign and send the post. Exactly HTTP 201 counts as success and
    /// yields the decoded response body; any other status surfaces with
    /// its body verbatim.
    pub async fn publish(&self, text: &str) -> Result<Value, Error> {
        let secrets = Secrets::new(
            self.auth.consumer_key.as_str(),
            self.auth.consumer_secret.as_str(),
        )
        .token(
            self.auth.access_token.as_str(),
            self.auth.access_token_secret.as_str(),
        );

        let response = reqwest::Client::new()
            .oauth1(secrets)
            .post(&self.post_url)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("post request failed: {e}"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| anyhow::anyhow!("failed to read post response: {e}"))?;

        if status != StatusCode::CREATED {
            return Err(Error::Rejected { status, body });
        }

        let decoded = serde_json::from_str(&body)
            .map_err(|e| anyhow::anyhow!("post response was not valid JSON: {e}"))?;
        info!("[TWITTER] Successfully published post");
        Ok(decoded)
    }
}
