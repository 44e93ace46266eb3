pub mod auth;
pub mod clients;
pub mod core;
pub mod db;
pub mod error;

#[cfg(test)]
pub mod testutil;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use crate::auth::{BrowserVerifier, TokenExchange};
use crate::clients::twitter::twitter::{Client as TwitterClient, TwitterAuth};
use crate::core::generator::{self, Generator, RigModel};
use crate::core::persona::Persona;
use crate::core::require_env;
use crate::db::store::PostStore;
use dotenv::dotenv;
use fern::colors::ColoredLevelConfig;
use log::{error, info};
use rand::seq::SliceRandom;
use std::env;

const PERSONA_NAME: &str = "riley";
const POST_STORE_PATH: &str = "storage/posts.json";

#[tokio::main]
async fn main() {
    let colors = ColoredLevelConfig::new()
        .info(fern::colors::Color::BrightGreen)
        .error(fern::colors::Color::BrightRed)
        .warn(fern::colors::Color::BrightYellow);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} | {} | riley] {}",
                Utc.timestamp_millis(Utc::now().timestamp_millis())
                    .format("%H:%M:%S.%3f")
                    .to_string(),
                colors.color(record.level()),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stdout())
        .apply()
        .unwrap();

    // The one CLI flag: --debug runs the browser with a visible window.
    let headless = !env::args().any(|arg| arg == "--debug");

    dotenv().ok();

    if let Err(e) = run(headless).await {
        error!("[MAIN] Run aborted: {e}");
        std::process::exit(1);
    }
}

async fn run(headless: bool) -> Result<()> {
    info!("[MAIN] Fetching access tokens...");
    let username = require_env("TWITTER_USERNAME")?;
    let password = require_env("TWITTER_PASSWORD")?;
    let recovery_email = require_env("TWITTER_EMAIL")?;
    let consumer_key = require_env("CONSUMER_KEY")?;
    let consumer_secret = require_env("CONSUMER_SECRET")?;
    let anthropic_api_key = require_env("ANTHROPIC_API_KEY")?;

    let exchange = TokenExchange::new(consumer_key.clone(), consumer_secret.clone());
    let verifier_source = BrowserVerifier::new(headless, username, password, recovery_email);
    let access = exchange.run(&verifier_source).await?;

    info!("[MAIN] Initializing post generator...");
    let persona = Persona::load(PERSONA_NAME)?;
    let store = PostStore::load(POST_STORE_PATH)?;

    let (topic, phase) = {
        let mut rng = rand::thread_rng();
        let topic = generator::topics().choose(&mut rng).copied();
        let phase = persona.phases().choose(&mut rng).map(|p| p.to_string());
        (topic, phase)
    };

    info!(
        "[MAIN] Generating post content (topic: {:?}, phase: {:?})...",
        topic, phase
    );
    let model = RigModel::new(&anthropic_api_key);
    let mut generator = Generator::new(model, persona, store);
    let text = generator.generate(topic, phase.as_deref()).await?;

    info!("[MAIN] Posting to Twitter...");
    let client = TwitterClient::new(TwitterAuth {
        consumer_key,
        consumer_secret,
        access_token: access.token,
        access_token_secret: access.secret,
    });
    let response = client.publish(&text).await?;
    info!("[MAIN] Response received: {response}");

    Ok(())
}
