use crate::auth::VerifierSource;
use anyhow::{anyhow, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use log::{error, info, warn};
use rand::Rng;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Bound on how long any single UI element gets to become available.
const ELEMENT_WAIT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Drives a real browser through the platform's login and authorization
/// pages to pick up the OAuth verifier code. The whole flow is brittle
/// by nature, so every failure collapses into `None` and the session is
/// torn down whatever happens.
pub struct BrowserVerifier {
    headless: bool,
    username: String,
    password: String,
    recovery_email: String,
}

impl BrowserVerifier {
    pub fn new(headless: bool, username: String, password: String, recovery_email: String) -> Self {
        Self {
            headless,
            username,
            password,
            recovery_email,
        }
    }

    async fn launch(&self) -> Result<(Browser, JoinHandle<()>)> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--disable-blink-features=AutomationControlled");
        if !self.headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });
        Ok((browser, handle))
    }

    async fn drive(&self, page: &Page) -> Result<String> {
        let sign_in = wait_for_css(page, "input[value='Sign In']").await?;
        info!("[BROWSER] Found sign in button, clicking...");
        pace().await;
        sign_in.click().await?;
        pace().await;

        let username_input = wait_for_css(page, "input[name='text']").await?;
        info!("[BROWSER] Entering username");
        username_input.type_str(&self.username).await?;
        pace().await;

        wait_for_xpath(page, "//span[text()='Next']/ancestor::button")
            .await?
            .click()
            .await?;
        info!("[BROWSER] Clicked next button");
        pace().await;

        if page
            .content()
            .await?
            .to_lowercase()
            .contains("unusual login activity")
        {
            warn!("[BROWSER] Detected unusual login activity check");
            info!("[BROWSER] Entering email verification");
            let email_input = wait_for_css(page, "input[name='text']").await?;
            email_input.type_str(&self.recovery_email).await?;
            email_input.press_key("Enter").await?;
            pace().await;
        }

        let password_input = wait_for_css(page, "input[name='password']").await?;
        info!("[BROWSER] Entering password");
        password_input.type_str(&self.password).await?;
        pace().await;

        wait_for_css(page, "button[data-testid='LoginForm_Login_Button']")
            .await?
            .click()
            .await?;
        info!("[BROWSER] Clicked login button");
        pace().await;

        wait_for_css(page, "input#allow").await?.click().await?;
        info!("[BROWSER] Clicked authorize button");
        pace().await;

        let verifier = wait_for_css(page, "code")
            .await?
            .inner_text()
            .await?
            .ok_or_else(|| anyhow!("verifier element had no text"))?;
        Ok(verifier.trim().to_string())
    }
}

impl VerifierSource for BrowserVerifier {
    async fn obtain(&self, authorize_url: &str) -> Option<String> {
        info!("[BROWSER] Starting verification process...");
        let (mut browser, handler) = match self.launch().await {
            Ok(launched) => launched,
            Err(e) => {
                error!("[BROWSER] Failed to launch browser: {e}");
                return None;
            }
        };

        let result = match browser.new_page(authorize_url).await {
            Ok(page) => {
                info!("[BROWSER] Navigated to authorization URL");
                pace().await;
                self.drive(&page).await
            }
            Err(e) => Err(anyhow::Error::new(e)),
        };

        // Tear the session down whether or not a verifier came back.
        info!("[BROWSER] Closing browser session");
        if let Err(e) = browser.close().await {
            warn!("[BROWSER] Failed to close browser cleanly: {e}");
        }
        let _ = handler.await;

        match result {
            Ok(verifier) => {
                info!("[BROWSER] Successfully retrieved verifier code");
                Some(verifier)
            }
            Err(e) => {
                error!("[BROWSER] Error getting verifier code: {e}");
                None
            }
        }
    }
}

/// Random 1-5 s pause between UI actions to look less like a script.
async fn pace() {
    let millis = rand::thread_rng().gen_range(1_000..5_000);
    sleep(Duration::from_millis(millis)).await;
}

async fn wait_for_css(page: &Page, selector: &str) -> Result<Element> {
    let deadline = tokio::time::Instant::now() + ELEMENT_WAIT;
    loop {
        if let Ok(element) = page.find_element(selector).await {
            return Ok(element);
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(anyhow!(
                "element `{selector}` did not appear within {ELEMENT_WAIT:?}"
            ));
        }
        sleep(POLL_INTERVAL).await;
    }
}

async fn wait_for_xpath(page: &Page, expression: &str) -> Result<Element> {
    let deadline = tokio::time::Instant::now() + ELEMENT_WAIT;
    loop {
        if let Ok(element) = page.find_xpath(expression).await {
            return Ok(element);
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(anyhow!(
                "element `{expression}` did not appear within {ELEMENT_WAIT:?}"
            ));
        }
        sleep(POLL_INTERVAL).await;
    }
}
