use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::wd::{Capabilities, TimeoutConfiguration};
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use std::time::Duration;
use tokio::time::{Instant, sleep};

use crate::config::HarvestConfig;
use crate::error::HarvestError;
use crate::layout::{self, Candidate};
use crate::portal::{BookingPortal, PageSnapshot};
use crate::results::LookupRequest;

/// Common local WebDriver endpoints tried when the configured one is down
const FALLBACK_WEBDRIVER_URLS: [&str; 4] = [
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4444", // geckodriver / Selenium default
    "http://127.0.0.1:4444",
    "http://127.0.0.1:9515",
];

/// Hides the automation flag some sites check before serving content
const MASK_WEBDRIVER_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

/// Booking portal backed by a WebDriver browser session
pub struct WebPortal {
    client: Client,
    config: HarvestConfig,
}

impl WebPortal {
    /// Start a browser session
    pub async fn connect(config: &HarvestConfig) -> Result<Self, HarvestError> {
        let client = connect_to_webdriver(config).await?;
        let portal = Self {
            client,
            config: config.clone(),
        };
        portal.prepare_session().await?;
        Ok(portal)
    }

    /// Apply timeouts and mask the automation flag on a fresh session
    async fn prepare_session(&self) -> Result<(), HarvestError> {
        let timeouts =
            TimeoutConfiguration::new(None, Some(self.config.page_load_timeout()), None);
        self.client.update_timeouts(timeouts).await?;

        if let Err(e) = self.client.execute(MASK_WEBDRIVER_SCRIPT, vec![]).await {
            ::log::debug!("Could not mask webdriver flag: {}", e);
        }

        ::log::info!("WebDriver setup completed successfully");
        Ok(())
    }

    async fn navigate_to_lookup(&self) -> Result<(), HarvestError> {
        self.client.goto(&self.config.lookup_url).await?;
        self.client
            .wait()
            .at_most(self.config.element_timeout())
            .for_element(Locator::Css("body"))
            .await?;
        sleep(Duration::from_millis(self.config.settle_millis)).await;

        ::log::info!("Navigated to {}", self.config.lookup_url);
        Ok(())
    }

    /// First displayed and enabled element in the chain.
    ///
    /// The whole chain is retried until the element timeout so controls that
    /// render late are still found.
    async fn find_interactable(
        &self,
        chain: &[Candidate],
        what: &'static str,
        exclude: Option<&Element>,
    ) -> Result<Element, HarvestError> {
        let deadline = Instant::now() + self.config.element_timeout();
        let poll = Duration::from_millis(self.config.poll_interval_millis);

        loop {
            for candidate in chain {
                if let Some(element) = self.first_usable(candidate, exclude).await {
                    ::log::debug!("Found {} via {}", what, candidate);
                    return Ok(element);
                }
            }

            if Instant::now() >= deadline {
                ::log::error!("Could not find {} with any of {} selectors", what, chain.len());
                return Err(HarvestError::ElementNotFound(what));
            }
            sleep(poll).await;
        }
    }

    async fn first_usable(&self, candidate: &Candidate, exclude: Option<&Element>) -> Option<Element> {
        let elements = self.client.find_all(candidate.locator()).await.ok()?;

        for element in elements {
            if exclude.is_some_and(|other| other.element_id() == element.element_id()) {
                continue;
            }
            let displayed = element.is_displayed().await.unwrap_or(false);
            let enabled = element.is_enabled().await.unwrap_or(false);
            if displayed && enabled {
                return Some(element);
            }
        }
        None
    }

    async fn fill(element: &Element, value: &str) -> Result<(), HarvestError> {
        element.clear().await?;
        element.send_keys(value).await?;
        Ok(())
    }

    /// Click, falling back to a scripted click when something overlays the button
    async fn click(&self, element: &Element) -> Result<(), HarvestError> {
        let arg = serde_json::to_value(element)?;
        if let Err(e) = self
            .client
            .execute("arguments[0].scrollIntoView(true);", vec![arg.clone()])
            .await
        {
            ::log::debug!("Could not scroll button into view: {}", e);
        }
        sleep(Duration::from_millis(500)).await;

        if let Err(e) = element.click().await {
            ::log::warn!("Direct click failed ({}), clicking via script", e);
            self.client
                .execute("arguments[0].click();", vec![arg])
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl BookingPortal for WebPortal {
    async fn submit_lookup(&mut self, request: &LookupRequest) -> Result<(), HarvestError> {
        self.navigate_to_lookup().await?;

        let reference_input = self
            .find_interactable(layout::REFERENCE_INPUTS, "reference input", None)
            .await?;
        let surname_input = self
            .find_interactable(layout::SURNAME_INPUTS, "surname input", Some(&reference_input))
            .await?;

        Self::fill(&reference_input, &request.reference).await?;
        Self::fill(&surname_input, &request.surname).await?;
        ::log::info!(
            "Filled reference {} and surname {}",
            request.reference,
            request.surname
        );

        let button = self
            .find_interactable(layout::SUBMIT_BUTTONS, "Get Itinerary button", None)
            .await?;
        self.click(&button).await?;
        ::log::info!("Submitted lookup for {}", request.reference);

        sleep(Duration::from_millis(self.config.settle_millis)).await;
        Ok(())
    }

    async fn snapshot(&mut self) -> Result<PageSnapshot, HarvestError> {
        let url = self.client.current_url().await?;
        let html = self.client.source().await?;
        Ok(PageSnapshot::new(url.as_str(), html))
    }

    async fn reconnect(&mut self) -> Result<(), HarvestError> {
        ::log::warn!("Attempting to reconnect WebDriver session");
        let client = connect_to_webdriver(&self.config).await?;
        let stale = std::mem::replace(&mut self.client, client);
        if let Err(e) = stale.close().await {
            ::log::debug!("Stale session did not close cleanly: {}", e);
        }
        self.prepare_session().await?;
        ::log::info!("Successfully reconnected to WebDriver");
        Ok(())
    }

    async fn close(&mut self) -> Result<(), HarvestError> {
        self.client.clone().close().await?;
        ::log::info!("WebDriver closed");
        Ok(())
    }
}

/// Browser capabilities for Chrome and Firefox drivers
fn capabilities(config: &HarvestConfig) -> Capabilities {
    let mut chrome_args = vec![
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--disable-images".to_string(),
        "--disable-plugins".to_string(),
        "--disable-extensions".to_string(),
        "--disable-background-timer-throttling".to_string(),
        "--disable-backgrounding-occluded-windows".to_string(),
        "--disable-renderer-backgrounding".to_string(),
        "--disable-blink-features=AutomationControlled".to_string(),
        format!("--window-size={}", config.window_size),
        format!("--user-agent={}", config.user_agent),
    ];
    let mut firefox_args = Vec::new();
    if config.headless {
        chrome_args.push("--headless=new".to_string());
        firefox_args.push("-headless".to_string());
    }

    let mut caps = Capabilities::new();
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({
            "args": chrome_args,
            "prefs": {
                "profile.managed_default_content_settings.images": 2,
                "profile.default_content_settings.popups": 0,
                "profile.managed_default_content_settings.media_stream": 2,
            },
            "excludeSwitches": ["enable-automation"],
            "useAutomationExtension": false,
        }),
    );
    caps.insert(
        "moz:firefoxOptions".to_string(),
        json!({
            "args": firefox_args,
            "prefs": { "general.useragent.override": config.user_agent },
        }),
    );
    caps
}

/// Connects to the configured WebDriver, then to common local fallbacks
async fn connect_to_webdriver(config: &HarvestConfig) -> Result<Client, HarvestError> {
    let caps = capabilities(config);
    ::log::info!(
        "Running in {} mode",
        if config.headless { "headless" } else { "visible" }
    );

    let first_error = match ClientBuilder::native()
        .capabilities(caps.clone())
        .connect(&config.webdriver_url)
        .await
    {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", config.webdriver_url);
            return Ok(client);
        }
        Err(e) => {
            ::log::error!(
                "Failed to connect to WebDriver at {}: {}",
                config.webdriver_url,
                e
            );
            e
        }
    };

    for url in FALLBACK_WEBDRIVER_URLS {
        if url == config.webdriver_url {
            continue;
        }
        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = ClientBuilder::native()
            .capabilities(caps.clone())
            .connect(url)
            .await
        {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Ok(client);
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    Err(first_error.into())
}
