use std::time::Duration;

use async_trait::async_trait;
use thirtyfour::{By, WebDriver};
use tokio::time::Instant;

use crate::services::product_extractor::CARD_SELECTORS;

/// What the listing loader and retry shell see on a search results page.
///
/// One page handle, owned by one task. The live implementation wraps a
/// WebDriver session; tests script the same surface without a browser.
#[async_trait]
pub trait SearchPage {
    /// Polls until at least one product card is present, or `timeout` runs out.
    async fn wait_for_cards(&self, timeout: Duration) -> bool;
    async fn scroll_to_bottom(&self) -> anyhow::Result<()>;
    async fn scroll_to_top(&self) -> anyhow::Result<()>;
    /// Small up-then-down scroll to wake lazy-load observers that only
    /// fire on a direction change.
    async fn nudge(&self) -> anyhow::Result<()>;
    async fn measure(&self) -> anyhow::Result<StabilitySignal>;
    async fn reload(&self) -> anyhow::Result<()>;
    async fn page_source(&self) -> anyhow::Result<String>;
}

/// One observation of how much content the page currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StabilitySignal {
    pub height: u64,
    pub card_count: usize,
}

pub struct DriverPage {
    driver: WebDriver,
}

impl DriverPage {
    pub fn new(driver: WebDriver) -> Self {
        DriverPage { driver }
    }

    async fn count_cards(&self) -> usize {
        for selector in CARD_SELECTORS {
            if let Ok(elements) = self.driver.find_all(By::Css(*selector)).await {
                if !elements.is_empty() {
                    return elements.len();
                }
            }
        }
        0
    }
}

#[async_trait]
impl SearchPage for DriverPage {
    async fn wait_for_cards(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.count_cards().await > 0 {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }

    async fn scroll_to_bottom(&self) -> anyhow::Result<()> {
        self.driver
            .execute(
                "window.scrollTo(0, document.body.scrollHeight);",
                Vec::new(),
            )
            .await?;
        Ok(())
    }

    async fn scroll_to_top(&self) -> anyhow::Result<()> {
        self.driver.execute("window.scrollTo(0, 0);", Vec::new()).await?;
        Ok(())
    }

    async fn nudge(&self) -> anyhow::Result<()> {
        self.driver
            .execute("window.scrollBy(0, -400);", Vec::new())
            .await?;
        tokio::time::sleep(Duration::from_millis(300)).await;
        self.driver
            .execute("window.scrollBy(0, 400);", Vec::new())
            .await?;
        Ok(())
    }

    async fn measure(&self) -> anyhow::Result<StabilitySignal> {
        let ret = self
            .driver
            .execute("return document.body.scrollHeight;", Vec::new())
            .await?;
        let height = ret.json().as_u64().unwrap_or(0);
        let card_count = self.count_cards().await;

        Ok(StabilitySignal { height, card_count })
    }

    async fn reload(&self) -> anyhow::Result<()> {
        self.driver.refresh().await?;
        Ok(())
    }

    async fn page_source(&self) -> anyhow::Result<String> {
        Ok(self.driver.source().await?)
    }
}
