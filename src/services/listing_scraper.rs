use std::{collections::HashSet, time::Duration};

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::{
    configuration::ScraperSettings,
    domain::{product::ProductRecord, search_task::SearchTask},
    services::{
        data_persistance::PersistantData,
        droid::Droid,
        listing_loader::load_full_listing,
        location::set_delivery_location,
        page::{DriverPage, SearchPage},
        product_extractor::extract_products,
    },
};

const SET_RESET_LEN: usize = 10_000;
const CARD_WAIT: Duration = Duration::from_secs(10);

pub struct SearchTaskSender {
    pub sender: UnboundedSender<SearchTask>,
}

pub async fn listing_scraper_handler(
    mut task_receiver: UnboundedReceiver<SearchTask>,
    persistant_data_sender: UnboundedSender<PersistantData>,
    settings: ScraperSettings,
) {
    log::info!("Started listing scraper");
    let mut seen_queries = HashSet::new();

    while let Some(task) = task_receiver.recv().await {
        match seen_queries.contains(&task.query) {
            true => {}
            false => {
                // TODO: Implement time based reset like 10 mins after channel was empty
                if seen_queries.len() > SET_RESET_LEN {
                    seen_queries.clear();
                }
                seen_queries.insert(task.query.clone());
                tokio::spawn(scrape_search_task(
                    task,
                    persistant_data_sender.clone(),
                    settings.clone(),
                ));
            }
        }
    }
}

async fn scrape_search_task(
    task: SearchTask,
    persistant_data_sender: UnboundedSender<PersistantData>,
    settings: ScraperSettings,
) {
    log::info!("Scraping {} listing for query: {}", task.platform_name, task.query);

    let data = match run_search_task(&task, &settings).await {
        Ok(products) => match products.is_empty() {
            true => PersistantData::NoResult { task },
            false => PersistantData::Result { task, products },
        },
        Err(e) => {
            // Navigation/session failures are not a no-result: nothing
            // gets persisted and the failure surfaces in the task log.
            log::error!("Scrape task failed for query {}: {:?}", task.query, e);
            return;
        }
    };

    if let Err(e) = persistant_data_sender.send(data) {
        log::error!("Persistant data sender channel got an Error: {:?}", e);
    }
}

async fn run_search_task(
    task: &SearchTask,
    settings: &ScraperSettings,
) -> anyhow::Result<Vec<ProductRecord>> {
    let droid = Droid::new(settings).await?;
    let driver = droid.driver;

    let outcome = async {
        driver.goto(&task.search_url).await?;

        if task.set_location {
            if !set_delivery_location(&driver, &task.location_code).await {
                log::warn!(
                    "Continuing query {} with delivery location unset",
                    task.query
                );
            }
            // Location selection re-renders the listing; land on the
            // search results again before extracting.
            driver.goto(&task.search_url).await?;
        }

        let page = DriverPage::new(driver.clone());
        let mut products = load_listing_with_retries(&page, task, settings).await;
        products.truncate(settings.max_records_per_query);

        if products.is_empty() {
            let screenshot_path =
                std::env::temp_dir().join(format!("kirana-{}.png", task.query.replace(' ', "-")));
            match driver.screenshot(&screenshot_path).await {
                Ok(()) => log::info!("Saved empty-result screenshot to {:?}", screenshot_path),
                Err(e) => log::warn!("Failed to capture screenshot: {:?}", e),
            }
        }

        Ok(products)
    }
    .await;

    if let Err(e) = driver.quit().await {
        log::warn!("Failed to close browser session: {:?}", e);
    }

    outcome
}

/// Best-effort quality gate around the loader + extractor: when a pass
/// yields fewer than `min_records`, reload the page and try again, up to
/// `max_attempts` passes. The last extraction is returned even when it
/// is still short; content instability on the site can legitimately
/// yield fewer records than the minimum.
pub async fn load_listing_with_retries<P: SearchPage>(
    page: &P,
    task: &SearchTask,
    settings: &ScraperSettings,
) -> Vec<ProductRecord> {
    let settle = Duration::from_millis(settings.scroll_settle_millis);
    let mut products = vec![];

    for attempt in 1..=settings.max_attempts {
        if !page.wait_for_cards(CARD_WAIT).await {
            log::warn!(
                "No product cards appeared for query {} (attempt {})",
                task.query,
                attempt
            );
        }

        load_full_listing(page, settings.max_scroll_iterations, settle).await;

        let source = match page.page_source().await {
            Ok(source) => source,
            Err(e) => {
                log::warn!("Failed to read page source: {:?}", e);
                String::new()
            }
        };
        products = extract_products(&source, &task.search_url);

        if products.len() >= settings.min_records {
            log::info!(
                "Extracted {} products for query {} on attempt {}",
                products.len(),
                task.query,
                attempt
            );
            return products;
        }

        if attempt < settings.max_attempts {
            log::warn!(
                "Extracted {} products for query {} (minimum {}), reloading",
                products.len(),
                task.query,
                settings.min_records
            );
            if let Err(e) = page.reload().await {
                log::warn!("Page reload failed: {:?}", e);
            }
        }
    }

    products
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::load_listing_with_retries;
    use crate::configuration::ScraperSettings;
    use crate::domain::search_task::SearchTask;
    use crate::services::page::{SearchPage, StabilitySignal};

    fn test_settings() -> ScraperSettings {
        ScraperSettings {
            webdriver_url: "http://localhost:4444".to_string(),
            headless: true,
            proxy_url: None,
            platform_name: "blinkit".to_string(),
            search_url_template: "https://blinkit.com/s/?q={query}".to_string(),
            postal_code: "122003".to_string(),
            max_records_per_query: 200,
            max_scroll_iterations: 3,
            scroll_settle_millis: 0,
            max_attempts: 3,
            min_records: 5,
        }
    }

    fn test_task() -> SearchTask {
        SearchTask::new("milk", false, &test_settings())
    }

    /// A listing snapshot with `n` extractable product cards.
    fn snapshot_with_cards(n: usize) -> String {
        let cards: String = (0..n)
            .map(|i| {
                format!(
                    r#"<div data-test-id="plp-product">
                      <a href="/prn/item-{i}/prid/{id}">
                        <div class="Product__UpdatedTitle-sc-1q">Item {i}</div>
                        <span>₹{price}</span>
                      </a>
                    </div>"#,
                    i = i,
                    id = 1000 + i,
                    price = 10 + i,
                )
            })
            .collect();
        format!(r#"<html><body><div id="plpContainer">{}</div></body></html>"#, cards)
    }

    /// Serves one scripted snapshot per attempt and counts reloads.
    struct ScriptedPage {
        snapshots: Vec<String>,
        source_reads: AtomicUsize,
        reloads: AtomicUsize,
    }

    impl ScriptedPage {
        fn new(card_counts: &[usize]) -> Self {
            ScriptedPage {
                snapshots: card_counts.iter().map(|&n| snapshot_with_cards(n)).collect(),
                source_reads: AtomicUsize::new(0),
                reloads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SearchPage for ScriptedPage {
        async fn wait_for_cards(&self, _timeout: Duration) -> bool {
            true
        }

        async fn scroll_to_bottom(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn scroll_to_top(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn nudge(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn measure(&self) -> anyhow::Result<StabilitySignal> {
            // Constant signal: the loader settles after three reads.
            Ok(StabilitySignal {
                height: 2000,
                card_count: 10,
            })
        }

        async fn reload(&self) -> anyhow::Result<()> {
            self.reloads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn page_source(&self) -> anyhow::Result<String> {
            let index = self.source_reads.fetch_add(1, Ordering::SeqCst);
            let snapshot = self
                .snapshots
                .get(index)
                .or_else(|| self.snapshots.last())
                .cloned()
                .unwrap_or_default();
            Ok(snapshot)
        }
    }

    #[tokio::test]
    async fn retries_until_minimum_record_count_is_reached() {
        let page = ScriptedPage::new(&[2, 3, 6]);

        let products = load_listing_with_retries(&page, &test_task(), &test_settings()).await;

        assert_eq!(products.len(), 6);
        assert_eq!(page.reloads.load(Ordering::SeqCst), 2);
        assert_eq!(page.source_reads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn returns_short_result_once_attempts_are_exhausted() {
        let page = ScriptedPage::new(&[2, 3, 4]);

        let products = load_listing_with_retries(&page, &test_task(), &test_settings()).await;

        assert_eq!(products.len(), 4);
        assert_eq!(page.reloads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_extraction_stops_after_exactly_three_attempts() {
        let page = ScriptedPage::new(&[0, 0, 0]);

        let products = load_listing_with_retries(&page, &test_task(), &test_settings()).await;

        assert!(products.is_empty());
        assert_eq!(page.source_reads.load(Ordering::SeqCst), 3);
        assert_eq!(page.reloads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn first_attempt_meeting_the_minimum_skips_reloads() {
        let page = ScriptedPage::new(&[8]);

        let products = load_listing_with_retries(&page, &test_task(), &test_settings()).await;

        assert_eq!(products.len(), 8);
        assert_eq!(page.reloads.load(Ordering::SeqCst), 0);
        assert_eq!(page.source_reads.load(Ordering::SeqCst), 1);
    }
}
