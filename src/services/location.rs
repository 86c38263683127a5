use std::time::Duration;

use rand::Rng;
use thirtyfour::{error::WebDriverError, By, WebDriver};

const LOCATION_BAR_SELECTOR: &str =
    "div[class*='LocationBar__Container'], div[class*='LocationBar'], button[class*='location']";
const LOCATION_INPUT_SELECTOR: &str =
    "input[name='select-locality'], input[placeholder*='search delivery location']";
const FIRST_SUGGESTION_SELECTOR: &str =
    "div[class*='LocationSearchList'] > div, div[class*='address-suggestion']";

const SUGGESTION_WAIT: Duration = Duration::from_secs(5);
const MODAL_CLOSE_POLLS: u8 = 10;

/// One-time UI flow that pins the delivery location to a postal code:
/// open the picker, type the code, click the first suggestion, confirm
/// the modal closed.
///
/// Returns false on any failed step. The caller logs and carries on,
/// since a scrape with an unset location still yields usable records.
pub async fn set_delivery_location(driver: &WebDriver, postal_code: &str) -> bool {
    match run_location_flow(driver, postal_code).await {
        Ok(confirmed) => confirmed,
        Err(e) => {
            log::warn!(
                "Location selection failed for postal code {}: {:?}",
                postal_code,
                e
            );
            false
        }
    }
}

async fn run_location_flow(driver: &WebDriver, postal_code: &str) -> Result<bool, WebDriverError> {
    let Ok(location_bar) = driver.find(By::Css(LOCATION_BAR_SELECTOR)).await else {
        log::warn!("No location picker found on page");
        return Ok(false);
    };
    location_bar.click().await?;
    tokio::time::sleep(Duration::from_millis(800)).await;

    let Ok(input) = driver.find(By::Css(LOCATION_INPUT_SELECTOR)).await else {
        log::warn!("Location picker opened but no search input appeared");
        return Ok(false);
    };
    type_like_a_person(&input, postal_code).await?;

    tokio::time::sleep(SUGGESTION_WAIT).await;
    let Ok(suggestion) = driver.find(By::Css(FIRST_SUGGESTION_SELECTOR)).await else {
        log::warn!("No location suggestions for postal code {}", postal_code);
        return Ok(false);
    };
    suggestion.click().await?;

    // The modal disappearing is the only confirmation the site gives.
    for _ in 0..MODAL_CLOSE_POLLS {
        tokio::time::sleep(Duration::from_millis(500)).await;
        if driver.find(By::Css(LOCATION_INPUT_SELECTOR)).await.is_err() {
            log::info!("Delivery location set to {}", postal_code);
            return Ok(true);
        }
    }

    log::warn!("Location modal never closed after selecting a suggestion");
    Ok(false)
}

/// Types one character at a time with jittered delays; the suggestion
/// endpoint debounces on keystrokes and ignores pasted input.
async fn type_like_a_person(
    input: &thirtyfour::WebElement,
    text: &str,
) -> Result<(), WebDriverError> {
    for ch in text.chars() {
        input.send_keys(ch.to_string()).await?;
        let delay = rand::thread_rng().gen_range(60..140);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    Ok(())
}
