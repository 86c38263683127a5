use fake_user_agent::get_chrome_rua;
use thirtyfour::{error::WebDriverError, prelude::*, CapabilitiesHelper, Proxy};

use crate::configuration::ScraperSettings;

/// One Chrome session against the configured WebDriver endpoint. Each
/// search task gets its own Droid and quits it when done.
pub struct Droid {
    pub driver: WebDriver,
}

impl Droid {
    pub async fn new(settings: &ScraperSettings) -> Result<Self, WebDriverError> {
        let mut caps = DesiredCapabilities::chrome();
        if settings.headless {
            caps.add_arg("--headless=new")?;
        }
        caps.add_arg("--window-size=1920,1080")?;
        caps.add_arg(&format!("--user-agent={}", get_chrome_rua()))?;

        if let Some(proxy_url) = &settings.proxy_url {
            let proxy = Proxy::Manual {
                ftp_proxy: None,
                http_proxy: Some(proxy_url.clone()),
                ssl_proxy: Some(proxy_url.clone()),
                socks_proxy: None,
                socks_version: None,
                socks_username: None,
                socks_password: None,
                no_proxy: None,
            };
            caps.set_proxy(proxy)?;
        }

        let driver = WebDriver::new(&settings.webdriver_url, caps).await?;
        driver.maximize_window().await?;

        Ok(Droid { driver })
    }
}
