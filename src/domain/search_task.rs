use crate::configuration::ScraperSettings;

/// Everything one scrape of a search results page needs to know.
///
/// `set_location` is carried per task instead of a process-wide
/// "first request only" flag, so concurrently dispatched tasks don't
/// race on who performs the location-selection flow.
#[derive(Debug, Clone)]
pub struct SearchTask {
    pub query: String,
    pub search_url: String,
    pub platform_name: String,
    pub location_code: String,
    pub set_location: bool,
}

impl SearchTask {
    pub fn new(query: &str, set_location: bool, settings: &ScraperSettings) -> Self {
        SearchTask {
            query: query.to_string(),
            search_url: build_search_url(&settings.search_url_template, query),
            platform_name: settings.platform_name.clone(),
            location_code: settings.postal_code.clone(),
            set_location,
        }
    }
}

fn build_search_url(template: &str, query: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    template.replace("{query}", &encoded)
}

#[cfg(test)]
mod tests {
    use super::build_search_url;

    #[test]
    fn search_url_encodes_the_query() {
        let url = build_search_url("https://blinkit.com/s/?q={query}", "brown bread");
        assert_eq!(url, "https://blinkit.com/s/?q=brown+bread");
    }

    #[test]
    fn search_url_keeps_plain_queries_untouched() {
        let url = build_search_url("https://blinkit.com/s/?q={query}", "milk");
        assert_eq!(url, "https://blinkit.com/s/?q=milk");
    }
}
