use actix_web::{get, web, HttpResponse};
use serde::Deserialize;

use crate::{
    configuration::ScraperSettings,
    domain::search_task::SearchTask,
    services::SearchTaskSender,
};

#[derive(Deserialize)]
struct ScrapeSearchQuery {
    /// Comma separated search terms, e.g. `queries=milk,brown bread`.
    queries: String,
    /// Run the location-selection flow before scraping. Defaults to true;
    /// pass false when the session is known to already have a location.
    set_location: Option<bool>,
}

#[get("")]
async fn scrape_search(
    body: web::Query<ScrapeSearchQuery>,
    task_sender: web::Data<SearchTaskSender>,
    settings: web::Data<ScraperSettings>,
) -> HttpResponse {
    let set_location = body.set_location.unwrap_or(true);

    let queries: Vec<&str> = body
        .queries
        .split(',')
        .map(|q| q.trim())
        .filter(|q| !q.is_empty())
        .collect();

    if queries.is_empty() {
        return HttpResponse::BadRequest().body("No search queries provided");
    }

    let total = queries.len();
    for query in queries {
        let task = SearchTask::new(query, set_location, &settings);
        if let Err(e) = task_sender.sender.send(task) {
            log::error!("Found error while sending: {:?}", e);
            return HttpResponse::InternalServerError().body("Scraper pipeline is down");
        }
    }

    HttpResponse::Ok().body(format!("Queued {} search queries", total))
}
