use actix_web::{get, web, HttpResponse};
use sqlx::PgPool;

use crate::dal::stat_db;

#[get("")]
async fn scrape_stats(pool: web::Data<PgPool>) -> HttpResponse {
    match stat_db::get_scrape_stats(&pool).await {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(e) => {
            log::error!("Error fetching scrape stats: {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}
