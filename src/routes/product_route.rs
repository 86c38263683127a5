use actix_web::{get, web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

use crate::dal::product_db;

const DEFAULT_LIMIT: i64 = 100;

#[derive(Deserialize)]
struct RecentProductsQuery {
    limit: Option<i64>,
}

#[get("")]
async fn recent_products(
    body: web::Query<RecentProductsQuery>,
    pool: web::Data<PgPool>,
) -> HttpResponse {
    let limit = body.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 1000);

    match product_db::get_recent_products(&pool, limit).await {
        Ok(products) => HttpResponse::Ok().json(products),
        Err(e) => {
            log::error!("Error fetching recent products: {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}
