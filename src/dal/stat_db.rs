use serde::Serialize;
use sqlx::PgPool;

#[derive(Debug, Serialize)]
pub struct ScrapeStats {
    pub total_runs: i64,
    pub empty_runs: i64,
    pub total_products: i64,
}

pub async fn get_scrape_stats(pool: &PgPool) -> Result<ScrapeStats, sqlx::Error> {
    let total_runs = sqlx::query_scalar::<_, i64>("select count(*) from search_run")
        .fetch_one(pool)
        .await?;

    let empty_runs =
        sqlx::query_scalar::<_, i64>("select count(*) from search_run where any_result = false")
            .fetch_one(pool)
            .await?;

    let total_products = sqlx::query_scalar::<_, i64>("select count(*) from product")
        .fetch_one(pool)
        .await?;

    Ok(ScrapeStats {
        total_runs,
        empty_runs,
        total_products,
    })
}
