use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::{product::ProductRecord, search_task::SearchTask};

pub async fn insert_product(
    con: &mut PgConnection,
    run_id: Uuid,
    task: &SearchTask,
    product: &ProductRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        insert into product
            (id, search_run_id, product_id, product_slug, name, image_url,
             current_price, original_price, discount_percentage, pack_size, rating,
             is_sponsored, is_out_of_stock, source_url, captured_at,
             search_query, search_url, platform_name, location_code)
        values
            ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(run_id)
    .bind(&product.product_id)
    .bind(&product.product_slug)
    .bind(&product.name)
    .bind(&product.image_url)
    .bind(product.current_price)
    .bind(product.original_price)
    .bind(product.discount_percentage.map(|d| d as i16))
    .bind(&product.pack_size)
    .bind(product.rating)
    .bind(product.is_sponsored)
    .bind(product.is_out_of_stock)
    .bind(&product.source_url)
    .bind(product.captured_at)
    .bind(&task.query)
    .bind(&task.search_url)
    .bind(&task.platform_name)
    .bind(&task.location_code)
    .execute(con)
    .await?;

    Ok(())
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ProductRow {
    pub product_id: String,
    pub product_slug: Option<String>,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub current_price: Option<f64>,
    pub original_price: Option<f64>,
    pub discount_percentage: Option<i16>,
    pub pack_size: Option<String>,
    pub rating: Option<f64>,
    pub is_sponsored: bool,
    pub is_out_of_stock: bool,
    pub source_url: String,
    pub captured_at: DateTime<Utc>,
    pub search_query: String,
    pub platform_name: String,
    pub location_code: String,
}

pub async fn get_recent_products(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<ProductRow>, sqlx::Error> {
    sqlx::query_as::<_, ProductRow>(
        r#"
        select
            product_id, product_slug, name, image_url,
            current_price, original_price, discount_percentage, pack_size, rating,
            is_sponsored, is_out_of_stock, source_url, captured_at,
            search_query, platform_name, location_code
        from
            product
        order by
            captured_at desc
        limit $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}
