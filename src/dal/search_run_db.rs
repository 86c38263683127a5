use sqlx::PgConnection;
use uuid::Uuid;

use crate::domain::search_task::SearchTask;

pub async fn insert_search_run(
    con: &mut PgConnection,
    task: &SearchTask,
    records_found: usize,
    any_result: bool,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        insert into search_run
            (id, search_query, search_url, platform_name, location_code, records_found, any_result)
        values
            ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(id)
    .bind(&task.query)
    .bind(&task.search_url)
    .bind(&task.platform_name)
    .bind(&task.location_code)
    .bind(records_found as i32)
    .bind(any_result)
    .execute(con)
    .await?;

    Ok(id)
}
