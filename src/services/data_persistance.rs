use sqlx::{Acquire, PgPool};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    dal::{product_db, search_run_db},
    domain::{product::ProductRecord, search_task::SearchTask},
};

/// Outcome of one search task, ready for the sink. Provenance rides on
/// the task; records are written against it.
pub enum PersistantData {
    Result {
        task: SearchTask,
        products: Vec<ProductRecord>,
    },
    NoResult {
        task: SearchTask,
    },
}

pub async fn data_persistance_handler(
    mut data_receiver: UnboundedReceiver<PersistantData>,
    pool: PgPool,
) {
    log::info!("Started data persistance handler");

    while let Some(data) = data_receiver.recv().await {
        let mut pool_con = match pool.acquire().await {
            Ok(pool_con) => pool_con,
            Err(e) => {
                log::error!("Pool timed out: {:?}", e);
                continue;
            }
        };
        let con = match pool_con.acquire().await {
            Ok(con) => con,
            Err(e) => {
                log::error!("Failed to checkout connection from pool: {:?}", e);
                continue;
            }
        };

        match data {
            PersistantData::NoResult { task } => {
                if let Err(e) = search_run_db::insert_search_run(con, &task, 0, false).await {
                    log::error!("Error inserting empty search run in db: {:?}", e);
                }
            }
            PersistantData::Result { task, products } => {
                let run_id =
                    match search_run_db::insert_search_run(con, &task, products.len(), true).await
                    {
                        Ok(run_id) => run_id,
                        Err(e) => {
                            log::error!("Error inserting search run in db: {:?}", e);
                            continue;
                        }
                    };

                let total = products.len();
                for product in products {
                    if let Err(e) = product_db::insert_product(con, run_id, &task, &product).await
                    {
                        log::error!(
                            "Error inserting product {} in db: {:?}",
                            product.product_id,
                            e
                        );
                    }
                }

                log::info!("Persisted {} products for query: {}", total, task.query);
            }
        }
    }
}
