use std::{net::TcpListener, time::Duration};

use env_logger::Env;
use kirana::{
    configuration::get_configuration,
    domain::search_task::SearchTask,
    services::{
        data_persistance_handler, listing_scraper_handler, PersistantData, SearchTaskSender,
    },
    startup::run,
};
use sqlx::postgres::PgPoolOptions;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().expect("Failed to read configuration.");

    let pool_options = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(15 * 60)) // 15 minutes
        .max_lifetime(None);

    let connection_pool = pool_options.connect_lazy_with(configuration.database.with_db());
    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(address)?;

    let (search_task_sender, search_task_receiver) = mpsc::unbounded_channel::<SearchTask>();
    let (persistant_data_sender, persistant_data_receiver) =
        mpsc::unbounded_channel::<PersistantData>();

    let search_task_sender = SearchTaskSender {
        sender: search_task_sender,
    };

    // Spawn backgound tasks
    let scraper_settings = configuration.scraper.clone();
    tokio::spawn(async move {
        listing_scraper_handler(search_task_receiver, persistant_data_sender, scraper_settings)
            .await
    });

    let pool_clone = connection_pool.clone();
    tokio::spawn(async move { data_persistance_handler(persistant_data_receiver, pool_clone).await });

    run(
        listener,
        connection_pool,
        configuration.scraper,
        search_task_sender,
    )?
    .await
}
