use std::net::TcpListener;

use actix_web::{
    dev::Server,
    middleware::Logger,
    web::{self, Data},
    App, HttpServer,
};
use sqlx::PgPool;

use crate::{
    configuration::ScraperSettings,
    routes::{default_route, product_route, search_route, stat_route},
    services::SearchTaskSender,
};

pub fn run(
    listener: TcpListener,
    db_pool: PgPool,
    scraper_settings: ScraperSettings,
    search_task_sender: SearchTaskSender,
) -> Result<Server, std::io::Error> {
    let db_pool = web::Data::new(db_pool);
    let scraper_settings = Data::new(scraper_settings);
    let search_task_sender = Data::new(search_task_sender);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(default_route::default)
            .service(web::scope("/search").service(search_route::scrape_search))
            .service(web::scope("/product").service(product_route::recent_products))
            .service(web::scope("/stat").service(stat_route::scrape_stats))
            .app_data(db_pool.clone())
            .app_data(scraper_settings.clone())
            .app_data(search_task_sender.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
