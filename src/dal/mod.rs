pub mod product_db;
pub mod search_run_db;
pub mod stat_db;
