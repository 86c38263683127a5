pub mod data_persistance;
pub mod droid;
pub mod listing_loader;
pub mod listing_scraper;
pub mod location;
pub mod page;
pub mod product_extractor;

pub use data_persistance::*;
pub use droid::*;
pub use listing_loader::*;
pub use listing_scraper::*;
pub use location::*;
pub use page::*;
pub use product_extractor::*;
