pub mod api_types;
pub mod cache;
pub mod client;
pub mod error;
pub mod repository;
pub mod transform;
pub mod types;

pub use client::HttpRemote;
pub use error::FetchError;
pub use repository::Repository;
pub use transform::DailyOrder;
pub use types::DetailRecord;
