pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod events;
pub mod favorite_repo;
pub mod memory;
pub mod redis_repo;
pub mod show_repo;

pub use database::DbClient;
pub use events::EventProducer;
pub use redis_repo::RedisClient;
