//! Visit counter library: a dual-backed counter (cache + durable log) and a
//! composite health aggregator behind a small HTTP surface.

pub mod backend;
pub mod config;
pub mod counter;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod node;
pub mod observability;

pub use config::schema::AppConfig;
pub use counter::DualBackedCounter;
pub use health::HealthAggregator;
pub use http::HttpServer;
pub use lifecycle::{AppContext, Shutdown};
