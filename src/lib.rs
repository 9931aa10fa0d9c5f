pub mod accounts;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod export;
pub mod http_client;
pub mod inventory;
pub mod models;
pub mod navigation;
pub mod session;
pub mod stats;
pub mod storage;

#[cfg(feature = "grpc")]
pub mod middleware;
#[cfg(feature = "grpc")]
pub mod proto;
#[cfg(feature = "grpc")]
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
