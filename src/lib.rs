pub mod app;
pub mod conf;
pub mod error;
pub mod es_client;
pub mod input;
pub mod models;
pub mod payload;
