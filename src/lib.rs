// Library for tests to access modules

pub mod agent_service;
pub mod aggregator;
pub mod cache_store;
pub mod config;
pub mod cookie_client;
pub mod error;
pub mod models;
pub mod refresh_worker;
pub mod routes;
pub mod version;
