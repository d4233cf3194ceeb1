pub mod repository;
pub mod service;
pub mod status_log;
