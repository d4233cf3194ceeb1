pub mod manifest;
pub mod repository;
pub mod service;
