pub mod db;
pub mod memory_store;
pub mod sea_orm_store;
pub mod store;
