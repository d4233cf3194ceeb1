pub mod app_state;
pub mod initialization;
pub mod middleware;
pub mod tracing;
