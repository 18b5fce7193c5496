//! Memory Layer - In-Memory State Management
//!
//! 进程内的单飞注册表，不做持久化

mod inflight_registry;

pub use inflight_registry::InFlightRegistry;
