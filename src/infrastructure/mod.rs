//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod job;
pub mod memory;
pub mod persistence;

pub use job::{JobRequest, JobResponse, JobRunner};
pub use memory::InFlightRegistry;
pub use persistence::{FileAudioCache, FileCacheConfig};
