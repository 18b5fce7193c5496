//! Job Runner - 单次任务入口
//!
//! 从 JSON 读取一个任务，分发到对应的 command/query handler，
//! 返回统一的 `{status, message, data}` 结果。

mod dto;
mod runner;

pub use dto::{JobRequest, JobResponse};
pub use runner::JobRunner;
