//! Service layer
//!
//! 短码生成、链接创建/解析，以及点击统计。

mod analytics_service;
pub mod id_generator;
mod link_service;

pub use analytics_service::*;
pub use id_generator::IdGenerator;
pub use link_service::*;
