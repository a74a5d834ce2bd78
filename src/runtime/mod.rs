//! 应用装配与生命周期
//!
//! `AppContext` 是唯一的组装点：连接存储、创建缓存、构造各个服务并启动后台任务。

mod context;

pub use context::AppContext;
