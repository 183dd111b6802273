//! # 订单仓储
//!
//! 订单服务的持久化层，提供：
//! - 订单头与订单明细的原子写入（明细通过 `COPY ... FROM STDIN` 批量加载）
//! - 按账户查询订单，并将扁平的 JOIN 结果还原为嵌套的订单聚合
//! - 仓储生命周期管理（连通性探测、关闭连接池）

pub mod app;
pub mod config;
pub mod core;
pub mod infrastructure;

pub use app::order::{Order, OrderedProduct, PostgresOrderRepository};
pub use config::{ConfigError, RepositoryConfig};
pub use crate::core::error::{ConnectionError, ReadError, ReadStage, WriteError, WriteStage};
pub use crate::core::repository::OrderRepository;
