//! 订单领域：模型、行分组与 PostgreSQL 仓储

pub mod assembler;
pub mod model;
pub mod repository;

pub use model::{Order, OrderedProduct};
pub use repository::PostgresOrderRepository;
