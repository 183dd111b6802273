//! 核心层：错误类型与仓储抽象

pub mod error;
pub mod repository;
