//! 基础设施层

pub mod copy;
pub mod database;
pub mod logger;
