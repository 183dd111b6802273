//! 核心错误处理模块
//!
//! 每个错误都标注失败所在的阶段，仓储自身不做任何重试。

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;

/// PostgreSQL 唯一约束冲突的 SQLSTATE
const UNIQUE_VIOLATION: &str = "23505";

/// 打开仓储失败
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("invalid repository configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("database unreachable: {0}")]
    Unreachable(#[source] sqlx::Error),
}

/// 写路径阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    Validation,
    Begin,
    HeaderInsert,
    LineItemLoad,
    Commit,
}

impl fmt::Display for WriteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriteStage::Validation => "validation",
            WriteStage::Begin => "begin transaction",
            WriteStage::HeaderInsert => "header insert",
            WriteStage::LineItemLoad => "line item load",
            WriteStage::Commit => "commit",
        };
        f.write_str(name)
    }
}

/// 写入订单失败；任何变体出现时事务都已回滚
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("order {order_id} rejected: {source}")]
    Invalid {
        order_id: String,
        #[source]
        source: validator::ValidationErrors,
    },
    #[error("order {order_id}: {stage} failed: {source}")]
    Storage {
        order_id: String,
        stage: WriteStage,
        #[source]
        source: sqlx::Error,
    },
    #[error("order {order_id}: write timed out after {timeout:?}")]
    TimedOut { order_id: String, timeout: Duration },
}

impl WriteError {
    pub(crate) fn storage(order_id: &str, stage: WriteStage) -> impl FnOnce(sqlx::Error) -> Self + '_ {
        move |source| WriteError::Storage {
            order_id: order_id.to_string(),
            stage,
            source,
        }
    }

    pub fn order_id(&self) -> &str {
        match self {
            WriteError::Invalid { order_id, .. }
            | WriteError::Storage { order_id, .. }
            | WriteError::TimedOut { order_id, .. } => order_id,
        }
    }

    /// 失败阶段；超时无法确定具体阶段
    pub fn stage(&self) -> Option<WriteStage> {
        match self {
            WriteError::Invalid { .. } => Some(WriteStage::Validation),
            WriteError::Storage { stage, .. } => Some(*stage),
            WriteError::TimedOut { .. } => None,
        }
    }

    /// 是否因订单 ID 或明细主键重复而失败
    pub fn is_unique_violation(&self) -> bool {
        match self {
            WriteError::Storage { source, .. } => source
                .as_database_error()
                .and_then(|e| e.code())
                .is_some_and(|code| code == UNIQUE_VIOLATION),
            _ => false,
        }
    }
}

/// 读路径阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStage {
    Query,
    Decode,
}

impl fmt::Display for ReadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadStage::Query => f.write_str("query"),
            ReadStage::Decode => f.write_str("row decode"),
        }
    }
}

/// 读取订单失败；已累积的部分结果一律丢弃
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("orders of account {account_id}: {stage} failed: {source}")]
    Storage {
        account_id: String,
        stage: ReadStage,
        #[source]
        source: sqlx::Error,
    },
    #[error("orders of account {account_id}: read timed out after {timeout:?}")]
    TimedOut { account_id: String, timeout: Duration },
}

impl ReadError {
    pub(crate) fn storage(account_id: &str, stage: ReadStage) -> impl FnOnce(sqlx::Error) -> Self + '_ {
        move |source| ReadError::Storage {
            account_id: account_id.to_string(),
            stage,
            source,
        }
    }

    pub fn stage(&self) -> Option<ReadStage> {
        match self {
            ReadError::Storage { stage, .. } => Some(*stage),
            ReadError::TimedOut { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_error_names_stage() {
        let err = WriteError::storage("o-1", WriteStage::LineItemLoad)(sqlx::Error::PoolClosed);
        assert_eq!(err.stage(), Some(WriteStage::LineItemLoad));
        assert_eq!(err.order_id(), "o-1");
        assert!(err.to_string().starts_with("order o-1: line item load failed:"));
        assert!(!err.is_unique_violation());
    }

    #[test]
    fn test_timeout_has_no_stage() {
        let err = WriteError::TimedOut {
            order_id: "o-2".to_string(),
            timeout: Duration::from_secs(3),
        };
        assert_eq!(err.stage(), None);
        assert_eq!(err.to_string(), "order o-2: write timed out after 3s");
    }

    #[test]
    fn test_read_error_names_stage() {
        let err = ReadError::storage("acc-9", ReadStage::Decode)(sqlx::Error::RowNotFound);
        assert_eq!(err.stage(), Some(ReadStage::Decode));
        assert!(err.to_string().contains("row decode failed"));
    }

    #[test]
    fn test_connection_error_from_config() {
        let err: ConnectionError = ConfigError::Validation("数据库地址不能为空".to_string()).into();
        assert!(matches!(err, ConnectionError::InvalidConfig(_)));
    }
}
