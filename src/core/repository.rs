//! 核心仓储抽象

use async_trait::async_trait;

use crate::app::order::Order;
use crate::core::error::{ReadError, WriteError};

/// 订单仓储
///
/// 实现在打开后可被多个调用方并发使用，自身不持有需要加锁的可变状态。
/// 丢弃正在执行的 future 即取消该操作：未提交的写入会回滚，读取的部分结果被丢弃。
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// 关闭底层连接池，可重复调用
    async fn close(&self);

    /// 原子写入订单头及全部明细
    async fn put_order(&self, order: &Order) -> Result<(), WriteError>;

    /// 查询账户下的全部订单，按订单 ID 升序
    async fn get_orders_for_account(&self, account_id: &str) -> Result<Vec<Order>, ReadError>;
}
