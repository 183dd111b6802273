//! 将按订单 ID 排序的扁平行流还原为订单聚合
//!
//! 分组依据是相邻行的订单 ID 是否变化，因此输入 **必须** 按订单 ID 排序，
//! 同一订单的行必须连续出现。查询端的 `ORDER BY o.id` 是这里正确性的前提，
//! 去掉它不会报错，只会把同一订单拆成多个聚合。

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::model::{Order, OrderedProduct};

/// 订单头 LEFT JOIN 订单明细得到的一行
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRow {
    pub order_id: String,
    pub account_id: String,
    pub created_at: DateTime<Utc>,
    pub total_price: Decimal,
    /// 没有明细的订单只有一行，且该字段为空
    pub product: Option<OrderedProduct>,
}

/// 单遍分组游标
#[derive(Debug, Default)]
pub struct OrderAssembler {
    current: Option<Order>,
    finished: Vec<Order>,
}

impl OrderAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: OrderRow) {
        let starts_new_order = self
            .current
            .as_ref()
            .map_or(true, |order| order.id != row.order_id);

        if starts_new_order {
            if let Some(order) = self.current.take() {
                self.finished.push(order);
            }
            self.current = Some(Order {
                id: row.order_id,
                account_id: row.account_id,
                created_at: row.created_at,
                total_price: row.total_price,
                products: Vec::new(),
            });
        }

        if let (Some(order), Some(product)) = (self.current.as_mut(), row.product) {
            order.products.push(product);
        }
    }

    /// 收尾：把最后一个订单放入结果
    pub fn finish(mut self) -> Vec<Order> {
        if let Some(order) = self.current.take() {
            self.finished.push(order);
        }
        self.finished
    }
}
