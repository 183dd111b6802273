//! 订单数据模型

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 订单聚合：订单头及其全部明细
///
/// 校验规则只在 `validate_orders` 开启时由仓储执行。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Order {
    pub id: String,
    pub account_id: String,
    pub created_at: DateTime<Utc>,
    /// 以 MONEY 存储，保留两位小数
    pub total_price: Decimal,
    #[validate(length(min = 1, message = "order must contain at least one product"), nested)]
    pub products: Vec<OrderedProduct>,
}

/// 订单明细，没有独立的生命周期
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct OrderedProduct {
    pub id: String,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: u32,
}

impl Order {
    /// 创建新订单，分配 UUID 并以微秒精度（与存储一致）记录创建时间
    pub fn new(
        account_id: impl Into<String>,
        total_price: Decimal,
        products: Vec<OrderedProduct>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            account_id: account_id.into(),
            created_at: Utc::now().trunc_subsecs(6),
            total_price,
            products,
        }
    }
}

impl OrderedProduct {
    pub fn new(id: impl Into<String>, quantity: u32) -> Self {
        Self {
            id: id.into(),
            quantity,
        }
    }
}
