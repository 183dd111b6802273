//! PostgreSQL 订单仓储

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::postgres::{PgConnection, PgCopyIn, PgPool, PgRow};
use sqlx::Row;
use std::ops::DerefMut;
use std::time::Duration;
use tracing::{debug, info, warn};
use validator::Validate;

use super::assembler::{OrderAssembler, OrderRow};
use super::model::{Order, OrderedProduct};
use crate::config::RepositoryConfig;
use crate::core::error::{ConnectionError, ReadError, ReadStage, WriteError, WriteStage};
use crate::core::repository::OrderRepository;
use crate::infrastructure::copy::CopyTextEncoder;
use crate::infrastructure::database::DatabaseManager;

const INSERT_ORDER_SQL: &str = r#"
    INSERT INTO orders (id, created_at, account_id, total_price)
    VALUES ($1, $2, $3, $4::numeric::money)
"#;

const COPY_ORDER_PRODUCTS_SQL: &str =
    "COPY order_products (order_id, product_id, quantity) FROM STDIN";

// 分组依赖 ORDER BY o.id，不能去掉
const SELECT_ORDERS_FOR_ACCOUNT_SQL: &str = r#"
    SELECT o.id, o.created_at, o.account_id, o.total_price::numeric AS total_price,
           op.product_id, op.quantity
    FROM orders o
    LEFT JOIN order_products op ON o.id = op.order_id
    WHERE o.account_id = $1
    ORDER BY o.id, op.product_id
"#;

#[derive(Clone, Debug)]
pub struct PostgresOrderRepository {
    db: DatabaseManager,
    copy_chunk_bytes: usize,
    validate_orders: bool,
    operation_timeout: Option<Duration>,
}

impl PostgresOrderRepository {
    /// 打开仓储：建立连接池并探测连通性
    pub async fn open(config: &RepositoryConfig) -> Result<Self, ConnectionError> {
        let db = DatabaseManager::connect(config).await?;
        info!("Order repository opened");

        Ok(Self {
            db,
            copy_chunk_bytes: config.copy_chunk_bytes,
            validate_orders: config.validate_orders,
            operation_timeout: config.operation_timeout(),
        })
    }

    /// 使用默认连接池参数打开
    pub async fn connect(database_url: &str) -> Result<Self, ConnectionError> {
        Self::open(&RepositoryConfig::with_url(database_url)).await
    }

    pub fn pool(&self) -> &PgPool {
        self.db.get_pool()
    }

    pub fn is_closed(&self) -> bool {
        self.db.is_closed()
    }

    async fn write_order(&self, order: &Order) -> Result<(), WriteError> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(WriteError::storage(&order.id, WriteStage::Begin))?;

        if let Err(err) = self.write_rows(&mut tx, order).await {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(order_id = %order.id, error = %rollback_err, "Rollback failed");
            }
            return Err(err);
        }

        tx.commit()
            .await
            .map_err(WriteError::storage(&order.id, WriteStage::Commit))?;

        debug!(
            order_id = %order.id,
            line_items = order.products.len(),
            "Order committed"
        );
        Ok(())
    }

    async fn write_rows(&self, conn: &mut PgConnection, order: &Order) -> Result<(), WriteError> {
        sqlx::query(INSERT_ORDER_SQL)
            .bind(&order.id)
            .bind(order.created_at)
            .bind(&order.account_id)
            .bind(order.total_price)
            .execute(&mut *conn)
            .await
            .map_err(WriteError::storage(&order.id, WriteStage::HeaderInsert))?;

        if order.products.is_empty() {
            debug!(order_id = %order.id, "No line items to load");
            return Ok(());
        }

        let load_failed = || WriteError::storage(&order.id, WriteStage::LineItemLoad);

        let mut copy = conn
            .copy_in_raw(COPY_ORDER_PRODUCTS_SQL)
            .await
            .map_err(load_failed())?;

        if let Err(err) = send_line_items(&mut copy, order, self.copy_chunk_bytes).await {
            if let Err(abort_err) = copy.abort("line item load failed").await {
                debug!(order_id = %order.id, error = %abort_err, "COPY abort reported an error");
            }
            return Err(load_failed()(err));
        }

        let loaded = copy.finish().await.map_err(load_failed())?;
        debug!(order_id = %order.id, rows = loaded, "Line items loaded");
        Ok(())
    }

    async fn read_orders(&self, account_id: &str) -> Result<Vec<Order>, ReadError> {
        let mut rows = sqlx::query(SELECT_ORDERS_FOR_ACCOUNT_SQL)
            .bind(account_id)
            .fetch(self.pool());

        let mut assembler = OrderAssembler::new();
        while let Some(row) = rows
            .try_next()
            .await
            .map_err(ReadError::storage(account_id, ReadStage::Query))?
        {
            let row = decode_row(&row).map_err(ReadError::storage(account_id, ReadStage::Decode))?;
            assembler.push(row);
        }

        let orders = assembler.finish();
        debug!(account_id, orders = orders.len(), "Orders loaded");
        Ok(orders)
    }
}

/// 把全部明细编码后分块写入 COPY 通道
async fn send_line_items<C>(
    copy: &mut PgCopyIn<C>,
    order: &Order,
    chunk_bytes: usize,
) -> Result<(), sqlx::Error>
where
    C: DerefMut<Target = PgConnection>,
{
    let mut encoder = CopyTextEncoder::new(chunk_bytes);

    for product in &order.products {
        let quantity = product.quantity.to_string();
        if let Some(chunk) =
            encoder.push_row(&[Some(&order.id), Some(&product.id), Some(&quantity)])
        {
            copy.send(chunk).await?;
        }
    }

    debug!(order_id = %order.id, rows = encoder.rows(), "Line items encoded");
    if let Some(rest) = encoder.finish() {
        copy.send(rest).await?;
    }
    Ok(())
}

fn decode_row(row: &PgRow) -> Result<OrderRow, sqlx::Error> {
    let product_id: Option<String> = row.try_get("product_id")?;
    let quantity: Option<i32> = row.try_get("quantity")?;

    let product = match (product_id, quantity) {
        (Some(id), Some(quantity)) => {
            let quantity = u32::try_from(quantity).map_err(|e| sqlx::Error::ColumnDecode {
                index: "quantity".to_string(),
                source: Box::new(e),
            })?;
            Some(OrderedProduct { id, quantity })
        }
        (None, None) => None,
        _ => {
            return Err(sqlx::Error::ColumnDecode {
                index: "product_id".to_string(),
                source: "line item without product id or quantity".into(),
            })
        }
    };

    Ok(OrderRow {
        order_id: row.try_get("id")?,
        account_id: row.try_get("account_id")?,
        created_at: row.try_get("created_at")?,
        total_price: row.try_get("total_price")?,
        product,
    })
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn close(&self) {
        if !self.db.is_closed() {
            info!("Closing order repository");
        }
        self.db.close().await;
    }

    async fn put_order(&self, order: &Order) -> Result<(), WriteError> {
        if self.validate_orders {
            order.validate().map_err(|source| WriteError::Invalid {
                order_id: order.id.clone(),
                source,
            })?;
        }

        match self.operation_timeout {
            // 超时会丢弃写入 future，未提交的事务随之回滚
            Some(limit) => tokio::time::timeout(limit, self.write_order(order))
                .await
                .map_err(|_| WriteError::TimedOut {
                    order_id: order.id.clone(),
                    timeout: limit,
                })?,
            None => self.write_order(order).await,
        }
    }

    async fn get_orders_for_account(&self, account_id: &str) -> Result<Vec<Order>, ReadError> {
        match self.operation_timeout {
            Some(limit) => tokio::time::timeout(limit, self.read_orders(account_id))
                .await
                .map_err(|_| ReadError::TimedOut {
                    account_id: account_id.to_string(),
                    timeout: limit,
                })?,
            None => self.read_orders(account_id).await,
        }
    }
}
