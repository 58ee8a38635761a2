//! PostgreSQL store implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use domain::{
    Cart, CartLine, Money, Order, OrderItem, Product, ProductId, ShippingAddress, SizeStock,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::repository::{
    CartStore, OrderFilter, OrderPage, OrderStore, Pagination, ProductStore,
};
use crate::{Result, StoreError};

/// Runs the database migrations.
pub async fn run_migrations(pool: &PgPool) -> std::result::Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

/// PostgreSQL-backed product store.
#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    /// Creates a new product store over a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn find(&self, id: &ProductId) -> Result<Option<Product>> {
        let Some(row) = sqlx::query(
            "SELECT id, name, price, discount_price, is_active, total_sold FROM products WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let size_rows = sqlx::query(
            "SELECT size, stock FROM product_sizes WHERE product_id = $1 ORDER BY size",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await?;

        let sizes = size_rows
            .into_iter()
            .map(|r| -> Result<SizeStock> {
                Ok(SizeStock {
                    size: r.try_get("size")?,
                    stock: u32::try_from(r.try_get::<i64, _>("stock")?).unwrap_or(0),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(Product {
            id: ProductId::new(row.try_get::<String, _>("id")?),
            name: row.try_get("name")?,
            price: Money::new(row.try_get("price")?),
            discount_price: row
                .try_get::<Option<i64>, _>("discount_price")?
                .map(Money::new),
            sizes,
            is_active: row.try_get("is_active")?,
            total_sold: u32::try_from(row.try_get::<i64, _>("total_sold")?).unwrap_or(0),
        }))
    }

    async fn upsert(&self, product: Product) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (id, name, price, discount_price, is_active, total_sold)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                price = EXCLUDED.price,
                discount_price = EXCLUDED.discount_price,
                is_active = EXCLUDED.is_active,
                total_sold = EXCLUDED.total_sold
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(product.price.amount())
        .bind(product.discount_price.map(|p| p.amount()))
        .bind(product.is_active)
        .bind(i64::from(product.total_sold))
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM product_sizes WHERE product_id = $1")
            .bind(product.id.as_str())
            .execute(&mut *tx)
            .await?;

        for entry in &product.sizes {
            sqlx::query("INSERT INTO product_sizes (product_id, size, stock) VALUES ($1, $2, $3)")
                .bind(product.id.as_str())
                .bind(&entry.size)
                .bind(i64::from(entry.stock))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn reserve_stock(&self, id: &ProductId, size: &str, quantity: u32) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE product_sizes
            SET stock = stock - $3
            WHERE product_id = $1 AND size = $2 AND stock >= $3
            "#,
        )
        .bind(id.as_str())
        .bind(size)
        .bind(i64::from(quantity))
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            // Distinguish short stock from an unknown size/product.
            let available: Option<i64> = sqlx::query_scalar(
                "SELECT stock FROM product_sizes WHERE product_id = $1 AND size = $2",
            )
            .bind(id.as_str())
            .bind(size)
            .fetch_optional(&mut *tx)
            .await?;

            return match available {
                Some(stock) => Err(StoreError::InsufficientStock {
                    product_id: id.to_string(),
                    size: size.to_string(),
                    requested: quantity,
                    available: u32::try_from(stock).unwrap_or(0),
                }),
                None => {
                    let exists: bool =
                        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                            .bind(id.as_str())
                            .fetch_one(&mut *tx)
                            .await?;
                    if exists {
                        Err(StoreError::UnknownSize {
                            product_id: id.to_string(),
                            size: size.to_string(),
                        })
                    } else {
                        Err(StoreError::NotFound {
                            entity: "product",
                            id: id.to_string(),
                        })
                    }
                }
            };
        }

        sqlx::query("UPDATE products SET total_sold = total_sold + $2 WHERE id = $1")
            .bind(id.as_str())
            .bind(i64::from(quantity))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn restore_stock(&self, id: &ProductId, size: &str, quantity: u32) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE product_sizes SET stock = stock + $3 WHERE product_id = $1 AND size = $2",
        )
        .bind(id.as_str())
        .bind(size)
        .bind(i64::from(quantity))
        .execute(&mut *tx)
        .await?
        .rows_affected();

        // Product or size deleted since the order was placed: skip.
        if updated == 0 {
            tracing::warn!(product_id = %id, size, quantity, "restore skipped, product or size gone");
            tx.commit().await?;
            return Ok(());
        }

        sqlx::query("UPDATE products SET total_sold = GREATEST(total_sold - $2, 0) WHERE id = $1")
            .bind(id.as_str())
            .bind(i64::from(quantity))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// PostgreSQL-backed cart store.
#[derive(Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    /// Creates a new cart store over a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>> {
        let Some(row) = sqlx::query("SELECT lines FROM carts WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let lines: Vec<CartLine> =
            serde_json::from_value(row.try_get::<serde_json::Value, _>("lines")?)?;
        Ok(Some(Cart { user_id, lines }))
    }

    async fn upsert(&self, cart: Cart) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO carts (user_id, lines) VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET lines = EXCLUDED.lines
            "#,
        )
        .bind(cart.user_id.as_uuid())
        .bind(serde_json::to_value(&cart.lines)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear(&self, user_id: UserId) -> Result<()> {
        sqlx::query("UPDATE carts SET lines = '[]'::jsonb WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// PostgreSQL-backed order store.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

const ORDER_COLUMNS: &str = "id, user_id, items, total_amount, shipping_address, status, \
                             payment_method, payment_status, note, created_at, updated_at";

impl PgOrderStore {
    /// Creates a new order store over a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let items: Vec<OrderItem> =
            serde_json::from_value(row.try_get::<serde_json::Value, _>("items")?)?;
        let shipping_address: ShippingAddress =
            serde_json::from_value(row.try_get::<serde_json::Value, _>("shipping_address")?)?;

        let status = row
            .try_get::<String, _>("status")?
            .parse()
            .map_err(|value| StoreError::Decode {
                field: "status",
                value,
            })?;
        let payment_method = row
            .try_get::<String, _>("payment_method")?
            .parse()
            .map_err(|value| StoreError::Decode {
                field: "payment_method",
                value,
            })?;
        let payment_status = row
            .try_get::<String, _>("payment_status")?
            .parse()
            .map_err(|value| StoreError::Decode {
                field: "payment_status",
                value,
            })?;

        Ok(Order::from_parts(
            OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            items,
            Money::new(row.try_get("total_amount")?),
            shipping_address,
            status,
            payment_method,
            payment_status,
            row.try_get("note")?,
            row.try_get::<DateTime<Utc>, _>("created_at")?,
            row.try_get::<DateTime<Utc>, _>("updated_at")?,
        ))
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, items, total_amount, shipping_address,
                                status, payment_method, payment_status, note,
                                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.user_id().as_uuid())
        .bind(serde_json::to_value(order.items())?)
        .bind(order.total_amount().amount())
        .bind(serde_json::to_value(order.shipping_address())?)
        .bind(order.status().as_str())
        .bind(order.payment_method().as_str())
        .bind(order.payment_status().as_str())
        .bind(order.note())
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn save(&self, order: &Order) -> Result<()> {
        // Items and totals are immutable after creation; only the mutable
        // fields are written back.
        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, payment_status = $3, note = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.status().as_str())
        .bind(order.payment_status().as_str())
        .bind(order.note())
        .bind(order.updated_at())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(StoreError::NotFound {
                entity: "order",
                id: order.id().to_string(),
            });
        }
        Ok(())
    }

    async fn list(&self, filter: &OrderFilter) -> Result<OrderPage> {
        let user_id = filter.user_id.map(|u| u.as_uuid());
        let status = filter.status.map(|s| s.as_str());

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM orders
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::text IS NULL OR status = $2)
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(user_id)
        .bind(status)
        .bind(i64::from(filter.page_size()))
        .bind(filter.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let orders = rows
            .into_iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;

        Ok(OrderPage {
            orders,
            pagination: Pagination::new(filter, total.max(0) as u64),
        })
    }

    async fn confirm_payment_if_pending(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE orders
            SET payment_status = 'paid', status = 'confirmed', updated_at = NOW()
            WHERE id = $1 AND payment_status = 'pending' AND status = 'pending'
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::row_to_order(row)?)),
            None => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE id = $1)")
                        .bind(id.as_uuid())
                        .fetch_one(&self.pool)
                        .await?;
                if exists {
                    Ok(None)
                } else {
                    Err(StoreError::NotFound {
                        entity: "order",
                        id: id.to_string(),
                    })
                }
            }
        }
    }

    async fn cancel_if_payment_pending(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE orders
            SET status = 'cancelled', updated_at = NOW()
            WHERE id = $1 AND payment_status = 'pending' AND status = 'pending'
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::row_to_order(row)?)),
            None => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE id = $1)")
                        .bind(id.as_uuid())
                        .fetch_one(&self.pool)
                        .await?;
                if exists {
                    Ok(None)
                } else {
                    Err(StoreError::NotFound {
                        entity: "order",
                        id: id.to_string(),
                    })
                }
            }
        }
    }
}
