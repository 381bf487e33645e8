use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DbBackend, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::entities::product::{self, Entity as Product};
use crate::errors::ServiceError;

/// The stock ledger: every mutation of `current_stock_qty` goes through
/// here, inside the caller's unit of work.
///
/// Both operations read the product row under an exclusive row lock, so two
/// concurrent transactions touching the same product serialize their
/// check-then-write sequence instead of both passing a stale check.
pub struct StockLedger;

impl StockLedger {
    /// Takes `quantity` units out of stock.
    ///
    /// Fails with `InsufficientStock` when the committed quantity cannot
    /// cover the request; the caller's transaction is expected to roll
    /// back, leaving the counter untouched.
    #[instrument(skip(conn))]
    pub async fn reserve<C: ConnectionTrait>(
        conn: &C,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<product::Model, ServiceError> {
        let found = Self::locked_row(conn, product_id).await?;

        if found.current_stock_qty < quantity {
            return Err(ServiceError::InsufficientStock(format!(
                "{}: requested {}, available {}",
                found.name, quantity, found.current_stock_qty
            )));
        }

        Self::apply_delta(conn, found, -quantity).await
    }

    /// Puts `quantity` units back into stock. Always succeeds for an
    /// existing product; restocks are not capped against any maximum.
    #[instrument(skip(conn))]
    pub async fn restore<C: ConnectionTrait>(
        conn: &C,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<product::Model, ServiceError> {
        let found = Self::locked_row(conn, product_id).await?;
        Self::apply_delta(conn, found, quantity).await
    }

    /// Loads the product row for mutation.
    ///
    /// `SELECT ... FOR UPDATE` on engines with row locks; SQLite has a
    /// single writer and serializes these transactions by itself.
    async fn locked_row<C: ConnectionTrait>(
        conn: &C,
        product_id: Uuid,
    ) -> Result<product::Model, ServiceError> {
        let mut query = Product::find_by_id(product_id);
        if conn.get_database_backend() == DbBackend::Postgres {
            query = query.lock_exclusive();
        }

        query
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {product_id} not found")))
    }

    async fn apply_delta<C: ConnectionTrait>(
        conn: &C,
        row: product::Model,
        delta: i32,
    ) -> Result<product::Model, ServiceError> {
        let new_qty = row.current_stock_qty + delta;
        debug!(product_id = %row.id, delta, new_qty, "stock ledger write");
        // reserve() has already checked the floor; a negative value here is
        // a logic error, not an input error.
        debug_assert!(new_qty >= 0);

        let mut active: product::ActiveModel = row.into();
        active.current_stock_qty = Set(new_qty);
        active.updated_at = Set(Some(Utc::now()));

        active.update(conn).await.map_err(ServiceError::db_error)
    }
}

/// Read-only catalog projections used by the HTTP layer. Writes to
/// name/price/SKU fields belong to the (out-of-scope) catalog CRUD.
pub async fn list_products<C: ConnectionTrait>(
    conn: &C,
    page: u64,
    limit: u64,
) -> Result<(Vec<product::Model>, u64), ServiceError> {
    let paginator = Product::find()
        .order_by_asc(product::Column::Name)
        .paginate(conn, limit);

    let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
    let items = paginator
        .fetch_page(page.saturating_sub(1))
        .await
        .map_err(ServiceError::db_error)?;

    Ok((items, total))
}

/// Products at or below their alert level, most depleted first.
pub async fn low_stock_products<C: ConnectionTrait>(
    conn: &C,
) -> Result<Vec<product::Model>, ServiceError> {
    use sea_orm::sea_query::Expr;

    Product::find()
        .filter(
            Expr::col(product::Column::CurrentStockQty)
                .lte(Expr::col(product::Column::LowStockAlertLevel)),
        )
        .order_by_asc(product::Column::CurrentStockQty)
        .all(conn)
        .await
        .map_err(ServiceError::db_error)
}
