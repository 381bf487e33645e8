#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use tokio::sync::mpsc;
use uuid::Uuid;

use backoffice_api::{
    config::AppConfig,
    db::{self, DbPool},
    entities::product,
    events::{process_events, EventSender},
    handlers::AppServices,
};

/// Test harness: fresh in-memory SQLite database with the real migrations
/// applied, plus the full service layer wired to a live event channel.
pub struct TestCtx {
    pub db: Arc<DbPool>,
    pub services: AppServices,
    /// Acting employee for operations that need one.
    pub actor: Uuid,
    _event_task: tokio::task::JoinHandle<()>,
}

pub async fn setup() -> TestCtx {
    // A single pooled connection keeps every test against the same
    // in-memory database.
    let cfg = AppConfig::for_database("sqlite::memory:");

    let pool = db::establish_connection(&cfg)
        .await
        .expect("failed to create test database");
    db::run_migrations(&pool).await.expect("migrations apply");

    let db = Arc::new(pool);

    let (tx, rx) = mpsc::channel(64);
    let event_sender = EventSender::new(tx);
    let event_task = tokio::spawn(process_events(rx));

    let services = AppServices::new(db.clone(), Arc::new(event_sender));

    TestCtx {
        db,
        services,
        actor: Uuid::new_v4(),
        _event_task: event_task,
    }
}

/// Inserts a product with the given prices and starting stock.
pub async fn seed_product(
    db: &DbPool,
    sku: &str,
    buy_price: Decimal,
    sell_price: Decimal,
    stock: i32,
) -> product::Model {
    let now = Utc::now();
    product::ActiveModel {
        id: Set(Uuid::new_v4()),
        sku: Set(sku.to_string()),
        name: Set(format!("Product {sku}")),
        description: Set(None),
        buy_price: Set(buy_price),
        sell_price: Set(sell_price),
        current_stock_qty: Set(stock),
        low_stock_alert_level: Set(5),
        created_at: Set(now),
        updated_at: Set(Some(now)),
    }
    .insert(db)
    .await
    .expect("seed product")
}

/// Current committed stock quantity.
pub async fn stock_of(db: &DbPool, product_id: Uuid) -> i32 {
    product::Entity::find_by_id(product_id)
        .one(db)
        .await
        .expect("fetch product")
        .expect("product exists")
        .current_stock_qty
}

/// Overwrites a product's sell price, the way catalog CRUD would.
pub async fn set_sell_price(db: &DbPool, product_id: Uuid, sell_price: Decimal) {
    let found = product::Entity::find_by_id(product_id)
        .one(db)
        .await
        .expect("fetch product")
        .expect("product exists");

    let mut active: product::ActiveModel = found.into();
    active.sell_price = Set(sell_price);
    active.updated_at = Set(Some(Utc::now()));
    active.update(db).await.expect("update sell price");
}
