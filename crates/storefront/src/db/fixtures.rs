//! Rows for database-backed tests.
//!
//! Those tests run under `#[sqlx::test]`, which creates a fresh database per
//! test from `migrations/`, and are ignored unless `DATABASE_URL` points at a
//! Postgres server: `cargo test -p cradlix-storefront -- --ignored`.

#![allow(clippy::unwrap_used)]

use sqlx::PgPool;

use cradlix_core::{AddressId, Email, Money, ProductId, UserId, UserRole};

use crate::models::{AddressSnapshot, CurrentUser};

pub async fn customer(pool: &PgPool, email: &str) -> CurrentUser {
    let id: UserId = sqlx::query_scalar(
        "INSERT INTO cradlix.user (email, password_hash, name)
         VALUES ($1, 'not-a-real-hash', 'Test Parent')
         RETURNING id",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .unwrap();

    CurrentUser {
        id,
        email: Email::parse(email).unwrap(),
        name: "Test Parent".to_string(),
        role: UserRole::Customer,
    }
}

pub async fn product(pool: &PgPool, slug: &str, price: Money, stock: i32) -> ProductId {
    sqlx::query_scalar(
        "INSERT INTO cradlix.product (slug, name, price, stock)
         VALUES ($1, $1, $2, $3)
         RETURNING id",
    )
    .bind(slug)
    .bind(price)
    .bind(stock)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn stock(pool: &PgPool, id: ProductId) -> i32 {
    sqlx::query_scalar("SELECT stock FROM cradlix.product WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn add_to_cart(pool: &PgPool, user: UserId, product: ProductId, quantity: i32) {
    sqlx::query("INSERT INTO cradlix.cart_item (user_id, product_id, quantity) VALUES ($1, $2, $3)")
        .bind(user)
        .bind(product)
        .bind(quantity)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn cart_lines(pool: &PgPool, user: UserId) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM cradlix.cart_item WHERE user_id = $1")
        .bind(user)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn address(pool: &PgPool, user: UserId) -> AddressId {
    sqlx::query_scalar(
        "INSERT INTO cradlix.address
            (user_id, full_name, phone, line1, city, state, pincode, is_default)
         VALUES ($1, 'Test Parent', '9876543210', '12 MG Road', 'Bengaluru', 'Karnataka',
                 '560001', TRUE)
         RETURNING id",
    )
    .bind(user)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub fn snapshot() -> AddressSnapshot {
    AddressSnapshot {
        full_name: "Test Parent".to_string(),
        phone: "+919876543210".to_string(),
        line1: "12 MG Road".to_string(),
        line2: None,
        landmark: None,
        city: "Bengaluru".to_string(),
        state: "Karnataka".to_string(),
        pincode: "560001".to_string(),
    }
}

pub async fn payment_events(pool: &PgPool, event: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM cradlix.payment_event WHERE event = $1")
        .bind(event)
        .fetch_one(pool)
        .await
        .unwrap()
}
