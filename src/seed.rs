//! Demo data for local development, enabled with `SEED_DEMO=true`.

use rust_decimal::Decimal;
use std::str::FromStr;
use time::{Duration, OffsetDateTime};
use tracing::info;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::listings::repo::{self as products, Category, Condition, NewProduct, ProductStatus};
use crate::orders::repo::OrderStatus;
use crate::state::AppState;
use crate::users::repo::User;
use crate::users::role::Role;

const DEMO_PASSWORD: &str = "password123";

pub async fn seed_demo_data(state: &AppState) -> anyhow::Result<()> {
    if User::find_by_username(&state.db, "seller1").await?.is_some() {
        info!("demo data already present, skipping seed");
        return Ok(());
    }

    let hash = hash_password(DEMO_PASSWORD)?;
    insert_demo_user(state, "admin", "admin@resalex.com", &hash, Role::Admin).await?;
    insert_demo_user(state, "moderator1", "moderator@resalex.com", &hash, Role::Moderator).await?;
    let seller1 = insert_demo_user(state, "seller1", "seller1@resalex.com", &hash, Role::Seller).await?;
    let seller2 = insert_demo_user(state, "seller2", "seller2@resalex.com", &hash, Role::Seller).await?;
    let buyer1 = insert_demo_user(state, "buyer1", "buyer1@resalex.com", &hash, Role::User).await?;
    let buyer2 = insert_demo_user(state, "buyer2", "buyer2@resalex.com", &hash, Role::User).await?;

    let catalog: [(&str, &str, Category, Condition, &str, &str); 6] = [
        (
            "Air Jordan 1 Retro High OG",
            "Nike",
            Category::Sneakers,
            Condition::New,
            "US 9",
            "180.00",
        ),
        (
            "Yeezy Boost 350 V2",
            "Adidas",
            Category::Sneakers,
            Condition::LikeNew,
            "US 10",
            "220.00",
        ),
        (
            "Supreme Box Logo Hoodie",
            "Supreme",
            Category::Clothing,
            Condition::Good,
            "L",
            "450.00",
        ),
        (
            "Travis Scott x Air Jordan 1",
            "Nike",
            Category::Sneakers,
            Condition::LikeNew,
            "US 9.5",
            "1200.00",
        ),
        (
            "Gucci GG Marmont Bag",
            "Gucci",
            Category::Accessories,
            Condition::LikeNew,
            "One Size",
            "890.00",
        ),
        (
            "iPhone 14 Pro Max",
            "Apple",
            Category::Electronics,
            Condition::New,
            "256GB",
            "1100.00",
        ),
    ];

    let mut product_ids = Vec::with_capacity(catalog.len());
    for (i, &(name, brand, category, condition, size, price)) in catalog.iter().enumerate() {
        let seller = if i % 2 == 0 { &seller1 } else { &seller2 };
        let product = products::insert(
            &state.db,
            NewProduct {
                name,
                description: "",
                brand,
                category,
                size,
                condition,
                price: Decimal::from_str(price)?,
                seller_id: seller.id,
                image_key: None,
            },
        )
        .await?;
        // demo listings skip moderation
        products::set_status(&state.db, product.id, ProductStatus::Approved).await?;
        product_ids.push((product.id, product.price));
    }

    let now = OffsetDateTime::now_utc();
    let order_plan: [(OrderStatus, i64, Option<&str>); 4] = [
        (OrderStatus::Delivered, 5, None),
        (OrderStatus::Shipped, 2, Some("TR100042")),
        (OrderStatus::Paid, 1, None),
        (OrderStatus::Pending, 0, None),
    ];

    for (i, (status, days_ago, tracking)) in order_plan.iter().enumerate() {
        let (product_id, price) = product_ids[i];
        let buyer = if i % 2 == 0 { &buyer1 } else { &buyer2 };
        insert_demo_order(
            state,
            buyer.id,
            product_id,
            price,
            *status,
            now - Duration::days(*days_ago),
            *tracking,
        )
        .await?;
        products::set_status(&state.db, product_id, ProductStatus::Sold).await?;
    }

    info!("demo data seeded: 6 users, 6 listings, 4 orders");
    Ok(())
}

async fn insert_demo_user(
    state: &AppState,
    username: &str,
    email: &str,
    hash: &str,
    role: Role,
) -> anyhow::Result<User> {
    User::insert(&state.db, username, email, hash, role)
        .await
        .map_err(|e| anyhow::anyhow!("seed user {username}: {e}"))
}

async fn insert_demo_order(
    state: &AppState,
    buyer_id: Uuid,
    product_id: Uuid,
    total_amount: Decimal,
    status: OrderStatus,
    created_at: OffsetDateTime,
    tracking_number: Option<&str>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO orders (buyer_id, product_id, total_amount, status, tracking_number, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(buyer_id)
    .bind(product_id)
    .bind(total_amount)
    .bind(status)
    .bind(tracking_number)
    .bind(created_at)
    .execute(&state.db)
    .await?;
    Ok(())
}
