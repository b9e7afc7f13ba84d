//! `sqlsage seed` — create and populate the sample e-commerce database
//!
//! Deterministic sample data: customers, products, orders and order items,
//! with order totals consistent with their items. Seeding uses its own
//! connection; the workflow's store stays read-only.

use crate::config::load_config;
use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::info;

const FIRST_NAMES: &[&str] = &[
    "John", "Jane", "Bob", "Alice", "Charlie", "Emma", "David", "Sarah", "Michael", "Lisa",
];
const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Jones", "Brown", "Davis", "Miller", "Wilson", "Moore",
    "Taylor",
];
const CITIES: &[(&str, &str)] = &[
    ("New York", "NY"),
    ("Los Angeles", "CA"),
    ("Chicago", "IL"),
    ("Houston", "TX"),
    ("Phoenix", "AZ"),
    ("Philadelphia", "PA"),
    ("San Antonio", "TX"),
    ("San Diego", "CA"),
];
const ORDER_STATUSES: &[&str] = &["delivered", "shipped", "pending", "cancelled"];
const CATALOG: &[(&str, &[&str])] = &[
    (
        "Electronics",
        &["Laptop", "Smartphone", "Tablet", "Headphones", "Smart Watch", "Camera"],
    ),
    (
        "Clothing",
        &["T-Shirt", "Jeans", "Jacket", "Sneakers", "Dress", "Sweater"],
    ),
    (
        "Books",
        &["Fiction Novel", "Cookbook", "Biography", "Science Book", "Mystery Novel"],
    ),
    (
        "Home & Garden",
        &["Coffee Maker", "Blender", "Vacuum Cleaner", "Garden Tools", "Cookware Set"],
    ),
    (
        "Sports",
        &["Running Shoes", "Yoga Mat", "Dumbbells", "Tennis Racket", "Bicycle"],
    ),
];

const CUSTOMER_COUNT: usize = 50;
const ORDER_COUNT: usize = 100;

/// Create the sample database
pub async fn run(force: bool) -> Result<()> {
    let config = load_config()?;
    let path = &config.database.path;

    if path.exists() {
        if !force {
            bail!(
                "{} already exists. Pass --force to recreate it.",
                path.display()
            );
        }
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove {}", path.display()))?;
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let url = format!("sqlite:{}?mode=rwc", path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .with_context(|| format!("Failed to create database at {}", path.display()))?;

    create_tables(&pool).await?;
    seed_customers(&pool).await?;
    let prices = seed_products(&pool).await?;
    seed_orders(&pool, &prices).await?;

    info!(path = %path.display(), "Sample database created");
    println!(
        "Created {} with {} customers, {} products and {} orders.",
        path.display(),
        CUSTOMER_COUNT,
        prices.len(),
        ORDER_COUNT
    );
    Ok(())
}

async fn create_tables(pool: &SqlitePool) -> Result<()> {
    for ddl in [
        "CREATE TABLE customers (
            customer_id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            phone TEXT,
            city TEXT,
            state TEXT,
            registration_date DATE NOT NULL
        )",
        "CREATE TABLE products (
            product_id INTEGER PRIMARY KEY AUTOINCREMENT,
            product_name TEXT NOT NULL,
            category TEXT NOT NULL,
            price DECIMAL(10, 2) NOT NULL,
            stock_quantity INTEGER NOT NULL,
            description TEXT
        )",
        "CREATE TABLE orders (
            order_id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id INTEGER NOT NULL,
            order_date DATE NOT NULL,
            status TEXT NOT NULL,
            total_amount DECIMAL(10, 2) NOT NULL,
            FOREIGN KEY (customer_id) REFERENCES customers(customer_id)
        )",
        "CREATE TABLE order_items (
            order_item_id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id INTEGER NOT NULL,
            product_id INTEGER NOT NULL,
            quantity INTEGER NOT NULL,
            unit_price DECIMAL(10, 2) NOT NULL,
            FOREIGN KEY (order_id) REFERENCES orders(order_id),
            FOREIGN KEY (product_id) REFERENCES products(product_id)
        )",
    ] {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}

async fn seed_customers(pool: &SqlitePool) -> Result<()> {
    let today = Utc::now().date_naive();

    for i in 0..CUSTOMER_COUNT {
        let first = FIRST_NAMES[i % FIRST_NAMES.len()];
        let last = LAST_NAMES[(i / FIRST_NAMES.len() + i) % LAST_NAMES.len()];
        let email = format!("{}.{}{}@email.com", first.to_lowercase(), last.to_lowercase(), i);
        let phone = format!("555-{:03}-{:04}", 100 + (i * 17) % 900, 1000 + (i * 137) % 9000);
        let (city, state) = CITIES[i % CITIES.len()];
        let registered = today - Duration::days(30 + ((i * 13) % 700) as i64);

        sqlx::query(
            "INSERT INTO customers (first_name, last_name, email, phone, city, state, registration_date)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(first)
        .bind(last)
        .bind(&email)
        .bind(&phone)
        .bind(city)
        .bind(state)
        .bind(registered.format("%Y-%m-%d").to_string())
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn seed_products(pool: &SqlitePool) -> Result<Vec<f64>> {
    let mut prices = Vec::new();

    for (category_idx, (category, names)) in CATALOG.iter().enumerate() {
        for (product_idx, name) in names.iter().enumerate() {
            let price = 10.0 + (category_idx * 85 + product_idx * 37) as f64 % 490.0 + 0.99;
            let stock = 20 + (category_idx * 31 + product_idx * 7) % 180;
            let description = format!("{name} from our {category} range");

            sqlx::query(
                "INSERT INTO products (product_name, category, price, stock_quantity, description)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(name)
            .bind(category)
            .bind(price)
            .bind(stock as i64)
            .bind(&description)
            .execute(pool)
            .await?;

            prices.push(price);
        }
    }
    Ok(prices)
}

async fn seed_orders(pool: &SqlitePool, prices: &[f64]) -> Result<()> {
    let today = Utc::now().date_naive();

    for i in 0..ORDER_COUNT {
        let customer_id = 1 + (i * 7) % CUSTOMER_COUNT;
        let order_date = today - Duration::days(((i * 11) % 365) as i64);
        let status = ORDER_STATUSES[i % ORDER_STATUSES.len()];

        let item_count = 1 + i % 3;
        let items: Vec<(usize, i64, f64)> = (0..item_count)
            .map(|j| {
                let product_id = 1 + (i * 5 + j * 11) % prices.len();
                let quantity = (1 + (i + j) % 4) as i64;
                (product_id, quantity, prices[product_id - 1])
            })
            .collect();
        let total: f64 = items
            .iter()
            .map(|(_, quantity, price)| *quantity as f64 * price)
            .sum();

        sqlx::query(
            "INSERT INTO orders (customer_id, order_date, status, total_amount)
             VALUES (?, ?, ?, ?)",
        )
        .bind(customer_id as i64)
        .bind(order_date.format("%Y-%m-%d").to_string())
        .bind(status)
        .bind((total * 100.0).round() / 100.0)
        .execute(pool)
        .await?;

        let order_id = (i + 1) as i64;
        for (product_id, quantity, price) in items {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, unit_price)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(order_id)
            .bind(product_id as i64)
            .bind(quantity)
            .bind(price)
            .execute(pool)
            .await?;
        }
    }
    Ok(())
}
