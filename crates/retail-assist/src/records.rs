//! Customer, store, order and coupon records in SQLite.

use async_trait::async_trait;
use chrono::{Duration, Local};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;

use retail_core::geo::{Coordinate, Facility};
use retail_core::types::{Coupon, CustomerRecord, OrderSummary};

use crate::error::AssistError;

/// Keyed lookups the assembler needs from the record store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// `None` when no customer has this id.
    async fn get_customer(&self, id: i64) -> Result<Option<CustomerRecord>, AssistError>;

    /// All facilities, in a stable order. The first one is the default.
    async fn get_facilities(&self) -> Result<Vec<Facility>, AssistError>;
}

type CustomerRow = (
    i64,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<f64>,
    Option<f64>,
);

type StoreRow = (i64, String, Option<f64>, Option<f64>, Option<String>, Option<String>, Option<String>);

type OrderRow = (
    i64,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
);

type CouponRow = (i64, Option<String>, Option<String>, Option<f64>, Option<String>);

const CUSTOMER_COLUMNS: &str =
    "id, name, phone, email, preferred_drink, loyalty_level, address, latitude, longitude";

const RECENT_ORDER_LIMIT: i64 = 5;

fn customer_from_row(row: CustomerRow) -> CustomerRecord {
    let (id, name, phone, email, preferred_drink, loyalty_level, address, lat, lon) = row;
    CustomerRecord {
        id,
        name,
        phone,
        email,
        address,
        location: Coordinate::from_parts(lat, lon),
        preferred_drink,
        loyalty_level,
        recent_orders: Vec::new(),
        active_coupons: Vec::new(),
    }
}

pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Open (creating if missing) the database file and apply the schema.
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .pragma("foreign_keys", "ON");
        let pool = SqlitePoolOptions::new().max_connections(2).connect_with(options).await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Private in-memory database, schema applied, no seed data.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::new().filename(":memory:");
        // One connection: every connection to :memory: is its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool { &self.pool }

    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::raw_sql(include_str!("../migrations/001_retail_schema.sql"))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Seed demo data when the customer table is empty. Returns whether rows
    /// were inserted.
    pub async fn init(&self) -> Result<bool, AssistError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM customers").fetch_one(&self.pool).await?;
        if count > 0 {
            return Ok(false);
        }
        self.seed().await?;
        tracing::info!("database initialized and seeded");
        Ok(true)
    }

    async fn seed(&self) -> Result<(), AssistError> {
        let mut tx = self.pool.begin().await?;

        for (id, name, phone, email, drink, loyalty, address, lat, lon) in SEED_CUSTOMERS {
            sqlx::query(
                "INSERT INTO customers (id, name, phone, email, preferred_drink, loyalty_level, address, latitude, longitude) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )
            .bind(id)
            .bind(name)
            .bind(phone)
            .bind(email)
            .bind(drink)
            .bind(loyalty)
            .bind(address)
            .bind(lat)
            .bind(lon)
            .execute(&mut *tx)
            .await?;
        }

        for (id, name, lat, lon, address, open, close) in SEED_STORES {
            sqlx::query(
                "INSERT INTO stores (id, name, latitude, longitude, address, open_time, close_time) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .bind(id)
            .bind(name)
            .bind(lat)
            .bind(lon)
            .bind(address)
            .bind(open)
            .bind(close)
            .execute(&mut *tx)
            .await?;
        }

        let now = Local::now().naive_local();
        for (id, customer_id, store_id, item, kind, size, status, days_ago) in SEED_ORDERS {
            let ts = (now - Duration::days(days_ago)).format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
            sqlx::query(
                "INSERT INTO orders (id, customer_id, store_id, item_name, item_type, size, status, timestamp) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(id)
            .bind(customer_id)
            .bind(store_id)
            .bind(item)
            .bind(kind)
            .bind(size)
            .bind(status)
            .bind(ts)
            .execute(&mut *tx)
            .await?;
        }

        for (id, customer_id, description, product, discount, days_valid) in SEED_COUPONS {
            let valid_until = (now + Duration::days(days_valid)).format("%Y-%m-%d").to_string();
            sqlx::query(
                "INSERT INTO coupons (id, customer_id, description, product_name, discount_percent, valid_until, is_active) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)",
            )
            .bind(id)
            .bind(customer_id)
            .bind(description)
            .bind(product)
            .bind(discount)
            .bind(valid_until)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Every customer ordered by name, without orders or coupons.
    pub async fn list_customers(&self) -> Result<Vec<CustomerRecord>, AssistError> {
        let rows: Vec<CustomerRow> = sqlx::query_as(&format!("SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY name"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(customer_from_row).collect())
    }

    async fn recent_orders(&self, customer_id: i64) -> Result<Vec<OrderSummary>, AssistError> {
        let rows: Vec<OrderRow> = sqlx::query_as(
            "SELECT o.id, o.item_name, o.item_type, o.size, o.status, o.timestamp, s.name \
             FROM orders o JOIN stores s ON o.store_id = s.id \
             WHERE o.customer_id = ?1 ORDER BY o.timestamp DESC LIMIT ?2",
        )
        .bind(customer_id)
        .bind(RECENT_ORDER_LIMIT)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, item_name, item_type, size, status, timestamp, store_name)| OrderSummary {
                id,
                item_name: item_name.unwrap_or_default(),
                item_type: item_type.unwrap_or_default(),
                size: size.unwrap_or_default(),
                status: status.unwrap_or_default(),
                timestamp: timestamp.unwrap_or_default(),
                store_name,
            })
            .collect())
    }

    async fn active_coupons(&self, customer_id: i64) -> Result<Vec<Coupon>, AssistError> {
        let rows: Vec<CouponRow> = sqlx::query_as(
            "SELECT id, description, product_name, discount_percent, valid_until \
             FROM coupons WHERE customer_id = ?1 AND is_active = 1 ORDER BY valid_until DESC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, description, product_name, discount, valid_until)| Coupon {
                id,
                description: description.unwrap_or_default(),
                product_name: product_name.unwrap_or_default(),
                discount_percent: discount.unwrap_or(0.0),
                valid_until: valid_until.unwrap_or_default(),
            })
            .collect())
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn get_customer(&self, id: i64) -> Result<Option<CustomerRecord>, AssistError> {
        let row: Option<CustomerRow> =
            sqlx::query_as(&format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut customer = customer_from_row(row);
        customer.recent_orders = self.recent_orders(id).await?;
        customer.active_coupons = self.active_coupons(id).await?;
        Ok(Some(customer))
    }

    async fn get_facilities(&self) -> Result<Vec<Facility>, AssistError> {
        let rows: Vec<StoreRow> = sqlx::query_as(
            "SELECT id, name, latitude, longitude, address, open_time, close_time FROM stores ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, name, lat, lon, address, open_time, close_time)| Facility {
                id,
                name,
                location: Coordinate::from_parts(lat, lon),
                address: address.unwrap_or_default(),
                open_time: open_time.unwrap_or_default(),
                close_time: close_time.unwrap_or_default(),
            })
            .collect())
    }
}

// Demo data: BeanHaven Coffee branches around Manhattan and their customers.

type SeedCustomer = (i64, &'static str, &'static str, &'static str, &'static str, &'static str, &'static str, f64, f64);

const SEED_CUSTOMERS: [SeedCustomer; 10] = [
    (1, "Neeraj Kumar", "+1-555-0101", "neeraj.kumar@example.com", "Hot Cocoa", "Gold", "120 Main St, New York, NY", 40.7592, -73.9855),
    (2, "Alice Johnson", "+1-555-0102", "alice.j@example.com", "Caramel Latte", "Silver", "200 Broadway, New York, NY", 40.7595, -73.9870),
    (3, "Michael Chen", "+1-555-0103", "m.chen@example.com", "Espresso", "Platinum", "350 5th Ave, New York, NY", 40.7610, -73.9880),
    (4, "Sarah Williams", "+1-555-0104", "sarah.w@example.com", "Cappuccino", "Gold", "89 Madison Ave, New York, NY", 40.7545, -73.9835),
    (5, "David Martinez", "+1-555-0105", "david.m@example.com", "Americano", "Bronze", "567 Lexington Ave, New York, NY", 40.7620, -73.9900),
    (6, "Emily Brown", "+1-555-0106", "emily.brown@example.com", "Latte", "Silver", "125 Main St, New York, NY", 40.7590, -73.9852),
    (7, "James Wilson", "+1-555-0107", "j.wilson@example.com", "Cold Brew", "Gold", "789 Park Ave, New York, NY", 40.7835, -73.9660),
    (8, "Lisa Anderson", "+1-555-0108", "lisa.a@example.com", "Frappuccino", "Bronze", "234 West St, New York, NY", 40.7560, -73.9830),
    (9, "Robert Taylor", "+1-555-0109", "robert.t@example.com", "Hot Cocoa", "Silver", "456 East St, New York, NY", 40.7600, -73.9860),
    (10, "Jennifer Lee", "+1-555-0110", "jennifer.lee@example.com", "Iced Latte", "Platinum", "678 Central Ave, New York, NY", 40.7825, -73.9650),
];

type SeedStore = (i64, &'static str, f64, f64, &'static str, &'static str, &'static str);

const SEED_STORES: [SeedStore; 3] = [
    (1, "BeanHaven Coffee - Downtown", 40.7589, -73.9851, "123 Main St, New York, NY", "06:00", "21:00"),
    (2, "BeanHaven Coffee - Uptown", 40.7829, -73.9654, "456 Park Ave, New York, NY", "07:00", "20:00"),
    (3, "BeanHaven Coffee - Midtown", 40.7549, -73.9840, "789 Broadway, New York, NY", "06:30", "22:00"),
];

/// `(id, customer, store, item, type, size, status, days ago)`
type SeedOrder = (i64, i64, i64, &'static str, &'static str, &'static str, &'static str, i64);

const SEED_ORDERS: [SeedOrder; 13] = [
    (1, 1, 1, "Hot Cocoa", "hot_drink", "Medium", "completed", 2),
    (2, 1, 1, "Cappuccino", "hot_drink", "Large", "completed", 5),
    (3, 2, 1, "Caramel Latte", "hot_drink", "Medium", "ready", 0),
    (4, 2, 2, "Iced Coffee", "cold_drink", "Large", "completed", 1),
    (5, 3, 1, "Espresso", "hot_drink", "Small", "completed", 1),
    (6, 3, 1, "Espresso", "hot_drink", "Small", "completed", 3),
    (7, 4, 2, "Cappuccino", "hot_drink", "Large", "in_progress", 0),
    (8, 5, 1, "Americano", "hot_drink", "Medium", "completed", 4),
    (9, 6, 1, "Latte", "hot_drink", "Medium", "completed", 2),
    (10, 7, 2, "Cold Brew", "cold_drink", "Large", "ready", 0),
    (11, 8, 1, "Frappuccino", "cold_drink", "Medium", "completed", 1),
    (12, 9, 1, "Hot Cocoa", "hot_drink", "Large", "completed", 3),
    (13, 10, 2, "Iced Latte", "cold_drink", "Medium", "completed", 1),
];

/// `(id, customer, description, product, discount %, days valid)`
type SeedCoupon = (i64, i64, &'static str, &'static str, f64, i64);

const SEED_COUPONS: [SeedCoupon; 9] = [
    (1, 1, "10% OFF Hot Cocoa", "Hot Cocoa", 10.0, 30),
    (2, 2, "15% OFF Any Latte", "Latte", 15.0, 30),
    (3, 3, "20% OFF Espresso", "Espresso", 20.0, 30),
    (4, 4, "Buy 1 Get 1 Free Cappuccino", "Cappuccino", 50.0, 15),
    (5, 5, "5% OFF Any Drink", "Any Drink", 5.0, 30),
    (6, 6, "Free Size Upgrade", "Any Drink", 0.0, 30),
    (7, 7, "15% OFF Cold Brew", "Cold Brew", 15.0, 30),
    (8, 9, "10% OFF Hot Cocoa", "Hot Cocoa", 10.0, 30),
    (9, 10, "20% OFF Iced Drinks", "Iced Latte", 20.0, 15),
];
