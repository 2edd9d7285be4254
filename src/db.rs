use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Result};

use crate::models::{Booking, Product, Service};

pub async fn get_db_pool(database_url: &str) -> PgPool {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .expect("Failed to connect to DB")
}

/// Создаёт таблицы при первом запуске.
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS services (
            id SERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            price DOUBLE PRECISION NOT NULL DEFAULT 0,
            duration TEXT,
            photo_id TEXT,
            page_url TEXT,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS products (
            id SERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            price DOUBLE PRECISION NOT NULL DEFAULT 0,
            kind TEXT NOT NULL,
            photo_id TEXT,
            page_url TEXT,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS bookings (
            id SERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL,
            username TEXT,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            service_id INTEGER,
            hours INTEGER NOT NULL DEFAULT 1,
            people_count INTEGER NOT NULL DEFAULT 1,
            studio TEXT NOT NULL DEFAULT '',
            wishes TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'new',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}

const SERVICE_COLUMNS: &str =
    "id, name, description, price, duration, photo_id, page_url, is_active, sort_order, created_at";
const PRODUCT_COLUMNS: &str =
    "id, name, description, price, kind, photo_id, page_url, is_active, sort_order, created_at";
const BOOKING_COLUMNS: &str =
    "id, user_id, username, first_name, last_name, phone, service_id, hours, people_count, \
     studio, wishes, status, created_at";

// ============ Услуги ============

pub struct NewService {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub duration: Option<String>,
    pub photo_id: Option<String>,
}

pub async fn list_services(pool: &PgPool, only_active: bool) -> Result<Vec<Service>> {
    let sql = if only_active {
        format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE is_active = TRUE ORDER BY sort_order, id"
        )
    } else {
        format!("SELECT {SERVICE_COLUMNS} FROM services ORDER BY sort_order, id")
    };
    sqlx::query_as::<_, Service>(&sql).fetch_all(pool).await
}

pub async fn get_service(pool: &PgPool, id: i32) -> Result<Option<Service>> {
    sqlx::query_as::<_, Service>(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn search_services(pool: &PgPool, query: &str) -> Result<Vec<Service>> {
    sqlx::query_as::<_, Service>(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services \
         WHERE is_active = TRUE AND name ILIKE '%' || $1 || '%' ORDER BY sort_order, id"
    ))
    .bind(query)
    .fetch_all(pool)
    .await
}

/// Новая услуга встаёт в конец списка: sort_order = max + 1.
pub async fn insert_service(pool: &PgPool, service: &NewService) -> Result<i32> {
    sqlx::query_scalar::<_, i32>(
        "INSERT INTO services (name, description, price, duration, photo_id, sort_order) \
         VALUES ($1, $2, $3, $4, $5, \
                 (SELECT COALESCE(MAX(sort_order), 0) + 1 FROM services)) \
         RETURNING id",
    )
    .bind(&service.name)
    .bind(&service.description)
    .bind(service.price)
    .bind(&service.duration)
    .bind(&service.photo_id)
    .fetch_one(pool)
    .await
}

pub async fn set_service_name(pool: &PgPool, id: i32, name: &str) -> Result<()> {
    sqlx::query("UPDATE services SET name = $1 WHERE id = $2")
        .bind(name)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_service_description(pool: &PgPool, id: i32, description: &str) -> Result<()> {
    sqlx::query("UPDATE services SET description = $1 WHERE id = $2")
        .bind(description)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_service_price(pool: &PgPool, id: i32, price: f64) -> Result<()> {
    sqlx::query("UPDATE services SET price = $1 WHERE id = $2")
        .bind(price)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_service_duration(pool: &PgPool, id: i32, duration: &str) -> Result<()> {
    sqlx::query("UPDATE services SET duration = $1 WHERE id = $2")
        .bind(duration)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_service_photo(pool: &PgPool, id: i32, photo_id: Option<&str>) -> Result<()> {
    sqlx::query("UPDATE services SET photo_id = $1 WHERE id = $2")
        .bind(photo_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_service_page_url(pool: &PgPool, id: i32, page_url: Option<&str>) -> Result<()> {
    sqlx::query("UPDATE services SET page_url = $1 WHERE id = $2")
        .bind(page_url)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn toggle_service_active(pool: &PgPool, id: i32) -> Result<Option<bool>> {
    sqlx::query_scalar::<_, bool>(
        "UPDATE services SET is_active = NOT is_active WHERE id = $1 RETURNING is_active",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_service(pool: &PgPool, id: i32) -> Result<()> {
    sqlx::query("DELETE FROM services WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

// ============ Товары ============

pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub kind: String,
    pub photo_id: Option<String>,
}

/// `kind = None` — все категории.
pub async fn list_products(
    pool: &PgPool,
    only_active: bool,
    kind: Option<&str>,
) -> Result<Vec<Product>> {
    match (only_active, kind) {
        (true, Some(kind)) => {
            sqlx::query_as::<_, Product>(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM products \
                 WHERE is_active = TRUE AND kind = $1 ORDER BY sort_order, id"
            ))
            .bind(kind)
            .fetch_all(pool)
            .await
        }
        (true, None) => {
            sqlx::query_as::<_, Product>(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM products \
                 WHERE is_active = TRUE ORDER BY sort_order, id"
            ))
            .fetch_all(pool)
            .await
        }
        (false, _) => {
            sqlx::query_as::<_, Product>(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY sort_order, id"
            ))
            .fetch_all(pool)
            .await
        }
    }
}

pub async fn get_product(pool: &PgPool, id: i32) -> Result<Option<Product>> {
    sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn search_products(pool: &PgPool, query: &str) -> Result<Vec<Product>> {
    sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products \
         WHERE is_active = TRUE AND name ILIKE '%' || $1 || '%' ORDER BY sort_order, id"
    ))
    .bind(query)
    .fetch_all(pool)
    .await
}

pub async fn insert_product(pool: &PgPool, product: &NewProduct) -> Result<i32> {
    sqlx::query_scalar::<_, i32>(
        "INSERT INTO products (name, description, price, kind, photo_id, sort_order) \
         VALUES ($1, $2, $3, $4, $5, \
                 (SELECT COALESCE(MAX(sort_order), 0) + 1 FROM products)) \
         RETURNING id",
    )
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(&product.kind)
    .bind(&product.photo_id)
    .fetch_one(pool)
    .await
}

pub async fn set_product_name(pool: &PgPool, id: i32, name: &str) -> Result<()> {
    sqlx::query("UPDATE products SET name = $1 WHERE id = $2")
        .bind(name)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_product_description(pool: &PgPool, id: i32, description: &str) -> Result<()> {
    sqlx::query("UPDATE products SET description = $1 WHERE id = $2")
        .bind(description)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_product_price(pool: &PgPool, id: i32, price: f64) -> Result<()> {
    sqlx::query("UPDATE products SET price = $1 WHERE id = $2")
        .bind(price)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_product_kind(pool: &PgPool, id: i32, kind: &str) -> Result<()> {
    sqlx::query("UPDATE products SET kind = $1 WHERE id = $2")
        .bind(kind)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_product_photo(pool: &PgPool, id: i32, photo_id: Option<&str>) -> Result<()> {
    sqlx::query("UPDATE products SET photo_id = $1 WHERE id = $2")
        .bind(photo_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_product_page_url(pool: &PgPool, id: i32, page_url: Option<&str>) -> Result<()> {
    sqlx::query("UPDATE products SET page_url = $1 WHERE id = $2")
        .bind(page_url)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn toggle_product_active(pool: &PgPool, id: i32) -> Result<Option<bool>> {
    sqlx::query_scalar::<_, bool>(
        "UPDATE products SET is_active = NOT is_active WHERE id = $1 RETURNING is_active",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_product(pool: &PgPool, id: i32) -> Result<()> {
    sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

// ============ Заявки ============

pub struct NewBooking {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub service_id: Option<i32>,
    pub hours: i32,
    pub people_count: i32,
    pub studio: String,
    pub wishes: String,
}

pub async fn insert_booking(pool: &PgPool, booking: &NewBooking) -> Result<i32> {
    sqlx::query_scalar::<_, i32>(
        "INSERT INTO bookings (user_id, username, first_name, last_name, phone, service_id, \
                               hours, people_count, studio, wishes, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'new') \
         RETURNING id",
    )
    .bind(booking.user_id)
    .bind(&booking.username)
    .bind(&booking.first_name)
    .bind(&booking.last_name)
    .bind(&booking.phone)
    .bind(booking.service_id)
    .bind(booking.hours)
    .bind(booking.people_count)
    .bind(&booking.studio)
    .bind(&booking.wishes)
    .fetch_one(pool)
    .await
}

pub async fn get_booking(pool: &PgPool, id: i32) -> Result<Option<Booking>> {
    sqlx::query_as::<_, Booking>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Свежие заявки, новые сверху.
pub async fn recent_bookings(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Booking>> {
    sqlx::query_as::<_, Booking>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn set_booking_status(pool: &PgPool, id: i32, status: &str) -> Result<()> {
    sqlx::query("UPDATE bookings SET status = $1 WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub struct Stats {
    pub total_bookings: i64,
    pub new_bookings: i64,
    pub confirmed_bookings: i64,
    pub completed_bookings: i64,
    pub cancelled_bookings: i64,
    pub active_services: i64,
    pub active_products: i64,
}

pub async fn collect_stats(pool: &PgPool) -> Result<Stats> {
    let count_by_status = |status: &'static str| {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings WHERE status = $1")
            .bind(status)
            .fetch_one(pool)
    };

    Ok(Stats {
        total_bookings: sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings")
            .fetch_one(pool)
            .await?,
        new_bookings: count_by_status("new").await?,
        confirmed_bookings: count_by_status("confirmed").await?,
        completed_bookings: count_by_status("completed").await?,
        cancelled_bookings: count_by_status("cancelled").await?,
        active_services: sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM services WHERE is_active = TRUE",
        )
        .fetch_one(pool)
        .await?,
        active_products: sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE is_active = TRUE",
        )
        .fetch_one(pool)
        .await?,
    })
}
