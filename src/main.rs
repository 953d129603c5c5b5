//! Back-office Sales - HTTP API for the admin panel

use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, patch, post}, Json, Router};
use backoffice_sales::{config::Config, dto::{category_name, CreateCategoryRequest, CreateProductRequest, CreateSaleRequest, GenerateSaleRequest, ProductsQuery, SalesQuery, UpdateCategoryRequest, UpdateProductRequest, UpdateSaleRequest, UpdateSaleStatusRequest}, infrastructure::{postgres::contains_pattern, PgStore}, repository::SaleRecord, Sale, SalesError, SalesService};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductRow {
    pub id: String, pub name: String, pub description: Option<String>, pub category_id: String,
    pub price: Decimal, pub options: serde_json::Value, pub created_at: DateTime<Utc>, pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category { pub id: String, pub name: String, pub position: i32, pub created_at: DateTime<Utc> }

#[derive(Clone)] pub struct AppState { pub db: sqlx::PgPool, pub sales: Arc<SalesService> }

type ApiResult<T> = std::result::Result<T, (StatusCode, String)>;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = Config::from_env()?;
    let db = PgPoolOptions::new().max_connections(config.db_max_connections).connect(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let store = Arc::new(PgStore::new(db.clone()));
    let mut sales = SalesService::new(store.clone(), store, config.sale_defaults.clone());
    if let Some(url) = &config.nats_url {
        match async_nats::connect(url.as_str()).await {
            Ok(client) => sales = sales.with_events(client),
            Err(e) => tracing::warn!(error = %e, "NATS unavailable, sale events disabled"),
        }
    }
    let state = AppState { db, sales: Arc::new(sales) };

    let app = Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "backoffice-sales"})) }))
        .route("/api/v1/categories", get(list_categories).post(create_category))
        .route("/api/v1/categories/:id", get(get_category).patch(update_category).delete(delete_category))
        .route("/api/v1/products", get(list_products).post(create_product))
        .route("/api/v1/products/:id", get(get_product).patch(update_product).delete(delete_product))
        .route("/api/v1/sales", get(list_sales).post(create_sale))
        .route("/api/v1/sales/generate", post(generate_sale))
        .route("/api/v1/sales/:id", get(get_sale).patch(update_sale).delete(delete_sale))
        .route("/api/v1/sales/:id/status", patch(update_sale_status))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive())).with_state(state);

    tracing::info!("🚀 Back-office sales listening on {}", config.listen_addr());
    axum::serve(tokio::net::TcpListener::bind(config.listen_addr()).await?, app).await?;
    Ok(())
}

fn api_error(e: SalesError) -> (StatusCode, String) {
    let status = if e.is_validation() { StatusCode::BAD_REQUEST } else if e.is_not_found() { StatusCode::NOT_FOUND } else { StatusCode::INTERNAL_SERVER_ERROR };
    (status, e.to_string())
}

fn db_error(e: sqlx::Error) -> (StatusCode, String) { api_error(e.into()) }

fn changed_by(headers: &HeaderMap) -> Option<&str> { headers.get("x-changed-by").and_then(|v| v.to_str().ok()).filter(|v| !v.trim().is_empty()) }

async fn list_categories(State(s): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    let cats = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY position, name").fetch_all(&s.db).await.map_err(db_error)?;
    Ok(Json(cats))
}

async fn get_category(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Category>> {
    sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1").bind(&id).fetch_optional(&s.db).await.map_err(db_error)?
        .map(Json).ok_or_else(|| api_error(SalesError::CategoryNotFound(id)))
}

async fn ensure_unique_category(db: &sqlx::PgPool, name: &str, exclude: Option<&str>) -> ApiResult<()> {
    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM categories WHERE LOWER(name) = LOWER($1) AND ($2::text IS NULL OR id <> $2)")
        .bind(name).bind(exclude).fetch_optional(db).await.map_err(db_error)?;
    if existing.is_some() { return Err(api_error(SalesError::Validation(format!("a category named {} already exists", name)))); }
    Ok(())
}

async fn create_category(State(s): State<AppState>, Json(r): Json<CreateCategoryRequest>) -> ApiResult<(StatusCode, Json<Category>)> {
    r.validate().map_err(|e| api_error(e.into()))?;
    let name = category_name(&r.name).map_err(api_error)?;
    ensure_unique_category(&s.db, &name, None).await?;
    let c = sqlx::query_as::<_, Category>("INSERT INTO categories (id, name, position, created_at) VALUES ($1, $2, $3, NOW()) RETURNING *")
        .bind(Uuid::now_v7().to_string()).bind(&name).bind(r.position.unwrap_or(0))
        .fetch_one(&s.db).await.map_err(db_error)?;
    Ok((StatusCode::CREATED, Json(c)))
}

async fn update_category(State(s): State<AppState>, Path(id): Path<String>, Json(r): Json<UpdateCategoryRequest>) -> ApiResult<Json<Category>> {
    r.validate().map_err(|e| api_error(e.into()))?;
    let name = r.name.as_deref().map(category_name).transpose().map_err(api_error)?;
    if let Some(name) = &name { ensure_unique_category(&s.db, name, Some(&id)).await?; }
    sqlx::query_as::<_, Category>("UPDATE categories SET name = COALESCE($2, name), position = COALESCE($3, position) WHERE id = $1 RETURNING *")
        .bind(&id).bind(name).bind(r.position).fetch_optional(&s.db).await.map_err(db_error)?
        .map(Json).ok_or_else(|| api_error(SalesError::CategoryNotFound(id)))
}

async fn delete_category(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    let product: Option<(String,)> = sqlx::query_as("SELECT id FROM products WHERE category_id = $1 LIMIT 1").bind(&id).fetch_optional(&s.db).await.map_err(db_error)?;
    if product.is_some() { return Err(api_error(SalesError::Validation(format!("category {} still has products", id)))); }
    let deleted = sqlx::query("DELETE FROM categories WHERE id = $1").bind(&id).execute(&s.db).await.map_err(db_error)?;
    if deleted.rows_affected() == 0 { return Err(api_error(SalesError::CategoryNotFound(id))); }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_products(State(s): State<AppState>, Query(p): Query<ProductsQuery>) -> ApiResult<Json<Vec<ProductRow>>> {
    let search = p.search.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(contains_pattern);
    let products = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE ($1::text IS NULL OR name ILIKE $1) AND ($2::text IS NULL OR category_id = $2) ORDER BY created_at DESC")
        .bind(search).bind(p.category_id).fetch_all(&s.db).await.map_err(db_error)?;
    Ok(Json(products))
}

async fn get_product(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<ProductRow>> {
    sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1").bind(&id).fetch_optional(&s.db).await.map_err(db_error)?
        .map(Json).ok_or_else(|| api_error(SalesError::ProductNotFound(id)))
}

async fn ensure_category(db: &sqlx::PgPool, id: &str) -> ApiResult<()> {
    let category: Option<(String,)> = sqlx::query_as("SELECT id FROM categories WHERE id = $1").bind(id).fetch_optional(db).await.map_err(db_error)?;
    if category.is_none() { return Err((StatusCode::BAD_REQUEST, SalesError::CategoryNotFound(id.to_string()).to_string())); }
    Ok(())
}

fn option_list(options: serde_json::Value) -> serde_json::Value { if options.is_null() { serde_json::json!([]) } else { options } }

async fn create_product(State(s): State<AppState>, Json(r): Json<CreateProductRequest>) -> ApiResult<(StatusCode, Json<ProductRow>)> {
    r.validate().map_err(|e| api_error(e.into()))?;
    ensure_category(&s.db, &r.category_id).await?;
    let p = sqlx::query_as::<_, ProductRow>("INSERT INTO products (id, name, description, category_id, price, options, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW()) RETURNING *")
        .bind(Uuid::now_v7().to_string()).bind(r.name.trim()).bind(&r.description).bind(&r.category_id).bind(r.price).bind(option_list(r.options))
        .fetch_one(&s.db).await.map_err(db_error)?;
    Ok((StatusCode::CREATED, Json(p)))
}

/// Stored sales keep their price snapshot; only future generations see a new price.
async fn update_product(State(s): State<AppState>, Path(id): Path<String>, Json(r): Json<UpdateProductRequest>) -> ApiResult<Json<ProductRow>> {
    r.validate().map_err(|e| api_error(e.into()))?;
    if let Some(category_id) = &r.category_id { ensure_category(&s.db, category_id).await?; }
    sqlx::query_as::<_, ProductRow>("UPDATE products SET name = COALESCE($2, name), description = COALESCE($3, description), category_id = COALESCE($4, category_id), price = COALESCE($5, price), options = COALESCE($6, options), updated_at = NOW() WHERE id = $1 RETURNING *")
        .bind(&id).bind(r.name.as_deref().map(str::trim)).bind(&r.description).bind(&r.category_id).bind(r.price).bind(r.options.map(option_list))
        .fetch_optional(&s.db).await.map_err(db_error)?
        .map(Json).ok_or_else(|| api_error(SalesError::ProductNotFound(id)))
}

async fn delete_product(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    let sold: Option<(String,)> = sqlx::query_as("SELECT id FROM sale_items WHERE product_id = $1 LIMIT 1").bind(&id).fetch_optional(&s.db).await.map_err(db_error)?;
    if sold.is_some() { return Err(api_error(SalesError::Validation(format!("product {} is part of a sale", id)))); }
    let deleted = sqlx::query("DELETE FROM products WHERE id = $1").bind(&id).execute(&s.db).await.map_err(db_error)?;
    if deleted.rows_affected() == 0 { return Err(api_error(SalesError::ProductNotFound(id))); }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_sales(State(s): State<AppState>, Query(q): Query<SalesQuery>) -> ApiResult<Json<Vec<Sale>>> {
    s.sales.list(q.search.as_deref()).await.map(Json).map_err(api_error)
}

async fn get_sale(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<SaleRecord>> {
    s.sales.find(&id).await.map(Json).map_err(api_error)
}

async fn generate_sale(State(s): State<AppState>, headers: HeaderMap, Json(r): Json<GenerateSaleRequest>) -> ApiResult<(StatusCode, Json<Sale>)> {
    let sale = s.sales.generate(&r, changed_by(&headers)).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(sale)))
}

async fn create_sale(State(s): State<AppState>, headers: HeaderMap, Json(r): Json<CreateSaleRequest>) -> ApiResult<(StatusCode, Json<Sale>)> {
    let sale = s.sales.create(r, changed_by(&headers)).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(sale)))
}

async fn update_sale(State(s): State<AppState>, Path(id): Path<String>, headers: HeaderMap, Json(r): Json<UpdateSaleRequest>) -> ApiResult<Json<Sale>> {
    s.sales.update(&id, r, changed_by(&headers)).await.map(Json).map_err(api_error)
}

async fn delete_sale(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    s.sales.delete(&id).await.map(|_| StatusCode::NO_CONTENT).map_err(api_error)
}

async fn update_sale_status(State(s): State<AppState>, Path(id): Path<String>, headers: HeaderMap, Json(r): Json<UpdateSaleStatusRequest>) -> ApiResult<Json<Sale>> {
    s.sales.update_status(&id, r, changed_by(&headers)).await.map(Json).map_err(api_error)
}
