//! HTTP request handlers for the string analyzer API.
//!
//! Implements analysis, lookup, filtered listing, natural-language filtering
//! and deletion endpoints using axum.

use crate::error::ApiError;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
    routing::get,
    Router as AxumRouter,
};
use chrono::{DateTime, SecondsFormat, Utc};
use lexis_domain::{analyze, interpret, AnalyzedRecord, FilterSet, Properties, RecordId, RecordStore};
use lexis_store::SqliteStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

const NOT_FOUND: &str = "String does not exist in the system";

/// Path segment of the natural-language route under `/strings`
const NATURAL_LANGUAGE_SEGMENT: &str = "filter-by-natural-language";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Record store, serialized behind a mutex
    pub store: Arc<Mutex<SqliteStore>>,
}

impl AppState {
    /// Wrap a store for sharing across requests
    pub fn new(store: SqliteStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    fn store(&self) -> Result<MutexGuard<'_, SqliteStore>, ApiError> {
        self.store
            .lock()
            .map_err(|_| ApiError::Internal("Record store lock poisoned".to_string()))
    }
}

/// Analyzed string as returned by the API
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringResponse {
    /// SHA-256 of the value
    pub id: String,
    /// Original string
    pub value: String,
    /// Computed properties
    pub properties: Properties,
    /// RFC 3339, second precision
    pub created_at: String,
    /// RFC 3339, second precision
    pub updated_at: String,
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl From<AnalyzedRecord> for StringResponse {
    fn from(record: AnalyzedRecord) -> Self {
        Self {
            id: record.id.to_string(),
            value: record.value,
            properties: record.properties,
            created_at: format_timestamp(&record.created_at),
            updated_at: format_timestamp(&record.updated_at),
        }
    }
}

/// Filtered listing response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    /// Matching records
    pub data: Vec<StringResponse>,
    /// Number of matching records
    pub count: usize,
    /// Filters that were applied
    pub filters_applied: FilterSet,
}

/// How a natural-language query was understood
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpretedQuery {
    /// Query text as received
    pub original: String,
    /// Filters derived from it
    pub parsed_filters: FilterSet,
}

/// Natural-language filtering response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NaturalLanguageResponse {
    /// Matching records
    pub data: Vec<StringResponse>,
    /// Number of matching records
    pub count: usize,
    /// Interpretation of the query
    pub interpreted_query: InterpretedQuery,
}

/// Welcome message
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message text
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
    /// Number of stored strings
    pub record_count: usize,
}

/// Query parameters for GET /strings
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// Exact palindrome flag
    #[serde(alias = "is_palindrome")]
    pub is_palindrome: Option<bool>,
    /// Inclusive minimum length
    #[serde(alias = "min_length")]
    pub min_length: Option<usize>,
    /// Inclusive maximum length
    #[serde(alias = "max_length")]
    pub max_length: Option<usize>,
    /// Exact word count
    #[serde(alias = "word_count")]
    pub word_count: Option<usize>,
    /// Single character to look for
    #[serde(alias = "contains_character")]
    pub contains_character: Option<String>,
}

impl ListParams {
    /// Validate parameters into a filter set
    pub fn into_filters(self) -> Result<FilterSet, ApiError> {
        let mut filters = FilterSet {
            is_palindrome: self.is_palindrome,
            min_length: self.min_length,
            max_length: self.max_length,
            word_count: self.word_count,
            contains_character: None,
        };

        filters
            .check_lengths()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        if let Some(raw) = self.contains_character {
            filters
                .set_contains_character(&raw)
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        }

        Ok(filters)
    }
}

/// Query parameters for the natural-language endpoint
#[derive(Debug, Default, Deserialize)]
pub struct NaturalLanguageParams {
    /// Query text
    pub query: Option<String>,
    /// Short alias for `query`
    pub q: Option<String>,
}

/// Pull the `value` field out of a create payload
///
/// A missing field is a 400; anything present but not a string is a 422.
fn extract_value(body: Value) -> Result<String, ApiError> {
    let Value::Object(mut object) = body else {
        return Err(ApiError::Unprocessable(
            "Request body must be a JSON object".to_string(),
        ));
    };

    match object.remove("value") {
        None => Err(ApiError::BadRequest("Missing 'value' field".to_string())),
        Some(Value::String(value)) => Ok(value),
        Some(_) => Err(ApiError::Unprocessable("'value' must be a string".to_string())),
    }
}

/// GET / - Welcome message
async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Welcome to String Analyzer API!".to_string(),
    })
}

/// GET /health - Store health check
async fn health_check(State(state): State<AppState>) -> Result<Json<HealthCheckResponse>, ApiError> {
    let record_count = state.store()?.count()?;

    Ok(Json(HealthCheckResponse {
        status: "healthy".to_string(),
        record_count,
    }))
}

/// POST /strings - Analyze and store a string
async fn create_string(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<StringResponse>), ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::Unprocessable(e.body_text()))?;
    let value = extract_value(body)?;

    let properties = analyze(&value);
    let id = RecordId::for_value(&value);

    let mut store = state.store()?;
    if store.get_by_id(&id)?.is_some() {
        return Err(ApiError::Conflict(
            "String already exists in the system".to_string(),
        ));
    }

    let record = store.create(&id, &value, properties)?;
    info!(id = %record.id, "Stored new string");

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// GET /strings/:value - Fetch a stored string
async fn get_string(
    State(state): State<AppState>,
    Path(value): Path<String>,
) -> Result<Json<StringResponse>, ApiError> {
    let record = state
        .store()?
        .get_by_value(&value)?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    Ok(Json(record.into()))
}

/// GET /strings - List stored strings matching query-parameter filters
async fn list_strings(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ListResponse>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::Unprocessable(e.body_text()))?;
    let filters = params.into_filters()?;

    let records = state.store()?.list_filtered(&filters)?;
    debug!(count = records.len(), ?filters, "Listed strings");

    let data: Vec<StringResponse> = records.into_iter().map(Into::into).collect();
    Ok(Json(ListResponse {
        count: data.len(),
        data,
        filters_applied: filters,
    }))
}

/// GET /strings/filter-by-natural-language - List strings matching a plain English query
async fn filter_by_natural_language(
    State(state): State<AppState>,
    Query(params): Query<NaturalLanguageParams>,
) -> Result<Json<NaturalLanguageResponse>, ApiError> {
    let original = params
        .query
        .filter(|q| !q.is_empty())
        .or(params.q.filter(|q| !q.is_empty()))
        .ok_or_else(|| ApiError::BadRequest("Missing 'query' parameter".to_string()))?;

    let interpretation = interpret(&original)?;
    debug!(rules = ?interpretation.matched_rules, "Interpreted query {:?}", original);

    // The interpreter already rejects this; kept as a second line of defense.
    let filters = interpretation.filters;
    filters.check_lengths().map_err(|e| {
        ApiError::Unprocessable(format!("Parsed filters conflict: {}", e))
    })?;

    let records = state.store()?.list_filtered(&filters)?;
    let data: Vec<StringResponse> = records.into_iter().map(Into::into).collect();

    Ok(Json(NaturalLanguageResponse {
        count: data.len(),
        data,
        interpreted_query: InterpretedQuery {
            original,
            parsed_filters: filters,
        },
    }))
}

/// DELETE /strings/:value - Remove a stored string
async fn delete_string(
    State(state): State<AppState>,
    Path(value): Path<String>,
) -> Result<StatusCode, ApiError> {
    remove(&state, &value)
}

/// DELETE /strings/filter-by-natural-language - The static GET route shadows
/// `/strings/:value` for this one value, so its DELETE is routed here
async fn delete_shadowed_string(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    remove(&state, NATURAL_LANGUAGE_SEGMENT)
}

fn remove(state: &AppState, value: &str) -> Result<StatusCode, ApiError> {
    if !state.store()?.delete(value)? {
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }

    info!("Deleted string");
    Ok(StatusCode::NO_CONTENT)
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    AxumRouter::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/strings", get(list_strings).post(create_string))
        .route(
            "/strings/filter-by-natural-language",
            get(filter_by_natural_language).delete(delete_shadowed_string),
        )
        .route("/strings/:value", get(get_string).delete(delete_string))
        .with_state(state)
}
