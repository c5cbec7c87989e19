//! advperm HTTP server
//!
//! REST API over the rule store, the cache, the updater queue and the mail
//! configuration check view.
//!
//! Run with: cargo run --release --features server --bin advperm-server

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::cache::{self, CachedRule};
use crate::conditions::ConditionGroup;
use crate::error::AdvPermError;
use crate::links::Link;
use crate::member::Member;
use crate::rule::{Field, PermissionRule};
use crate::services::Services;
use crate::updater::{self, UpdaterEntry};
use crate::view::{self, CheckConfigView, MailSettingsCheck, Output, Request, View};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RuleInput {
    name: String,
    tabid: u64,
    #[serde(default)]
    status: u8,
    #[serde(default)]
    action: u8,
    #[serde(default)]
    priority: u8,
    #[serde(default)]
    conditions: Option<ConditionGroup>,
    #[serde(default)]
    members: Vec<Member>,
}

impl RuleInput {
    fn apply(self, rule: &mut PermissionRule) {
        rule.name = self.name;
        rule.tabid = self.tabid;
        rule.status = self.status;
        rule.action = self.action;
        rule.priority = self.priority;
        rule.conditions = self.conditions;
        rule.members = self.members;
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    fn err(msg: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(msg.into()) }
    }
}

#[derive(Debug, Serialize)]
struct RuleView {
    #[serde(flatten)]
    rule: PermissionRule,
    display: BTreeMap<&'static str, String>,
}

#[derive(Debug, Serialize)]
struct UserLabel {
    id: u64,
    label: String,
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    removed: bool,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    cache_generation: u64,
    missing_mail_settings: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ModulePending {
    module: String,
    pending: bool,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<AdvPermError> for ApiError {
    fn from(e: AdvPermError) -> Self {
        let status = match e {
            AdvPermError::RuleNotFound(_) => StatusCode::NOT_FOUND,
            AdvPermError::InvalidMember(_) | AdvPermError::UnknownField(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %e, "request failed");
        }
        ApiError { status, message: e.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::err(self.message))).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

// ============================================================================
// App State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    services: Services,
    check_config: Arc<dyn View + Send + Sync>,
    missing_mail_settings: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(services: Services, mail: MailSettingsCheck) -> Self {
        let missing: Vec<String> = mail.missing().into_iter().map(String::from).collect();
        if !missing.is_empty() {
            tracing::warn!(?missing, "mail settings not configured");
        }
        AppState {
            services,
            check_config: Arc::new(CheckConfigView::new(mail)),
            missing_mail_settings: Arc::new(missing),
        }
    }
}

fn load(id: u64) -> std::result::Result<PermissionRule, ApiError> {
    Ok(PermissionRule::get_instance(id)?.ok_or(AdvPermError::RuleNotFound(id))?)
}

fn display_map(rule: &PermissionRule, services: &Services) -> BTreeMap<&'static str, String> {
    Field::ALL
        .into_iter()
        .map(|f| (f.as_str(), rule.display_value(f, services)))
        .collect()
}

// ============================================================================
// Handlers
// ============================================================================

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache_generation: cache::generation(),
        missing_mail_settings: state.missing_mail_settings.as_ref().clone(),
    })
}

async fn list_rules(State(state): State<AppState>) -> ApiResult<Vec<RuleView>> {
    let rules = PermissionRule::all()?
        .into_iter()
        .map(|rule| RuleView { display: display_map(&rule, &state.services), rule })
        .collect();
    Ok(Json(ApiResponse::ok(rules)))
}

async fn create_rule(
    State(state): State<AppState>,
    Json(input): Json<RuleInput>,
) -> ApiResult<PermissionRule> {
    let mut rule = PermissionRule::new(String::new(), 0);
    input.apply(&mut rule);
    rule.save(&state.services)?;
    Ok(Json(ApiResponse::ok(rule)))
}

async fn get_rule(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<RuleView> {
    let rule = load(id)?;
    Ok(Json(ApiResponse::ok(RuleView { display: display_map(&rule, &state.services), rule })))
}

async fn update_rule(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<RuleInput>,
) -> ApiResult<PermissionRule> {
    let mut rule = load(id)?;
    input.apply(&mut rule);
    rule.save(&state.services)?;
    Ok(Json(ApiResponse::ok(rule)))
}

async fn delete_rule(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<DeleteResponse> {
    let removed = load(id)?.delete(&state.services)?;
    Ok(Json(ApiResponse::ok(DeleteResponse { removed })))
}

async fn rule_display_all(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<BTreeMap<&'static str, String>> {
    Ok(Json(ApiResponse::ok(display_map(&load(id)?, &state.services))))
}

async fn rule_display(
    State(state): State<AppState>,
    Path((id, field)): Path<(u64, String)>,
) -> ApiResult<String> {
    let field: Field = field.parse()?;
    Ok(Json(ApiResponse::ok(load(id)?.display_value(field, &state.services))))
}

async fn rule_users(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<Vec<UserLabel>> {
    let users = load(id)?
        .user_by_member(state.services.directory.as_ref())
        .into_iter()
        .map(|(id, label)| UserLabel { id, label })
        .collect();
    Ok(Json(ApiResponse::ok(users)))
}

async fn rule_links(Path(id): Path<u64>) -> ApiResult<Vec<Link>> {
    Ok(Json(ApiResponse::ok(load(id)?.record_links())))
}

async fn module_cache(Path(tabid): Path<u64>) -> Json<ApiResponse<Vec<CachedRule>>> {
    Json(ApiResponse::ok(cache::rules_for_module(tabid)))
}

async fn pending_updates() -> ApiResult<Vec<UpdaterEntry>> {
    Ok(Json(ApiResponse::ok(updater::pending()?)))
}

async fn module_pending(Path(module): Path<String>) -> ApiResult<ModulePending> {
    let pending = updater::is_pending(&module)?;
    Ok(Json(ApiResponse::ok(ModulePending { module, pending })))
}

async fn check_config(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Output> {
    let req = Request::from(params);
    Ok(Json(ApiResponse::ok(view::dispatch(state.check_config.as_ref(), &req)?)))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rules", get(list_rules).post(create_rule))
        .route("/rules/:id", get(get_rule).put(update_rule).delete(delete_rule))
        .route("/rules/:id/display", get(rule_display_all))
        .route("/rules/:id/display/:field", get(rule_display))
        .route("/rules/:id/users", get(rule_users))
        .route("/rules/:id/links", get(rule_links))
        .route("/modules/:tabid/cache", get(module_cache))
        .route("/updater", get(pending_updates))
        .route("/updater/:module", get(module_pending))
        .route("/mail/check-config", get(check_config))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Install the tracing subscriber; `RUST_LOG` wins over `default_level`
pub fn init_logger(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
