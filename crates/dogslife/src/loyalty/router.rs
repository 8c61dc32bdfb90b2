use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Cents, CustomerId, NewCustomer, RequirementId, StaffId};
use super::repository::{CustomerDirectory, RepositoryError, TransactionLog};
use super::reporting::{ReportFilter, ReportPeriod};
use super::service::{LoyaltyService, ServiceError};

/// Router builder exposing the loyalty endpoints over a service instance.
pub fn loyalty_router<C, T>(service: Arc<LoyaltyService<C, T>>) -> Router
where
    C: CustomerDirectory + 'static,
    T: TransactionLog + 'static,
{
    Router::new()
        .route("/api/v1/customers", post(create_customer::<C, T>))
        .route("/api/v1/customers/:customer_id", get(account::<C, T>))
        .route(
            "/api/v1/customers/:customer_id/topups",
            post(book_topup::<C, T>),
        )
        .route(
            "/api/v1/customers/:customer_id/debits",
            post(book_debit::<C, T>),
        )
        .route(
            "/api/v1/customers/:customer_id/events",
            post(record_event::<C, T>),
        )
        .route(
            "/api/v1/customers/:customer_id/level-up",
            post(advance_level::<C, T>),
        )
        .route("/api/v1/customers/:customer_id/vip", put(set_vip::<C, T>))
        .route(
            "/api/v1/customers/:customer_id/expert",
            put(set_expert::<C, T>),
        )
        .route("/api/v1/topups/quote", get(quote_topup::<C, T>))
        .route("/api/v1/reports/revenue", get(revenue_report::<C, T>))
        .route("/api/v1/reports/periods", get(report_periods::<C, T>))
        .with_state(service)
}

fn error_response(error: ServiceError) -> Response {
    let status = match &error {
        ServiceError::UnknownCustomer => StatusCode::NOT_FOUND,
        ServiceError::Booking(_) | ServiceError::Progression(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ServiceError::Repository(RepositoryError::VersionConflict { .. }) => StatusCode::CONFLICT,
        ServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}

fn ok_account(result: Result<super::views::AccountView, ServiceError>) -> Response {
    match result {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateCustomerRequest {
    #[serde(flatten)]
    pub(crate) intake: NewCustomer,
    pub(crate) created_by: StaffId,
}

async fn create_customer<C, T>(
    State(service): State<Arc<LoyaltyService<C, T>>>,
    Json(request): Json<CreateCustomerRequest>,
) -> Response
where
    C: CustomerDirectory + 'static,
    T: TransactionLog + 'static,
{
    match service.create_customer(request.intake, request.created_by) {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn account<C, T>(
    State(service): State<Arc<LoyaltyService<C, T>>>,
    Path(customer_id): Path<String>,
) -> Response
where
    C: CustomerDirectory + 'static,
    T: TransactionLog + 'static,
{
    ok_account(service.account(&CustomerId(customer_id)))
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopupRequest {
    pub(crate) booked_by: StaffId,
    pub(crate) base_cents: Cents,
    #[serde(default)]
    pub(crate) booked_at: Option<DateTime<Utc>>,
}

async fn book_topup<C, T>(
    State(service): State<Arc<LoyaltyService<C, T>>>,
    Path(customer_id): Path<String>,
    Json(request): Json<TopupRequest>,
) -> Response
where
    C: CustomerDirectory + 'static,
    T: TransactionLog + 'static,
{
    let now = request.booked_at.unwrap_or_else(Utc::now);
    ok_account(service.book_topup(
        &CustomerId(customer_id),
        request.booked_by,
        request.base_cents,
        now,
    ))
}

/// A debit is either a priced catalog booking (`requirement_id` set) or a
/// free-form one (`title` + `amount_cents`).
#[derive(Debug, Deserialize)]
pub(crate) struct DebitRequest {
    pub(crate) booked_by: StaffId,
    #[serde(default)]
    pub(crate) requirement_id: Option<RequirementId>,
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) amount_cents: Option<Cents>,
    #[serde(default)]
    pub(crate) booked_at: Option<DateTime<Utc>>,
}

async fn book_debit<C, T>(
    State(service): State<Arc<LoyaltyService<C, T>>>,
    Path(customer_id): Path<String>,
    Json(request): Json<DebitRequest>,
) -> Response
where
    C: CustomerDirectory + 'static,
    T: TransactionLog + 'static,
{
    let customer_id = CustomerId(customer_id);
    let now = request.booked_at.unwrap_or_else(Utc::now);

    let result = match request.requirement_id {
        Some(requirement) => {
            service.book_preset_debit(&customer_id, request.booked_by, &requirement, now)
        }
        None => {
            let (Some(title), Some(amount_cents)) = (request.title, request.amount_cents) else {
                let payload =
                    json!({ "error": "custom debit requires title and amount_cents" });
                return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
            };
            service.book_custom_debit(&customer_id, request.booked_by, title, amount_cents, now)
        }
    };
    ok_account(result)
}

#[derive(Debug, Deserialize)]
pub(crate) struct EventRequest {
    pub(crate) booked_by: StaffId,
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) requirement_id: Option<RequirementId>,
    #[serde(default)]
    pub(crate) booked_at: Option<DateTime<Utc>>,
}

async fn record_event<C, T>(
    State(service): State<Arc<LoyaltyService<C, T>>>,
    Path(customer_id): Path<String>,
    Json(request): Json<EventRequest>,
) -> Response
where
    C: CustomerDirectory + 'static,
    T: TransactionLog + 'static,
{
    let now = request.booked_at.unwrap_or_else(Utc::now);
    ok_account(service.record_event(
        &CustomerId(customer_id),
        request.booked_by,
        request.title,
        request.requirement_id,
        now,
    ))
}

async fn advance_level<C, T>(
    State(service): State<Arc<LoyaltyService<C, T>>>,
    Path(customer_id): Path<String>,
) -> Response
where
    C: CustomerDirectory + 'static,
    T: TransactionLog + 'static,
{
    ok_account(service.advance_level(&CustomerId(customer_id), Utc::now()))
}

#[derive(Debug, Deserialize)]
pub(crate) struct VipRequest {
    pub(crate) is_vip: bool,
}

async fn set_vip<C, T>(
    State(service): State<Arc<LoyaltyService<C, T>>>,
    Path(customer_id): Path<String>,
    Json(request): Json<VipRequest>,
) -> Response
where
    C: CustomerDirectory + 'static,
    T: TransactionLog + 'static,
{
    ok_account(service.set_vip(&CustomerId(customer_id), request.is_vip))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExpertRequest {
    pub(crate) is_expert: bool,
}

async fn set_expert<C, T>(
    State(service): State<Arc<LoyaltyService<C, T>>>,
    Path(customer_id): Path<String>,
    Json(request): Json<ExpertRequest>,
) -> Response
where
    C: CustomerDirectory + 'static,
    T: TransactionLog + 'static,
{
    ok_account(service.set_expert(&CustomerId(customer_id), request.is_expert))
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuoteQuery {
    pub(crate) base_cents: Cents,
}

async fn quote_topup<C, T>(
    State(service): State<Arc<LoyaltyService<C, T>>>,
    Query(query): Query<QuoteQuery>,
) -> Response
where
    C: CustomerDirectory + 'static,
    T: TransactionLog + 'static,
{
    match service.quote_topup(query.base_cents) {
        Ok(quote) => (StatusCode::OK, Json(quote)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RevenueQuery {
    /// `YYYY` or `YYYY-MM`.
    pub(crate) period: String,
    #[serde(default)]
    pub(crate) staff: Option<String>,
}

async fn revenue_report<C, T>(
    State(service): State<Arc<LoyaltyService<C, T>>>,
    Query(query): Query<RevenueQuery>,
) -> Response
where
    C: CustomerDirectory + 'static,
    T: TransactionLog + 'static,
{
    let Some(period) = ReportPeriod::parse(&query.period) else {
        let payload = json!({ "error": format!("invalid period '{}'", query.period) });
        return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
    };
    let filter = ReportFilter {
        period,
        staff: query.staff.map(StaffId),
    };
    match service.revenue_report(&filter) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn report_periods<C, T>(State(service): State<Arc<LoyaltyService<C, T>>>) -> Response
where
    C: CustomerDirectory + 'static,
    T: TransactionLog + 'static,
{
    match service.report_periods() {
        Ok(periods) => (StatusCode::OK, Json(periods)).into_response(),
        Err(error) => error_response(error),
    }
}
