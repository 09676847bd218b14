use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::repository::{BookingRepository, RepositoryError};
use super::service::{BookingService, BookingServiceError, BookingSubmission};
use crate::allocation::AllocationError;

/// Router builder exposing the booking endpoints.
pub fn booking_router<R>(service: Arc<BookingService<R>>) -> Router
where
    R: BookingRepository + 'static,
{
    Router::new()
        .route("/api/routes", get(routes_handler::<R>))
        .route("/api/buses", get(buses_handler::<R>))
        .route("/api/bookings", get(bookings_handler::<R>))
        .route("/api/student-bookings", get(student_bookings_handler::<R>))
        .route("/api/book", post(book_handler::<R>))
        .route("/api/allocation", get(allocation_handler::<R>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StudentLookup {
    email: Option<String>,
    student_id: Option<String>,
}

pub(crate) async fn book_handler<R>(
    State(service): State<Arc<BookingService<R>>>,
    Json(submission): Json<BookingSubmission>,
) -> Response
where
    R: BookingRepository + 'static,
{
    match service.book(submission) {
        Ok(booking) => {
            let payload = json!({
                "success": true,
                "message": "Seat Booked Successfully!",
                "booking": booking,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn routes_handler<R>(State(service): State<Arc<BookingService<R>>>) -> Response
where
    R: BookingRepository + 'static,
{
    match service.routes() {
        Ok(routes) => (StatusCode::OK, Json(routes)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn buses_handler<R>(State(service): State<Arc<BookingService<R>>>) -> Response
where
    R: BookingRepository + 'static,
{
    match service.vehicle_statuses() {
        Ok(vehicles) => (StatusCode::OK, Json(vehicles)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn bookings_handler<R>(State(service): State<Arc<BookingService<R>>>) -> Response
where
    R: BookingRepository + 'static,
{
    match service.bookings() {
        Ok(bookings) => (StatusCode::OK, Json(bookings)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn student_bookings_handler<R>(
    State(service): State<Arc<BookingService<R>>>,
    Query(lookup): Query<StudentLookup>,
) -> Response
where
    R: BookingRepository + 'static,
{
    match service.student_bookings(lookup.email.as_deref(), lookup.student_id.as_deref()) {
        Ok(bookings) => (StatusCode::OK, Json(bookings)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn allocation_handler<R>(State(service): State<Arc<BookingService<R>>>) -> Response
where
    R: BookingRepository + 'static,
{
    let policy = service.policy();
    let payload = json!({
        "strategy": policy.key(),
        "label": policy.label(),
    });
    (StatusCode::OK, Json(payload)).into_response()
}

fn error_response(error: BookingServiceError) -> Response {
    let status = match &error {
        BookingServiceError::MissingFields
        | BookingServiceError::MissingLookup
        | BookingServiceError::Allocation(AllocationError::MalformedStudentId { .. }) => {
            StatusCode::BAD_REQUEST
        }
        BookingServiceError::Allocation(AllocationError::DuplicateBooking { .. })
        | BookingServiceError::Allocation(AllocationError::Unavailable { .. })
        | BookingServiceError::Repository(RepositoryError::Conflict { .. }) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}
