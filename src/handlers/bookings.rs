use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::errors::{AppError, FieldError};
use crate::models::{Booking, BookingDetails, BookingStatus, Guests, PaymentStatus};
use crate::services::{auth, pricing};
use crate::state::AppState;
use crate::store::Store;

// POST /api/bookings
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub hotel_id: String,
    pub room_id: String,
    pub check_in_date: String,
    pub check_out_date: String,
    pub guests: GuestsRequest,
}

#[derive(Deserialize)]
pub struct GuestsRequest {
    pub adults: i64,
    pub children: i64,
}

/// Boundary validation runs in full before any lookup or write, so a bad
/// request never leaves a partial booking behind.
fn validate_dates(body: &CreateBookingRequest) -> Result<(NaiveDate, NaiveDate), Vec<FieldError>> {
    let mut errors = vec![];

    let check_in = NaiveDate::parse_from_str(&body.check_in_date, "%Y-%m-%d");
    if check_in.is_err() {
        errors.push(FieldError::new(
            "checkInDate",
            "must be a date in YYYY-MM-DD format",
        ));
    }
    let check_out = NaiveDate::parse_from_str(&body.check_out_date, "%Y-%m-%d");
    if check_out.is_err() {
        errors.push(FieldError::new(
            "checkOutDate",
            "must be a date in YYYY-MM-DD format",
        ));
    }

    if let (Ok(check_in), Ok(check_out)) = (check_in, check_out) {
        if check_out <= check_in {
            errors.push(FieldError::new(
                "checkOutDate",
                "check-out must be after check-in",
            ));
        } else if errors.is_empty() {
            return Ok((check_in, check_out));
        }
    }

    Err(errors)
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingDetails>), AppError> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;

    let mut errors = vec![];
    if body.guests.adults < 1 {
        errors.push(FieldError::new("guests.adults", "at least 1 adult required"));
    }
    if body.guests.children < 0 {
        errors.push(FieldError::new("guests.children", "must not be negative"));
    }
    let dates = validate_dates(&body);
    let (check_in, check_out) = match dates {
        Ok(pair) if errors.is_empty() => pair,
        Ok(_) => return Err(AppError::Validation(errors)),
        Err(mut date_errors) => {
            errors.append(&mut date_errors);
            return Err(AppError::Validation(errors));
        }
    };

    // Fail closed: an unknown hotel or room, or a room that belongs to a
    // different hotel, rejects the booking before anything is written.
    let hotel = state
        .store
        .get_hotel(&body.hotel_id)
        .await?
        .ok_or_else(|| AppError::NotFound("hotel or room not found".to_string()))?;
    let room = state
        .store
        .get_room(&body.room_id)
        .await?
        .filter(|r| r.hotel_id == hotel.id)
        .ok_or_else(|| AppError::NotFound("hotel or room not found".to_string()))?;

    let nights = pricing::nights(check_in, check_out);
    let total_amount = pricing::total_amount(nights, room.price_per_night);

    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: claims.sub,
        hotel_id: hotel.id.clone(),
        room_id: room.id.clone(),
        booking_reference: pricing::booking_reference(),
        check_in_date: check_in,
        check_out_date: check_out,
        guests: Guests {
            adults: body.guests.adults,
            children: body.guests.children,
        },
        total_amount,
        status: BookingStatus::Confirmed,
        payment_status: PaymentStatus::Paid,
        payment_method: "UPI".to_string(),
        created_at: Utc::now().naive_utc(),
    };

    state.store.create_booking(&booking).await?;
    tracing::info!(
        "created booking {} ({} nights, total {})",
        booking.booking_reference,
        nights,
        total_amount
    );

    Ok((
        StatusCode::CREATED,
        Json(BookingDetails {
            booking,
            hotel,
            room,
        }),
    ))
}

// GET /api/bookings/my
pub async fn my_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<BookingDetails>>, AppError> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;
    let bookings = state.store.bookings_for_user(&claims.sub).await?;
    Ok(Json(bookings))
}
