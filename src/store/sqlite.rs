use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingDetails, Hotel, Room, User};
use crate::store::{HotelFilter, Store};

/// SQLite adapter. Predicates are pushed into SQL where the substrate
/// supports them; amenity superset matching runs on the fetched rows.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

/// Unique-constraint hits surface as Conflict so a duplicate booking
/// reference or email is rejected, never overwritten.
fn map_db_err(e: anyhow::Error) -> AppError {
    if let Some(rusqlite::Error::SqliteFailure(failure, _)) = e.downcast_ref::<rusqlite::Error>() {
        if failure.code == rusqlite::ErrorCode::ConstraintViolation {
            return AppError::Conflict("duplicate value".to_string());
        }
    }
    AppError::Database(e)
}

#[async_trait]
impl Store for SqliteStore {
    async fn list_hotels(&self, filter: &HotelFilter) -> Result<Vec<Hotel>, AppError> {
        let conn = self.conn.lock().unwrap();
        let mut hotels = queries::list_hotels(&conn, filter).map_err(map_db_err)?;
        if !filter.amenities.is_empty() {
            hotels.retain(|h| filter.matches_amenities(&h.amenities));
        }
        Ok(hotels)
    }

    async fn featured_hotels(&self, limit: i64) -> Result<Vec<Hotel>, AppError> {
        let conn = self.conn.lock().unwrap();
        queries::featured_hotels(&conn, limit).map_err(map_db_err)
    }

    async fn get_hotel(&self, id: &str) -> Result<Option<Hotel>, AppError> {
        let conn = self.conn.lock().unwrap();
        queries::get_hotel(&conn, id).map_err(map_db_err)
    }

    async fn insert_hotel(&self, hotel: &Hotel) -> Result<(), AppError> {
        let conn = self.conn.lock().unwrap();
        queries::insert_hotel(&conn, hotel).map_err(map_db_err)
    }

    async fn rooms_for_hotel(&self, hotel_id: &str) -> Result<Vec<Room>, AppError> {
        let conn = self.conn.lock().unwrap();
        queries::rooms_for_hotel(&conn, hotel_id).map_err(map_db_err)
    }

    async fn get_room(&self, id: &str) -> Result<Option<Room>, AppError> {
        let conn = self.conn.lock().unwrap();
        queries::get_room(&conn, id).map_err(map_db_err)
    }

    async fn insert_room(&self, room: &Room) -> Result<(), AppError> {
        let conn = self.conn.lock().unwrap();
        queries::insert_room(&conn, room).map_err(map_db_err)
    }

    async fn create_booking(&self, booking: &Booking) -> Result<(), AppError> {
        let conn = self.conn.lock().unwrap();
        queries::insert_booking(&conn, booking).map_err(map_db_err)
    }

    async fn bookings_for_user(&self, user_id: &str) -> Result<Vec<BookingDetails>, AppError> {
        let conn = self.conn.lock().unwrap();
        queries::bookings_for_user(&conn, user_id).map_err(map_db_err)
    }

    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let conn = self.conn.lock().unwrap();
        queries::insert_user(&conn, user).map_err(map_db_err)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let conn = self.conn.lock().unwrap();
        queries::user_by_email(&conn, email).map_err(map_db_err)
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let conn = self.conn.lock().unwrap();
        queries::get_user(&conn, id).map_err(map_db_err)
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        let conn = self.conn.lock().unwrap();
        queries::update_user(&conn, user).map_err(map_db_err)
    }

    async fn favorites(&self, user_id: &str) -> Result<Vec<String>, AppError> {
        let conn = self.conn.lock().unwrap();
        queries::favorites(&conn, user_id).map_err(map_db_err)
    }

    async fn toggle_favorite(
        &self,
        user_id: &str,
        hotel_id: &str,
    ) -> Result<Vec<String>, AppError> {
        let conn = self.conn.lock().unwrap();
        queries::toggle_favorite(&conn, user_id, hotel_id).map_err(map_db_err)
    }
}
