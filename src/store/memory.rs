use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{Booking, BookingDetails, Hotel, Room, User};
use crate::store::{HotelFilter, SortOrder, Store};

/// In-memory adapter. Every predicate is evaluated client-side, mirroring
/// the backend variant that could not push multi-field queries into its
/// substrate. Doubles as the reference implementation of the filter
/// semantics in tests.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    hotels: Vec<Hotel>,
    rooms: Vec<Room>,
    bookings: Vec<Booking>,
    users: Vec<User>,
    favorites: HashMap<String, BTreeSet<String>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(filter: &HotelFilter, hotel: &Hotel) -> bool {
    if let Some(city) = &filter.city {
        if !hotel.location.city.eq_ignore_ascii_case(city) {
            return false;
        }
    }
    if !filter.stars.is_empty() && !filter.stars.contains(&hotel.star_rating) {
        return false;
    }
    if let Some(min) = filter.min_price {
        if hotel.price_range.min < min {
            return false;
        }
    }
    if let Some(max) = filter.max_price {
        if hotel.price_range.min > max {
            return false;
        }
    }
    if !filter.matches_amenities(&hotel.amenities) {
        return false;
    }
    if let Some(term) = &filter.search {
        let term = term.to_lowercase();
        let hit = hotel.name.to_lowercase().contains(&term)
            || hotel.location.city.to_lowercase().contains(&term)
            || hotel.location.state.to_lowercase().contains(&term);
        if !hit {
            return false;
        }
    }
    true
}

#[async_trait]
impl Store for MemStore {
    async fn list_hotels(&self, filter: &HotelFilter) -> Result<Vec<Hotel>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut hotels: Vec<Hotel> = inner
            .hotels
            .iter()
            .filter(|h| matches(filter, h))
            .cloned()
            .collect();

        // Stable sorts keep insertion order for equal keys, so ties are
        // deterministic across calls.
        match filter.sort {
            SortOrder::PriceLow => {
                hotels.sort_by(|a, b| a.price_range.min.total_cmp(&b.price_range.min))
            }
            SortOrder::PriceHigh => {
                hotels.sort_by(|a, b| b.price_range.min.total_cmp(&a.price_range.min))
            }
            SortOrder::Rating => hotels.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
            SortOrder::Newest => hotels.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
        Ok(hotels)
    }

    async fn featured_hotels(&self, limit: i64) -> Result<Vec<Hotel>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut hotels: Vec<Hotel> = inner.hotels.iter().filter(|h| h.featured).cloned().collect();
        hotels.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        hotels.truncate(limit.max(0) as usize);
        Ok(hotels)
    }

    async fn get_hotel(&self, id: &str) -> Result<Option<Hotel>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.hotels.iter().find(|h| h.id == id).cloned())
    }

    async fn insert_hotel(&self, hotel: &Hotel) -> Result<(), AppError> {
        self.inner.lock().unwrap().hotels.push(hotel.clone());
        Ok(())
    }

    async fn rooms_for_hotel(&self, hotel_id: &str) -> Result<Vec<Room>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .rooms
            .iter()
            .filter(|r| r.hotel_id == hotel_id)
            .cloned()
            .collect())
    }

    async fn get_room(&self, id: &str) -> Result<Option<Room>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.rooms.iter().find(|r| r.id == id).cloned())
    }

    async fn insert_room(&self, room: &Room) -> Result<(), AppError> {
        self.inner.lock().unwrap().rooms.push(room.clone());
        Ok(())
    }

    async fn create_booking(&self, booking: &Booking) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .bookings
            .iter()
            .any(|b| b.booking_reference == booking.booking_reference)
        {
            return Err(AppError::Conflict("duplicate value".to_string()));
        }
        inner.bookings.push(booking.clone());
        Ok(())
    }

    async fn bookings_for_user(&self, user_id: &str) -> Result<Vec<BookingDetails>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut details: Vec<BookingDetails> = inner
            .bookings
            .iter()
            .rev()
            .filter(|b| b.user_id == user_id)
            .filter_map(|b| {
                let hotel = inner.hotels.iter().find(|h| h.id == b.hotel_id)?;
                let room = inner.rooms.iter().find(|r| r.id == b.room_id)?;
                Some(BookingDetails {
                    booking: b.clone(),
                    hotel: hotel.clone(),
                    room: room.clone(),
                })
            })
            .collect();
        details.sort_by(|a, b| b.booking.created_at.cmp(&a.booking.created_at));
        Ok(details)
    }

    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("duplicate value".to_string()));
        }
        inner.users.push(user.clone());
        Ok(())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner.users.iter_mut().find(|u| u.id == user.id) {
            *existing = user.clone();
        }
        Ok(())
    }

    async fn favorites(&self, user_id: &str) -> Result<Vec<String>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .favorites
            .get(user_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn toggle_favorite(
        &self,
        user_id: &str,
        hotel_id: &str,
    ) -> Result<Vec<String>, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let set = inner.favorites.entry(user_id.to_string()).or_default();
        if !set.remove(hotel_id) {
            set.insert(hotel_id.to_string());
        }
        Ok(set.iter().cloned().collect())
    }
}
