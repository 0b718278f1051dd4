pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{Booking, BookingDetails, Hotel, Room, User};

/// The catalog filter set, decoded from URL query parameters. All filters
/// compose with logical AND; an empty filter matches every hotel.
#[derive(Debug, Clone, Default)]
pub struct HotelFilter {
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub stars: Vec<i64>,
    pub amenities: Vec<String>,
    pub search: Option<String>,
    pub sort: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Creation time descending, the catalog default.
    #[default]
    Newest,
    PriceLow,
    PriceHigh,
    Rating,
}

impl HotelFilter {
    /// Builds a filter from raw query-parameter strings. Malformed numeric
    /// values are treated as absent rather than rejected: a bad `minPrice`
    /// or an unparseable entry in `stars` simply does not constrain the
    /// result set.
    pub fn from_params(
        city: Option<String>,
        min_price: Option<String>,
        max_price: Option<String>,
        stars: Option<String>,
        amenities: Option<String>,
        search: Option<String>,
        sort: Option<String>,
    ) -> Self {
        let stars = stars
            .as_deref()
            .map(|s| {
                s.split(',')
                    .filter_map(|v| v.trim().parse::<i64>().ok())
                    .collect()
            })
            .unwrap_or_default();

        let amenities = amenities
            .as_deref()
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let sort = match sort.as_deref() {
            Some("priceLow") => SortOrder::PriceLow,
            Some("priceHigh") => SortOrder::PriceHigh,
            Some("rating") => SortOrder::Rating,
            _ => SortOrder::Newest,
        };

        Self {
            city: city.filter(|c| !c.trim().is_empty()),
            min_price: min_price.and_then(|v| v.trim().parse().ok()),
            max_price: max_price.and_then(|v| v.trim().parse().ok()),
            stars,
            amenities,
            search: search.filter(|s| !s.trim().is_empty()),
            sort,
        }
    }

    /// Superset test: every requested amenity must be present on the hotel.
    /// Shared by both adapters; the SQLite adapter applies it after the SQL
    /// pass since the AND-across-rows shape does not map cleanly onto a
    /// WHERE clause.
    pub fn matches_amenities(&self, hotel_amenities: &[String]) -> bool {
        self.amenities
            .iter()
            .all(|wanted| hotel_amenities.iter().any(|have| have == wanted))
    }
}

/// Storage port for the booking service. The original system shipped three
/// duplicated backends behind one REST contract; here each backend is an
/// adapter of this trait instead.
#[async_trait]
pub trait Store: Send + Sync {
    async fn list_hotels(&self, filter: &HotelFilter) -> Result<Vec<Hotel>, AppError>;
    async fn featured_hotels(&self, limit: i64) -> Result<Vec<Hotel>, AppError>;
    async fn get_hotel(&self, id: &str) -> Result<Option<Hotel>, AppError>;
    async fn insert_hotel(&self, hotel: &Hotel) -> Result<(), AppError>;

    async fn rooms_for_hotel(&self, hotel_id: &str) -> Result<Vec<Room>, AppError>;
    async fn get_room(&self, id: &str) -> Result<Option<Room>, AppError>;
    async fn insert_room(&self, room: &Room) -> Result<(), AppError>;

    /// Persists a booking. A duplicate booking reference is a conflict, not
    /// an overwrite.
    async fn create_booking(&self, booking: &Booking) -> Result<(), AppError>;
    /// All bookings for a user with hotel and room joined, newest first.
    async fn bookings_for_user(&self, user_id: &str) -> Result<Vec<BookingDetails>, AppError>;

    async fn create_user(&self, user: &User) -> Result<(), AppError>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn update_user(&self, user: &User) -> Result<(), AppError>;

    async fn favorites(&self, user_id: &str) -> Result<Vec<String>, AppError>;
    /// Flips membership of `hotel_id` in the user's favorites as a single
    /// storage-level operation and returns the resulting set.
    async fn toggle_favorite(&self, user_id: &str, hotel_id: &str)
        -> Result<Vec<String>, AppError>;
}
