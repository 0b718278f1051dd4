use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::models::{
    Address, Booking, BookingDetails, BookingStatus, Capacity, Coordinates, Guests, Hotel,
    Location, PaymentStatus, Policies, PriceRange, Role, Room, User,
};
use crate::store::{HotelFilter, SortOrder};

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

const HOTEL_COLS: &str = "id, name, description, address, city, district, state, pin_code, lat, lng, \
     star_rating, images, amenities, regional_amenities, check_in_time, check_out_time, \
     cancellation_policy, featured, rating, review_count, price_min, price_max, created_at";

const ROOM_COLS: &str = "id, hotel_id, type, description, price_per_night, capacity_adults, \
     capacity_children, amenities, images, unit_count, availability";

const BOOKING_COLS: &str = "id, user_id, hotel_id, room_id, booking_reference, check_in_date, \
     check_out_date, adults, children, total_amount, status, payment_status, payment_method, \
     created_at";

const USER_COLS: &str =
    "id, full_name, email, password_hash, phone, profile_image, address, role, is_verified, \
     created_at, updated_at";

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).unwrap_or_else(|_| Utc::now().naive_utc())
}

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, DATE_FMT).unwrap_or_else(|_| Utc::now().date_naive())
}

fn json_list(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}

// ── Hotels ──

pub fn insert_hotel(conn: &Connection, hotel: &Hotel) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO hotels (id, name, description, address, city, district, state, pin_code, \
         lat, lng, star_rating, images, amenities, regional_amenities, check_in_time, \
         check_out_time, cancellation_policy, featured, rating, review_count, price_min, \
         price_max, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, \
         ?18, ?19, ?20, ?21, ?22, ?23)",
        params![
            hotel.id,
            hotel.name,
            hotel.description,
            hotel.location.address,
            hotel.location.city,
            hotel.location.district,
            hotel.location.state,
            hotel.location.pin_code,
            hotel.location.coordinates.map(|c| c.lat),
            hotel.location.coordinates.map(|c| c.lng),
            hotel.star_rating,
            serde_json::to_string(&hotel.images)?,
            serde_json::to_string(&hotel.amenities)?,
            serde_json::to_string(&hotel.regional_amenities)?,
            hotel.policies.check_in_time,
            hotel.policies.check_out_time,
            hotel.policies.cancellation_policy,
            hotel.featured as i32,
            hotel.rating,
            hotel.review_count,
            hotel.price_range.min,
            hotel.price_range.max,
            hotel.created_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

fn parse_hotel_row(row: &Row, base: usize) -> anyhow::Result<Hotel> {
    let lat: Option<f64> = row.get(base + 8)?;
    let lng: Option<f64> = row.get(base + 9)?;
    let images: String = row.get(base + 11)?;
    let amenities: String = row.get(base + 12)?;
    let regional_amenities: String = row.get(base + 13)?;
    let created_at: String = row.get(base + 22)?;

    Ok(Hotel {
        id: row.get(base)?,
        name: row.get(base + 1)?,
        description: row.get(base + 2)?,
        location: Location {
            address: row.get(base + 3)?,
            city: row.get(base + 4)?,
            district: row.get(base + 5)?,
            state: row.get(base + 6)?,
            pin_code: row.get(base + 7)?,
            coordinates: lat.zip(lng).map(|(lat, lng)| Coordinates { lat, lng }),
        },
        star_rating: row.get(base + 10)?,
        images: json_list(&images),
        amenities: json_list(&amenities),
        regional_amenities: json_list(&regional_amenities),
        policies: Policies {
            check_in_time: row.get(base + 14)?,
            check_out_time: row.get(base + 15)?,
            cancellation_policy: row.get(base + 16)?,
        },
        featured: row.get::<_, i32>(base + 17)? != 0,
        rating: row.get(base + 18)?,
        review_count: row.get(base + 19)?,
        price_range: PriceRange {
            min: row.get(base + 20)?,
            max: row.get(base + 21)?,
        },
        created_at: parse_datetime(&created_at),
    })
}

/// Pushes city/stars/price/search predicates and the sort order into SQL.
/// Amenity superset matching is applied by the caller on the result set.
pub fn list_hotels(conn: &Connection, filter: &HotelFilter) -> anyhow::Result<Vec<Hotel>> {
    let mut clauses: Vec<String> = vec![];
    let mut bound: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(city) = &filter.city {
        clauses.push("LOWER(city) = LOWER(?)".to_string());
        bound.push(Box::new(city.clone()));
    }
    if !filter.stars.is_empty() {
        let marks = vec!["?"; filter.stars.len()].join(",");
        clauses.push(format!("star_rating IN ({marks})"));
        for s in &filter.stars {
            bound.push(Box::new(*s));
        }
    }
    if let Some(min) = filter.min_price {
        clauses.push("price_min >= ?".to_string());
        bound.push(Box::new(min));
    }
    if let Some(max) = filter.max_price {
        clauses.push("price_min <= ?".to_string());
        bound.push(Box::new(max));
    }
    if let Some(term) = &filter.search {
        clauses.push(
            "(name LIKE ? ESCAPE '\\' OR city LIKE ? ESCAPE '\\' OR state LIKE ? ESCAPE '\\')"
                .to_string(),
        );
        let pattern = format!(
            "%{}%",
            term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
        );
        for _ in 0..3 {
            bound.push(Box::new(pattern.clone()));
        }
    }

    let mut sql = format!("SELECT {HOTEL_COLS} FROM hotels");
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(match filter.sort {
        SortOrder::PriceLow => " ORDER BY price_min ASC, id ASC",
        SortOrder::PriceHigh => " ORDER BY price_min DESC, id ASC",
        SortOrder::Rating => " ORDER BY rating DESC, id ASC",
        SortOrder::Newest => " ORDER BY created_at DESC, id ASC",
    });

    let mut stmt = conn.prepare(&sql)?;
    let bound_refs: Vec<&dyn rusqlite::types::ToSql> = bound.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(bound_refs.as_slice(), |row| Ok(parse_hotel_row(row, 0)))?;

    let mut hotels = vec![];
    for row in rows {
        hotels.push(row??);
    }
    Ok(hotels)
}

pub fn featured_hotels(conn: &Connection, limit: i64) -> anyhow::Result<Vec<Hotel>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {HOTEL_COLS} FROM hotels WHERE featured = 1 ORDER BY created_at DESC, id ASC LIMIT ?1"
    ))?;
    let rows = stmt.query_map(params![limit], |row| Ok(parse_hotel_row(row, 0)))?;

    let mut hotels = vec![];
    for row in rows {
        hotels.push(row??);
    }
    Ok(hotels)
}

pub fn get_hotel(conn: &Connection, id: &str) -> anyhow::Result<Option<Hotel>> {
    let result = conn.query_row(
        &format!("SELECT {HOTEL_COLS} FROM hotels WHERE id = ?1"),
        params![id],
        |row| Ok(parse_hotel_row(row, 0)),
    );

    match result {
        Ok(hotel) => Ok(Some(hotel?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Rooms ──

pub fn insert_room(conn: &Connection, room: &Room) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO rooms (id, hotel_id, type, description, price_per_night, capacity_adults, \
         capacity_children, amenities, images, unit_count, availability)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            room.id,
            room.hotel_id,
            room.room_type,
            room.description,
            room.price_per_night,
            room.capacity.adults,
            room.capacity.children,
            serde_json::to_string(&room.amenities)?,
            serde_json::to_string(&room.images)?,
            room.unit_count,
            room.availability as i32,
        ],
    )?;
    Ok(())
}

fn parse_room_row(row: &Row, base: usize) -> anyhow::Result<Room> {
    let amenities: String = row.get(base + 7)?;
    let images: String = row.get(base + 8)?;

    Ok(Room {
        id: row.get(base)?,
        hotel_id: row.get(base + 1)?,
        room_type: row.get(base + 2)?,
        description: row.get(base + 3)?,
        price_per_night: row.get(base + 4)?,
        capacity: Capacity {
            adults: row.get(base + 5)?,
            children: row.get(base + 6)?,
        },
        amenities: json_list(&amenities),
        images: json_list(&images),
        unit_count: row.get(base + 9)?,
        availability: row.get::<_, i32>(base + 10)? != 0,
    })
}

pub fn rooms_for_hotel(conn: &Connection, hotel_id: &str) -> anyhow::Result<Vec<Room>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ROOM_COLS} FROM rooms WHERE hotel_id = ?1 ORDER BY price_per_night ASC, id ASC"
    ))?;
    let rows = stmt.query_map(params![hotel_id], |row| Ok(parse_room_row(row, 0)))?;

    let mut rooms = vec![];
    for row in rows {
        rooms.push(row??);
    }
    Ok(rooms)
}

pub fn get_room(conn: &Connection, id: &str) -> anyhow::Result<Option<Room>> {
    let result = conn.query_row(
        &format!("SELECT {ROOM_COLS} FROM rooms WHERE id = ?1"),
        params![id],
        |row| Ok(parse_room_row(row, 0)),
    );

    match result {
        Ok(room) => Ok(Some(room?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Bookings ──

pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, user_id, hotel_id, room_id, booking_reference, check_in_date, \
         check_out_date, adults, children, total_amount, status, payment_status, payment_method, \
         created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            booking.id,
            booking.user_id,
            booking.hotel_id,
            booking.room_id,
            booking.booking_reference,
            booking.check_in_date.format(DATE_FMT).to_string(),
            booking.check_out_date.format(DATE_FMT).to_string(),
            booking.guests.adults,
            booking.guests.children,
            booking.total_amount,
            booking.status.as_str(),
            booking.payment_status.as_str(),
            booking.payment_method,
            booking.created_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

fn parse_booking_row(row: &Row) -> anyhow::Result<Booking> {
    let check_in: String = row.get(5)?;
    let check_out: String = row.get(6)?;
    let status: String = row.get(10)?;
    let payment_status: String = row.get(11)?;
    let created_at: String = row.get(13)?;

    Ok(Booking {
        id: row.get(0)?,
        user_id: row.get(1)?,
        hotel_id: row.get(2)?,
        room_id: row.get(3)?,
        booking_reference: row.get(4)?,
        check_in_date: parse_date(&check_in),
        check_out_date: parse_date(&check_out),
        guests: Guests {
            adults: row.get(7)?,
            children: row.get(8)?,
        },
        total_amount: row.get(9)?,
        status: BookingStatus::parse(&status),
        payment_status: PaymentStatus::parse(&payment_status),
        payment_method: row.get(12)?,
        created_at: parse_datetime(&created_at),
    })
}

pub fn bookings_for_user(conn: &Connection, user_id: &str) -> anyhow::Result<Vec<BookingDetails>> {
    // Booking columns come first; hotel starts at 14, room at 37.
    let hotel_cols = HOTEL_COLS
        .split(", ")
        .map(|c| format!("h.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    let room_cols = ROOM_COLS
        .split(", ")
        .map(|c| format!("r.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    let booking_cols = BOOKING_COLS
        .split(", ")
        .map(|c| format!("b.{c}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut stmt = conn.prepare(&format!(
        "SELECT {booking_cols}, {hotel_cols}, {room_cols}
         FROM bookings b
         INNER JOIN hotels h ON h.id = b.hotel_id
         INNER JOIN rooms r ON r.id = b.room_id
         WHERE b.user_id = ?1
         ORDER BY b.created_at DESC, b.rowid DESC"
    ))?;

    let rows = stmt.query_map(params![user_id], |row| {
        Ok((|| -> anyhow::Result<BookingDetails> {
            Ok(BookingDetails {
                booking: parse_booking_row(row)?,
                hotel: parse_hotel_row(row, 14)?,
                room: parse_room_row(row, 37)?,
            })
        })())
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

// ── Users ──

pub fn insert_user(conn: &Connection, user: &User) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO users (id, full_name, email, password_hash, phone, profile_image, address, \
         role, is_verified, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            user.id,
            user.full_name,
            user.email,
            user.password_hash,
            user.phone,
            user.profile_image,
            user.address
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            user.role.as_str(),
            user.is_verified as i32,
            user.created_at.format(DATETIME_FMT).to_string(),
            user.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

fn parse_user_row(row: &Row) -> anyhow::Result<User> {
    let address: Option<String> = row.get(6)?;
    let role: String = row.get(7)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;

    Ok(User {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        phone: row.get(4)?,
        profile_image: row.get(5)?,
        address: address.and_then(|a| serde_json::from_str::<Address>(&a).ok()),
        role: Role::parse(&role),
        is_verified: row.get::<_, i32>(8)? != 0,
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

pub fn user_by_email(conn: &Connection, email: &str) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        &format!("SELECT {USER_COLS} FROM users WHERE email = ?1"),
        params![email],
        |row| Ok(parse_user_row(row)),
    );

    match result {
        Ok(user) => Ok(Some(user?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_user(conn: &Connection, id: &str) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        &format!("SELECT {USER_COLS} FROM users WHERE id = ?1"),
        params![id],
        |row| Ok(parse_user_row(row)),
    );

    match result {
        Ok(user) => Ok(Some(user?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_user(conn: &Connection, user: &User) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE users SET full_name = ?1, phone = ?2, profile_image = ?3, address = ?4, \
         updated_at = ?5 WHERE id = ?6",
        params![
            user.full_name,
            user.phone,
            user.profile_image,
            user.address
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            user.updated_at.format(DATETIME_FMT).to_string(),
            user.id,
        ],
    )?;
    Ok(())
}

// ── Favorites ──

pub fn favorites(conn: &Connection, user_id: &str) -> anyhow::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT hotel_id FROM favorites WHERE user_id = ?1")?;
    let rows = stmt.query_map(params![user_id], |row| row.get::<_, String>(0))?;

    let mut ids = vec![];
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

/// Toggle as delete-then-insert so concurrent toggles never lose updates:
/// the row either existed (removed) or it did not (added), in one statement
/// each way.
pub fn toggle_favorite(
    conn: &Connection,
    user_id: &str,
    hotel_id: &str,
) -> anyhow::Result<Vec<String>> {
    let removed = conn.execute(
        "DELETE FROM favorites WHERE user_id = ?1 AND hotel_id = ?2",
        params![user_id, hotel_id],
    )?;

    if removed == 0 {
        conn.execute(
            "INSERT OR IGNORE INTO favorites (user_id, hotel_id) VALUES (?1, ?2)",
            params![user_id, hotel_id],
        )?;
    }

    favorites(conn, user_id)
}
