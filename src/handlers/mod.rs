pub mod auth;
pub mod bookings;
pub mod health;
pub mod hotels;
pub mod users;
