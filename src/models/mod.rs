pub mod booking;
pub mod hotel;
pub mod room;
pub mod user;

pub use booking::{Booking, BookingDetails, BookingStatus, Guests, PaymentStatus};
pub use hotel::{Coordinates, Hotel, Location, Policies, PriceRange};
pub use room::{Capacity, Room};
pub use user::{Address, Role, User, UserSummary};
