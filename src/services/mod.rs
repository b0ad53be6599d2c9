//! # Domain Services
//!
//! The platform's operations, one service per collection. Each wraps
//! the generic CRUD core and adds the behavior specific to its domain:
//! catalog analytics, account and password flows, nested review routes,
//! checkout recording. Services are the only layer allowed to combine
//! collections.

pub mod bookings;
pub mod errors;
pub mod reviews;
pub mod tours;
pub mod users;

pub use bookings::BookingService;
pub use errors::{ServiceError, ServiceResult};
pub use reviews::ReviewService;
pub use tours::TourService;
pub use users::UserService;
