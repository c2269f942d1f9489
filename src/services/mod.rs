pub mod auth_service;
pub mod rating_service;

pub use auth_service::AuthService;
pub use rating_service::RatingService;
