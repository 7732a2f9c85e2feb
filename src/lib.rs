pub mod config;
pub mod enums;
pub mod error;
pub mod models;
pub mod db;
pub mod scraper;
pub mod tracker;
pub mod notify;
pub mod services;
pub mod api;
pub mod bot;

pub use config::Config;
pub use enums::{ AlertState, DeliveryStatus };
pub use error::{ AppError, Result };
