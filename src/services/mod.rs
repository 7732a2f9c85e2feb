pub mod tracking_service;

pub use tracking_service::{ SubscriberResponse, TrackedProductResponse, TrackingService };
