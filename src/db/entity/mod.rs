pub mod subscriber;
pub mod product;
pub mod tracked_item;
pub mod price_observation;
pub mod notification_event;

pub use subscriber::Entity as Subscriber;
pub use product::Entity as Product;
pub use tracked_item::Entity as TrackedItem;
pub use price_observation::Entity as PriceObservation;
pub use notification_event::Entity as NotificationEvent;
