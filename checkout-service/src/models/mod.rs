pub mod book;
pub mod delivery_zone;
pub mod order;

pub use book::{format_price, Book};
pub use delivery_zone::{DeliveryZone, Zone};
pub use order::{Order, OrderItem, OrderStatus};
