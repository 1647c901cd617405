//! Application services, constructed once at startup and handed to the
//! request handlers.

pub mod orders;
pub mod products;
pub mod purchases;

pub use orders::OrderService;
pub use products::{ProductService, UploadedImage};
pub use purchases::PurchaseService;
