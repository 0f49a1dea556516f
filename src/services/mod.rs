pub mod catalog;
pub mod discounts;
pub mod images;
pub mod orders;

pub use catalog::CatalogService;
pub use discounts::DiscountService;
pub use images::ImageStore;
pub use orders::OrderService;
