pub mod discount;
pub mod order;
pub mod ordered_item;
pub mod product;

pub use discount::Entity as Discount;
pub use order::Entity as Order;
pub use ordered_item::Entity as OrderedItem;
pub use product::Entity as Product;
