pub mod address;
pub mod cart_history;
pub mod cart_item;
pub mod category;
pub mod order;
pub mod order_item;
pub mod product;
pub mod product_category;
pub mod product_sub_category;
pub mod sub_category;
pub mod user;
pub mod webhook_event;
