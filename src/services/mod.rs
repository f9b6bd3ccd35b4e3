// Order lifecycle
pub mod admin_orders;
pub mod delivery;
pub mod orders;
pub mod payments;
pub mod reports;

// Shopper-owned state
pub mod addresses;
pub mod cart;

// Catalog
pub mod catalog;

// Accounts
pub mod users;
