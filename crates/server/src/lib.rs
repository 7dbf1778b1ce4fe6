//! Cellar Server - reference storefront server
//!
//! In-memory accounts, stock, carts and orders behind the Cellar wire
//! protocol. Used by the `cellar-server` binary and by end-to-end tests.

pub mod dispatch;
pub mod seed;
pub mod server;
pub mod store;

pub use dispatch::dispatch;
pub use seed::{SeedData, SeedUser};
pub use server::StoreServer;
pub use store::{Access, PlaceError, Store};
