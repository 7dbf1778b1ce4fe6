//! Domain types for the storefront

mod message;
mod order;
mod user;
mod wine;

pub use message::{Command, Envelope, Response};
pub use order::Order;
pub use user::{Permission, User, GUEST_EMAIL};
pub use wine::Wine;
