//! Catalog browsing and cart mutation

use cellar_core::{CoreError, Envelope, Order, Response, Result, User, Wine};
use std::sync::Arc;

use crate::transport::Transport;

/// Result of adding a wine to the cart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    InsufficientPermission,
    /// Quantity text is not a number, or does not fit the wire format
    QuantityFormatError,
    NegativeQuantity,
    UnexpectedResponse,
    /// Wine does not exist or not enough stock
    ItemUnavailable,
    ServerUnreachable,
}

impl AddOutcome {
    pub fn code(self) -> i32 {
        match self {
            AddOutcome::Added => 0,
            AddOutcome::InsufficientPermission => -1,
            AddOutcome::QuantityFormatError => -2,
            AddOutcome::NegativeQuantity => -3,
            AddOutcome::UnexpectedResponse => -4,
            AddOutcome::ItemUnavailable => -5,
            AddOutcome::ServerUnreachable => -6,
        }
    }

    pub fn is_added(self) -> bool {
        self == AddOutcome::Added
    }
}

/// Catalog/cart component
#[derive(Clone)]
pub struct Catalog {
    transport: Arc<dyn Transport>,
}

impl Catalog {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Full catalog snapshot; guests may browse
    pub async fn list_catalog(&self) -> Result<Vec<Wine>> {
        self.transport.send(Envelope::get_wines()).await?.into_wines()
    }

    /// Filter by name fragment and year; empty filters match everything
    pub async fn search(&self, name: &str, year: &str) -> Result<Vec<Wine>> {
        self.transport.send(Envelope::search(name, year)).await?.into_wines()
    }

    /// Current cart of `actor`; empty for guests and unknown accounts
    pub async fn list_cart(&self, actor: &User) -> Result<Vec<Wine>> {
        self.transport
            .send(Envelope::display_cart(actor.email()))
            .await?
            .into_wines()
    }

    /// Add `quantity` bottles of `item` to the actor's cart
    ///
    /// Permission is checked first, then quantity; neither check touches
    /// the network.
    pub async fn add_to_cart(&self, actor: &User, item: &Wine, quantity: i64) -> AddOutcome {
        if !actor.permission().is_authenticated() {
            return AddOutcome::InsufficientPermission;
        }
        self.add_checked(actor, item, quantity).await
    }

    /// Same as [`add_to_cart`](Self::add_to_cart), with the quantity as typed
    /// by a user
    pub async fn add_to_cart_input(&self, actor: &User, item: &Wine, quantity: &str) -> AddOutcome {
        if !actor.permission().is_authenticated() {
            return AddOutcome::InsufficientPermission;
        }
        match quantity.trim().parse::<i64>() {
            Ok(quantity) => self.add_checked(actor, item, quantity).await,
            Err(_) => AddOutcome::QuantityFormatError,
        }
    }

    async fn add_checked(&self, actor: &User, item: &Wine, quantity: i64) -> AddOutcome {
        if quantity <= 0 {
            return AddOutcome::NegativeQuantity;
        }
        let Ok(quantity) = u32::try_from(quantity) else {
            return AddOutcome::QuantityFormatError;
        };

        let envelope = Envelope::add_to_cart(actor.email(), item.id, quantity);
        match self.transport.send(envelope).await {
            Ok(Response::Denied) => AddOutcome::InsufficientPermission,
            Ok(response) => match response.into_flag() {
                Ok(true) => {
                    tracing::info!("Added {} x wine {} to cart of {}", quantity, item.id, actor.email());
                    AddOutcome::Added
                }
                Ok(false) => AddOutcome::ItemUnavailable,
                Err(e) => {
                    tracing::warn!("add_to_cart: {}", e);
                    AddOutcome::UnexpectedResponse
                }
            },
            Err(e) if e.is_transport() => {
                tracing::warn!("add_to_cart: {}", e);
                AddOutcome::ServerUnreachable
            }
            Err(e) => {
                tracing::warn!("add_to_cart: {}", e);
                AddOutcome::UnexpectedResponse
            }
        }
    }

    /// Remove `item` from the cart; `true` if it was there
    pub async fn remove_from_cart(&self, actor: &User, item: &Wine) -> Result<bool> {
        let envelope = Envelope::remove_from_cart(actor.email(), item.id);
        match self.transport.send(envelope).await? {
            Response::Denied => Ok(false),
            other => other.into_flag(),
        }
    }

    /// Order history of `actor`
    pub async fn list_orders(&self, actor: &User) -> Result<Vec<Order>> {
        match self.transport.send(Envelope::get_orders_user(actor.email())).await? {
            Response::Denied => Err(CoreError::Remote(format!(
                "{} may not view orders",
                actor.email()
            ))),
            other => other.into_orders(),
        }
    }
}
