//! Order submission

use cellar_core::{CoreError, Envelope, Order, Response, User};
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::transport::Transport;

/// Result of submitting the cart as an order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Placed(Order),
    /// Nothing to order; reported, never a silent no-op
    CartEmpty,
    /// Server accepted the request but a line exceeded stock
    OutOfStock,
    InsufficientPermission,
    UnexpectedResponse,
    /// Transport or server-side failure
    Failure(String),
}

impl SubmitOutcome {
    /// 0 when the order was placed, -1 otherwise
    pub fn code(&self) -> i32 {
        match self {
            SubmitOutcome::Placed(_) => 0,
            _ => -1,
        }
    }

    pub fn is_placed(&self) -> bool {
        matches!(self, SubmitOutcome::Placed(_))
    }

    /// Interpret an order returned by `new_order`
    ///
    /// Non-empty with a real first item means placed. An empty item list
    /// means a requested quantity exceeded stock. A zero-id first item is the
    /// legacy denial marker, which is only consistent for a level-0 actor.
    pub fn from_order(order: Order, actor: &User) -> Self {
        match order.first_item() {
            None => SubmitOutcome::OutOfStock,
            Some(first) if first.is_sentinel() => {
                if actor.permission().is_authenticated() {
                    SubmitOutcome::UnexpectedResponse
                } else {
                    SubmitOutcome::InsufficientPermission
                }
            }
            Some(_) => SubmitOutcome::Placed(order),
        }
    }

    fn from_error(err: CoreError) -> Self {
        match err {
            e if e.is_transport() => SubmitOutcome::Failure(e.to_string()),
            CoreError::Remote(reason) => SubmitOutcome::Failure(reason),
            _ => SubmitOutcome::UnexpectedResponse,
        }
    }
}

/// Order component
#[derive(Clone)]
pub struct Checkout {
    transport: Arc<dyn Transport>,
    catalog: Catalog,
}

impl Checkout {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let catalog = Catalog::new(transport.clone());
        Self { transport, catalog }
    }

    /// Submit the actor's current cart
    ///
    /// Steps: fetch the cart (empty stops here), check permission locally,
    /// send `new_order`, interpret the returned order.
    pub async fn submit_order(&self, actor: &User) -> SubmitOutcome {
        let cart = match self.catalog.list_cart(actor).await {
            Ok(cart) => cart,
            Err(e) => {
                tracing::warn!("Could not fetch cart of {}: {}", actor.email(), e);
                return SubmitOutcome::from_error(e);
            }
        };

        if cart.is_empty() {
            tracing::warn!("Cart of {} is empty, nothing to order", actor.email());
            return SubmitOutcome::CartEmpty;
        }

        if !actor.permission().is_authenticated() {
            return SubmitOutcome::InsufficientPermission;
        }

        let outcome = match self.transport.send(Envelope::new_order(actor.email())).await {
            Ok(Response::Denied) => SubmitOutcome::InsufficientPermission,
            Ok(response) => match response.into_order() {
                Ok(order) => SubmitOutcome::from_order(order, actor),
                Err(e) => SubmitOutcome::from_error(e),
            },
            Err(e) => {
                tracing::warn!("new_order for {} failed: {}", actor.email(), e);
                SubmitOutcome::from_error(e)
            }
        };

        match &outcome {
            SubmitOutcome::Placed(order) => tracing::info!(
                "Order {} placed for {} ({} bottles)",
                order.id,
                actor.email(),
                order.bottles()
            ),
            other => tracing::info!("Order for {} not placed: {:?}", actor.email(), other),
        }
        outcome
    }
}
