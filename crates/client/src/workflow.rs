//! End-to-end purchase: login, add one wine, submit the cart

use cellar_core::{Order, Permission, Wine};
use std::fmt;

use crate::catalog::AddOutcome;
use crate::checkout::SubmitOutcome;
use crate::session::LoginOutcome;
use crate::Storefront;

/// What a purchase attempt ended with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseVerdict {
    OrderPlaced(Order),
    OrderNotPlaced(SubmitOutcome),
    ItemRejected(AddOutcome),
    UnknownAccount,
    MissingCredentials,
    /// Invalid email, unreachable server or garbled login response
    LoginFailed(LoginOutcome),
}

impl PurchaseVerdict {
    pub fn is_success(&self) -> bool {
        matches!(self, PurchaseVerdict::OrderPlaced(_))
    }
}

impl fmt::Display for PurchaseVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurchaseVerdict::OrderPlaced(order) => write!(
                f,
                "order {} placed for {} ({} bottles)",
                order.id,
                order.customer,
                order.bottles()
            ),
            PurchaseVerdict::OrderNotPlaced(SubmitOutcome::CartEmpty) => {
                write!(f, "order not placed: cart is empty")
            }
            PurchaseVerdict::OrderNotPlaced(SubmitOutcome::OutOfStock) => {
                write!(f, "order not placed: requested quantity is not in stock")
            }
            PurchaseVerdict::OrderNotPlaced(SubmitOutcome::Failure(reason)) => {
                write!(f, "order not placed: {}", reason)
            }
            PurchaseVerdict::OrderNotPlaced(other) => write!(f, "order not placed: {:?}", other),
            PurchaseVerdict::ItemRejected(AddOutcome::NegativeQuantity) => {
                write!(f, "quantity must be positive")
            }
            PurchaseVerdict::ItemRejected(AddOutcome::ItemUnavailable) => {
                write!(f, "wine does not exist or the quantity is not in stock")
            }
            PurchaseVerdict::ItemRejected(other) => {
                write!(f, "wine not added ({:?}, code {})", other, other.code())
            }
            PurchaseVerdict::UnknownAccount => write!(f, "no account with these credentials"),
            PurchaseVerdict::MissingCredentials => write!(f, "email and password are required"),
            PurchaseVerdict::LoginFailed(outcome) => {
                write!(f, "login failed ({:?}, code {})", outcome, outcome.code())
            }
        }
    }
}

/// Run one purchase attempt, stopping at the first step that fails
pub async fn purchase(
    store: &Storefront,
    mail: &str,
    pass: &str,
    item: &Wine,
    quantity: i64,
) -> PurchaseVerdict {
    tracing::info!("Purchase attempt: {} x wine {} for {}", quantity, item.id, mail);

    let user = match store.session.login(mail, pass).await {
        LoginOutcome::Success(user) if user.permission() == Permission::Unknown => {
            return PurchaseVerdict::UnknownAccount
        }
        LoginOutcome::Success(user) => user,
        LoginOutcome::MissingFields => return PurchaseVerdict::MissingCredentials,
        other => return PurchaseVerdict::LoginFailed(other),
    };

    let added = store.catalog.add_to_cart(&user, item, quantity).await;
    if !added.is_added() {
        return PurchaseVerdict::ItemRejected(added);
    }

    match store.checkout.submit_order(&user).await {
        SubmitOutcome::Placed(order) => PurchaseVerdict::OrderPlaced(order),
        other => PurchaseVerdict::OrderNotPlaced(other),
    }
}
