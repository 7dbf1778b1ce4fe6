//! Command dispatch: one envelope in, one response out

use cellar_core::{Command, CoreError, Envelope, Response, User};

use crate::store::{Access, PlaceError, Store};

/// Answer one request
///
/// Malformed envelopes (version, command name, arity, numeric arguments)
/// get `Response::Failed` with the reason.
pub async fn dispatch(store: &Store, envelope: &Envelope) -> Response {
    match handle(store, envelope).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Rejected {:?}: {}", envelope.command, e);
            Response::Failed(e.to_string())
        }
    }
}

async fn handle(store: &Store, envelope: &Envelope) -> Result<Response, CoreError> {
    let command = envelope.validate()?;
    let args = &envelope.args;
    tracing::debug!("Dispatching {} {:?}", command, args);

    let response = match command {
        Command::Login => Response::Actor(store.login(&args[0], &args[1]).await),
        Command::Guest => Response::Actor(User::guest()),
        Command::GetWines => Response::Wines(store.wines().await),
        Command::Search => Response::Wines(store.search(&args[0], &args[1]).await),
        Command::DisplayCart => Response::Wines(store.cart(&args[0]).await),
        Command::AddToCart => {
            let wine_id = envelope.numeric_arg::<u32>(1)?;
            let quantity = envelope.numeric_arg::<u32>(2)?;
            if quantity == 0 {
                return Err(CoreError::InvalidArguments {
                    command: envelope.command.clone(),
                    reason: "quantity must be positive".to_string(),
                });
            }
            flag(store.add_to_cart(&args[0], wine_id, quantity).await)
        }
        Command::RemoveFromCart => {
            let wine_id = envelope.numeric_arg::<u32>(1)?;
            flag(store.remove_from_cart(&args[0], wine_id).await)
        }
        Command::NewOrder => match store.place_order(&args[0]).await {
            Access::Granted(Ok(order)) => Response::Order(order),
            Access::Granted(Err(PlaceError::EmptyCart)) => {
                Response::Failed(format!("cart of {} is empty", args[0]))
            }
            Access::Denied => Response::Denied,
        },
        Command::GetOrdersUser => match store.orders(&args[0]).await {
            Access::Granted(orders) => Response::Orders(orders),
            Access::Denied => Response::Denied,
        },
    };
    Ok(response)
}

fn flag(access: Access<bool>) -> Response {
    match access {
        Access::Granted(ok) => Response::Flag(ok),
        Access::Denied => Response::Denied,
    }
}
