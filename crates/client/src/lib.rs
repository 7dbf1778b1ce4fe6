//! Cellar Client - storefront workflow over the Cellar protocol
//!
//! Components, each taking the actor explicitly:
//! - [`Session`]: login, guest access, email check
//! - [`Catalog`]: browse, search, cart contents and mutation, order history
//! - [`Checkout`]: submit the cart as an order
//! - [`workflow::purchase`]: login, add, submit in one verdict
//!
//! All of them talk through a [`Transport`]; [`TcpTransport`] opens one
//! connection per call unless configured as persistent.

pub mod catalog;
pub mod checkout;
pub mod config;
pub mod session;
pub mod transport;
pub mod workflow;

use cellar_core::Wine;
use std::sync::Arc;

pub use catalog::{AddOutcome, Catalog};
pub use checkout::{Checkout, SubmitOutcome};
pub use config::{ClientConfig, ConnectionMode};
pub use session::{LoginOutcome, Session};
pub use transport::{MockTransport, TcpTransport, Transport};
pub use workflow::PurchaseVerdict;

/// All components wired to one transport
#[derive(Clone)]
pub struct Storefront {
    pub session: Session,
    pub catalog: Catalog,
    pub checkout: Checkout,
}

impl Storefront {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            session: Session::new(transport.clone()),
            catalog: Catalog::new(transport.clone()),
            checkout: Checkout::new(transport),
        }
    }

    /// Storefront talking TCP to `config.server_addr`
    pub fn connect(config: ClientConfig) -> Self {
        Self::new(Arc::new(TcpTransport::new(config)))
    }

    /// See [`workflow::purchase`]
    pub async fn purchase(&self, mail: &str, pass: &str, item: &Wine, quantity: i64) -> PurchaseVerdict {
        workflow::purchase(self, mail, pass, item, quantity).await
    }
}
