//! In-memory store: accounts, stock, carts and orders
//!
//! Every public operation takes the lock once, so a stock check and the
//! reservation that follows it cannot interleave with another request.

use cellar_core::{Order, Permission, User, Wine};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::seed::SeedData;

/// Status given to freshly placed orders
pub const ORDER_PENDING: &str = "pending";
/// Status of the empty order returned when stock ran out
pub const ORDER_REJECTED: &str = "rejected";

/// Outcome of a permission-gated operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access<T> {
    Granted(T),
    /// Email is unknown or its level is 0
    Denied,
}

/// Why `place_order` produced no order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceError {
    EmptyCart,
}

type PasswordDigest = [u8; 32];

fn digest(password: &str) -> PasswordDigest {
    Sha256::digest(password.as_bytes()).into()
}

struct Account {
    user: User,
    password: PasswordDigest,
}

#[derive(Default)]
struct State {
    accounts: HashMap<String, Account>,
    wines: BTreeMap<u32, Wine>,
    /// Lines keep insertion order; `quantity` is the requested amount
    carts: HashMap<String, Vec<Wine>>,
    orders: HashMap<String, Vec<Order>>,
    next_order_id: u32,
}

impl State {
    fn is_permitted(&self, email: &str) -> bool {
        self.accounts
            .get(email)
            .is_some_and(|a| a.user.permission().is_authenticated())
    }

    fn in_stock(&self, line: &Wine) -> bool {
        self.wines
            .get(&line.id)
            .is_some_and(|w| w.quantity >= line.quantity)
    }
}

/// Shared handle; clones see the same data
#[derive(Clone)]
pub struct Store {
    state: Arc<RwLock<State>>,
}

impl Store {
    /// Empty store
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State {
                next_order_id: 1,
                ..State::default()
            })),
        }
    }

    /// Store populated from seed data
    pub fn from_seed(seed: &SeedData) -> anyhow::Result<Self> {
        seed.validate()?;
        let mut state = State {
            next_order_id: 1,
            ..State::default()
        };
        for entry in &seed.users {
            let user = User::new(
                entry.first_name.as_str(),
                entry.last_name.as_str(),
                entry.email.as_str(),
                "",
                entry.permission()?,
            );
            state.accounts.insert(
                entry.email.clone(),
                Account {
                    user,
                    password: digest(&entry.password),
                },
            );
        }
        for wine in &seed.wines {
            state.wines.insert(wine.id, wine.clone());
        }
        tracing::info!(
            "Store seeded with {} accounts and {} wines",
            state.accounts.len(),
            state.wines.len()
        );
        Ok(Self {
            state: Arc::new(RwLock::new(state)),
        })
    }

    /// Add or replace an account
    pub async fn add_account(&self, user: User, password: &str) {
        let email = user.email().to_string();
        let account = Account {
            user: user.redacted(),
            password: digest(password),
        };
        self.state.write().await.accounts.insert(email, account);
    }

    /// Add or replace a catalog entry
    pub async fn add_wine(&self, wine: Wine) {
        self.state.write().await.wines.insert(wine.id, wine);
    }

    /// Matching account, or an `Unknown` actor echoing `email`
    pub async fn login(&self, email: &str, password: &str) -> User {
        let state = self.state.read().await;
        match state.accounts.get(email) {
            Some(account) if account.password == digest(password) => account.user.clone(),
            _ => User::unknown(email),
        }
    }

    /// Whole catalog ordered by id
    pub async fn wines(&self) -> Vec<Wine> {
        self.state.read().await.wines.values().cloned().collect()
    }

    /// Case-insensitive name fragment plus exact year
    ///
    /// Empty filters match everything. A year that is not a number matches
    /// nothing.
    pub async fn search(&self, name: &str, year: &str) -> Vec<Wine> {
        let year = year.trim();
        let year = if year.is_empty() {
            None
        } else {
            match year.parse::<u16>() {
                Ok(y) => Some(y),
                Err(_) => return Vec::new(),
            }
        };
        let needle = name.trim().to_lowercase();

        self.state
            .read()
            .await
            .wines
            .values()
            .filter(|w| w.name.to_lowercase().contains(&needle))
            .filter(|w| year.map_or(true, |y| w.year == y))
            .cloned()
            .collect()
    }

    /// Cart lines of `email`; empty for guests and unknown emails
    pub async fn cart(&self, email: &str) -> Vec<Wine> {
        self.state
            .read()
            .await
            .carts
            .get(email)
            .cloned()
            .unwrap_or_default()
    }

    /// Reserve `quantity` more bottles of `wine_id`
    ///
    /// `Granted(false)` when the wine is unknown or the accumulated amount
    /// would exceed stock.
    pub async fn add_to_cart(&self, email: &str, wine_id: u32, quantity: u32) -> Access<bool> {
        let mut state = self.state.write().await;
        if !state.is_permitted(email) {
            return Access::Denied;
        }
        let Some(wine) = state.wines.get(&wine_id).cloned() else {
            return Access::Granted(false);
        };

        let held = state
            .carts
            .get(email)
            .and_then(|cart| cart.iter().find(|line| line.id == wine_id))
            .map_or(0, |line| line.quantity);
        let wanted = match held.checked_add(quantity) {
            Some(total) if total <= wine.quantity => total,
            _ => return Access::Granted(false),
        };

        let cart = state.carts.entry(email.to_string()).or_default();
        match cart.iter_mut().find(|line| line.id == wine_id) {
            Some(line) => line.quantity = wanted,
            None => cart.push(wine.with_quantity(wanted)),
        }
        Access::Granted(true)
    }

    /// Drop the line for `wine_id`; `Granted(true)` if there was one
    pub async fn remove_from_cart(&self, email: &str, wine_id: u32) -> Access<bool> {
        let mut state = self.state.write().await;
        if !state.is_permitted(email) {
            return Access::Denied;
        }
        let Some(cart) = state.carts.get_mut(email) else {
            return Access::Granted(false);
        };
        let before = cart.len();
        cart.retain(|line| line.id != wine_id);
        let removed = cart.len() != before;
        if cart.is_empty() {
            state.carts.remove(email);
        }
        Access::Granted(removed)
    }

    /// Turn the cart into an order
    ///
    /// If any line exceeds current stock, returns an order with no items and
    /// leaves cart and stock untouched.
    pub async fn place_order(&self, email: &str) -> Access<Result<Order, PlaceError>> {
        let mut state = self.state.write().await;
        if !state.is_permitted(email) {
            return Access::Denied;
        }
        let lines = state.carts.get(email).cloned().unwrap_or_default();
        if lines.is_empty() {
            return Access::Granted(Err(PlaceError::EmptyCart));
        }
        if !lines.iter().all(|line| state.in_stock(line)) {
            tracing::info!("Order for {} rejected: stock exhausted", email);
            return Access::Granted(Ok(Order::new(0, ORDER_REJECTED, email, Vec::new())));
        }

        for line in &lines {
            if let Some(wine) = state.wines.get_mut(&line.id) {
                wine.quantity -= line.quantity;
            }
        }
        state.carts.remove(email);

        let id = state.next_order_id;
        state.next_order_id += 1;
        let order = Order::new(id, ORDER_PENDING, email, lines);
        state
            .orders
            .entry(email.to_string())
            .or_default()
            .push(order.clone());
        tracing::info!("Order {} placed for {} ({} bottles)", id, email, order.bottles());
        Access::Granted(Ok(order))
    }

    /// Orders placed by `email`, oldest first
    pub async fn orders(&self, email: &str) -> Access<Vec<Order>> {
        let state = self.state.read().await;
        if !state.is_permitted(email) {
            return Access::Denied;
        }
        Access::Granted(state.orders.get(email).cloned().unwrap_or_default())
    }

    /// Current stock of `wine_id`
    pub async fn stock(&self, wine_id: u32) -> Option<u32> {
        self.state.read().await.wines.get(&wine_id).map(|w| w.quantity)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Store {
        Store::from_seed(&SeedData::builtin()).unwrap()
    }

    #[tokio::test]
    async fn test_login() {
        let store = seeded();

        let user = store.login("user@user.com", "pwd").await;
        assert_eq!(user.level(), 1);
        assert_eq!(user.password(), "");

        let admin = store.login("admin@admin.com", "pwd").await;
        assert_eq!(admin.permission(), Permission::Admin);

        let wrong = store.login("user@user.com", "nope").await;
        assert_eq!(wrong.permission(), Permission::Unknown);
        assert_eq!(wrong.email(), "user@user.com");
    }

    #[tokio::test]
    async fn test_add_accumulates_up_to_stock() {
        let store = Store::new();
        store
            .add_account(User::new("A", "B", "a@b.c", "", Permission::Customer), "x")
            .await;
        store.add_wine(Wine::new(5, "Test", "P", 2020, "", 3, "G")).await;

        assert_eq!(store.add_to_cart("a@b.c", 5, 2).await, Access::Granted(true));
        assert_eq!(store.add_to_cart("a@b.c", 5, 2).await, Access::Granted(false));
        assert_eq!(store.add_to_cart("a@b.c", 5, 1).await, Access::Granted(true));

        let cart = store.cart("a@b.c").await;
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_add_denied_and_unknown_wine() {
        let store = seeded();
        assert_eq!(store.add_to_cart("guest", 20, 1).await, Access::Denied);
        assert_eq!(store.add_to_cart("nobody@x.com", 20, 1).await, Access::Denied);
        assert_eq!(store.add_to_cart("user@user.com", 999, 1).await, Access::Granted(false));
        assert_eq!(store.add_to_cart("user@user.com", 20, u32::MAX).await, Access::Granted(false));
    }

    #[tokio::test]
    async fn test_place_order_decrements_stock() {
        let store = seeded();
        let before = store.stock(20).await.unwrap();
        store.add_to_cart("user@user.com", 20, 2).await;

        let Access::Granted(Ok(order)) = store.place_order("user@user.com").await else {
            panic!("order not placed");
        };
        assert_eq!(order.status, ORDER_PENDING);
        assert_eq!(order.bottles(), 2);
        assert_eq!(store.stock(20).await, Some(before - 2));
        assert!(store.cart("user@user.com").await.is_empty());
        assert_eq!(store.orders("user@user.com").await, Access::Granted(vec![order]));
    }

    #[tokio::test]
    async fn test_place_order_empty_and_stale_cart() {
        let store = seeded();
        assert_eq!(
            store.place_order("user@user.com").await,
            Access::Granted(Err(PlaceError::EmptyCart))
        );

        // Admin drains the stock the customer reserved
        let stock = store.stock(22).await.unwrap();
        store.add_to_cart("user@user.com", 22, stock).await;
        store.add_to_cart("admin@admin.com", 22, stock).await;
        assert!(matches!(store.place_order("admin@admin.com").await, Access::Granted(Ok(_))));

        let Access::Granted(Ok(order)) = store.place_order("user@user.com").await else {
            panic!("expected an order");
        };
        assert!(order.items.is_empty());
        assert_eq!(store.cart("user@user.com").await.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_from_cart() {
        let store = seeded();
        store.add_to_cart("user@user.com", 20, 1).await;
        assert_eq!(store.remove_from_cart("user@user.com", 20).await, Access::Granted(true));
        assert_eq!(store.remove_from_cart("user@user.com", 20).await, Access::Granted(false));
        assert_eq!(store.remove_from_cart("guest", 20).await, Access::Denied);
    }

    #[tokio::test]
    async fn test_rejected_add_and_last_removal_leave_no_cart() {
        let store = seeded();
        assert_eq!(store.add_to_cart("user@user.com", 24, 1).await, Access::Granted(false));
        assert_eq!(store.add_to_cart("user@user.com", 999, 1).await, Access::Granted(false));
        assert!(!store.state.read().await.carts.contains_key("user@user.com"));

        store.add_to_cart("user@user.com", 20, 1).await;
        assert!(store.state.read().await.carts.contains_key("user@user.com"));
        store.remove_from_cart("user@user.com", 20).await;
        assert!(!store.state.read().await.carts.contains_key("user@user.com"));
    }

    #[tokio::test]
    async fn test_search() {
        let store = seeded();
        assert_eq!(store.search("", "").await.len(), store.wines().await.len());

        let found = store.search("BAROLO", "").await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 20);

        assert_eq!(store.search("", "2016").await.len(), 1);
        assert!(store.search("barolo", "2016").await.is_empty());
        assert!(store.search("", "nineteen").await.is_empty());
    }
}
