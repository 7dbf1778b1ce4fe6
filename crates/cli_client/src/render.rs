//! Plain-text output for catalog, cart and order listings

use cellar_core::{Order, User, Wine};
use std::fmt::Write;

/// One wine per line: id, name, producer, year, quantity
pub fn wines(items: &[Wine]) -> String {
    if items.is_empty() {
        return "(none)\n".to_string();
    }
    let name_width = items.iter().map(|w| w.name.len()).max().unwrap_or(0);
    let producer_width = items.iter().map(|w| w.producer.len()).max().unwrap_or(0);

    let mut out = String::new();
    for wine in items {
        let _ = writeln!(
            out,
            "{:>5}  {:<nw$}  {:<pw$}  {:>4}  x{}",
            wine.id,
            wine.name,
            wine.producer,
            wine.year,
            wine.quantity,
            nw = name_width,
            pw = producer_width,
        );
    }
    out
}

/// Header line plus the order's lines
pub fn order(order: &Order) -> String {
    let mut out = format!(
        "order {} [{}] for {}: {} bottles\n",
        order.id,
        order.status,
        order.customer,
        order.bottles()
    );
    for line in &order.items {
        let _ = writeln!(out, "  {} x {} ({})", line.quantity, line.name, line.id);
    }
    out
}

pub fn orders(list: &[Order]) -> String {
    if list.is_empty() {
        return "(no orders)\n".to_string();
    }
    list.iter().map(order).collect()
}

pub fn actor(user: &User) -> String {
    format!(
        "{} {} <{}> {} (level {})",
        user.first_name(),
        user.last_name(),
        user.email(),
        user.permission(),
        user.level()
    )
}
