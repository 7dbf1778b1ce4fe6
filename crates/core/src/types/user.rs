//! Actor identity and permission levels

use serde::{Deserialize, Serialize};
use std::fmt;

/// Email the server assigns to the guest actor
pub const GUEST_EMAIL: &str = "guest";

/// Permission level attached to every actor
///
/// `Unknown` and `Guest` share level 0 but stay distinct: one means the
/// credentials matched no account, the other was asked for explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    Unknown,
    Guest,
    Customer,
    Employee,
    Admin,
}

impl Permission {
    /// Numeric level: 0 (unknown/guest), 1 customer, 2 employee, 3 admin
    pub fn level(self) -> i32 {
        match self {
            Permission::Unknown | Permission::Guest => 0,
            Permission::Customer => 1,
            Permission::Employee => 2,
            Permission::Admin => 3,
        }
    }

    /// Inverse of [`level`](Self::level); level 0 maps to `Unknown`
    pub fn from_level(level: i32) -> Option<Self> {
        match level {
            0 => Some(Permission::Unknown),
            1 => Some(Permission::Customer),
            2 => Some(Permission::Employee),
            3 => Some(Permission::Admin),
            _ => None,
        }
    }

    /// May mutate a cart and submit orders
    pub fn is_authenticated(self) -> bool {
        self.level() > 0
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Permission::Unknown => "unknown",
            Permission::Guest => "guest",
            Permission::Customer => "customer",
            Permission::Employee => "employee",
            Permission::Admin => "admin",
        };
        f.write_str(name)
    }
}

/// An actor as resolved by the server
///
/// Immutable: a new login yields a new `User`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    permission: Permission,
}

impl User {
    /// Create new user
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        permission: Permission,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            password: password.into(),
            permission,
        }
    }

    /// The guest actor
    pub fn guest() -> Self {
        Self::new("Guest", "", GUEST_EMAIL, "", Permission::Guest)
    }

    /// Actor returned when credentials match no account
    pub fn unknown(email: impl Into<String>) -> Self {
        Self::new("", "", email, "", Permission::Unknown)
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    /// Shorthand for `permission().level()`
    pub fn level(&self) -> i32 {
        self.permission.level()
    }

    pub fn is_guest(&self) -> bool {
        self.permission == Permission::Guest
    }

    /// Copy without the password, for sending back over the wire
    pub fn redacted(&self) -> Self {
        Self {
            password: String::new(),
            ..self.clone()
        }
    }
}
