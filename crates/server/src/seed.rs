//! Initial accounts and catalog
//!
//! Loaded from a JSON file when `--seed` is given, otherwise built in.

use anyhow::{Context, Result};
use cellar_core::{Permission, Wine};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Account as written in a seed file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    /// 1 customer, 2 employee, 3 admin
    pub permission: i32,
}

impl SeedUser {
    fn new(first_name: &str, last_name: &str, email: &str, password: &str, permission: i32) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            permission,
        }
    }

    /// Seeded accounts must have a login-capable level
    pub fn permission(&self) -> Result<Permission> {
        match Permission::from_level(self.permission) {
            Some(p) if p.is_authenticated() => Ok(p),
            _ => anyhow::bail!(
                "Account {} has invalid permission level {}",
                self.email,
                self.permission
            ),
        }
    }
}

/// Everything the store starts with
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    pub users: Vec<SeedUser>,
    pub wines: Vec<Wine>,
}

impl SeedData {
    /// Built-in data set
    pub fn builtin() -> Self {
        Self {
            users: vec![
                SeedUser::new("Ursula", "User", "user@user.com", "pwd", 1),
                SeedUser::new("Emil", "Employee", "employee@employee.com", "pwd", 2),
                SeedUser::new("Ada", "Admin", "admin@admin.com", "pwd", 3),
            ],
            wines: vec![
                Wine::new(20, "Barolo", "Giacomo Conterno", 2015, "Tar and roses", 24, "Nebbiolo"),
                Wine::new(21, "Brunello di Montalcino", "Biondi-Santi", 2016, "Sour cherry", 12, "Sangiovese"),
                Wine::new(22, "Amarone della Valpolicella", "Quintarelli", 2012, "Dried fig", 6, "Corvina, Rondinella"),
                Wine::new(23, "Chianti Classico", "Fontodi", 2019, "Violet", 36, "Sangiovese"),
                Wine::new(24, "Soave Classico", "Pieropan", 2021, "Almond", 0, "Garganega"),
                Wine::new(25, "Etna Rosso", "Benanti", 2020, "Volcanic", 18, "Nerello Mascalese"),
            ],
        }
    }

    /// Load from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid seed file {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let seed: SeedData = serde_json::from_str(json)?;
        seed.validate()?;
        Ok(seed)
    }

    /// Reject levels outside 1..=3 and wines using the reserved id 0
    pub fn validate(&self) -> Result<()> {
        for user in &self.users {
            user.permission()?;
        }
        if let Some(wine) = self.wines.iter().find(|w| w.is_sentinel()) {
            anyhow::bail!("Wine {:?} uses reserved id 0", wine.name);
        }
        Ok(())
    }
}
