use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Customer gender as stored in `customers.gender`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    /// Case-insensitive, so both `MALE` and `male` parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(format!("gender must be 'male' or 'female', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PharmacistSeed {
    pub user_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerSeed {
    pub user_name: String,
    pub email: String,
    pub age: i32,
    pub gender: Gender,
}

#[derive(Debug, Default, Deserialize)]
pub struct AccountsFile {
    #[serde(default)]
    pub pharmacists: Vec<PharmacistSeed>,
    #[serde(default)]
    pub customers: Vec<CustomerSeed>,
}

/// Load and validate the account seed file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_accounts(path: &Path) -> Result<AccountsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::AccountsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let accounts: AccountsFile = serde_yaml::from_str(&content)?;
    validate_accounts(&accounts)?;

    Ok(accounts)
}

fn validate_accounts(accounts: &AccountsFile) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    let names = accounts
        .pharmacists
        .iter()
        .map(|p| ("pharmacist", p.user_name.as_str(), p.email.as_str()))
        .chain(
            accounts
                .customers
                .iter()
                .map(|c| ("customer", c.user_name.as_str(), c.email.as_str())),
        );

    for (kind, user_name, email) in names {
        if user_name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{kind} user_name must be non-empty"
            )));
        }
        if !email.contains('@') {
            return Err(ConfigError::Validation(format!(
                "{kind} '{user_name}' has invalid email '{email}'"
            )));
        }
        // Pharmacists and customers live in separate tables; uniqueness is per kind.
        if !seen.insert((kind, user_name.to_lowercase())) {
            return Err(ConfigError::Validation(format!(
                "duplicate {kind} user_name: '{user_name}'"
            )));
        }
    }

    for customer in &accounts.customers {
        if !(0..=150).contains(&customer.age) {
            return Err(ConfigError::Validation(format!(
                "customer '{}' has invalid age {}; must be 0..=150",
                customer.user_name, customer.age
            )));
        }
    }

    Ok(())
}
