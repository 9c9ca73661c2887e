//! Table names.
//!
//! Names arrive as URL path segments and double as file stems in the data
//! directory, so they are restricted to a conservative character set.

use std::borrow::Borrow;
use std::fmt;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Maximum length of a table name in bytes.
pub const MAX_NAME_LEN: usize = 128;

/// Length of server-generated names.
pub const GENERATED_NAME_LEN: usize = 16;

/// A validated table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    /// Validates and wraps a name.
    pub fn new(name: impl Into<String>) -> StoreResult<Self> {
        let name = name.into();
        if let Err(reason) = check(&name) {
            return Err(StoreError::InvalidName { name, reason });
        }
        Ok(Self(name))
    }

    /// Returns a random alphanumeric name of [`GENERATED_NAME_LEN`] characters.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let name: String = rng
            .sample_iter(&Alphanumeric)
            .take(GENERATED_NAME_LEN)
            .map(char::from)
            .collect();
        Self(name)
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the name, returning the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

fn check(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("name is empty");
    }
    if name.len() > MAX_NAME_LEN {
        return Err("name is longer than 128 bytes");
    }
    if name.starts_with('.') {
        return Err("name starts with '.'");
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
    {
        return Err("name may only contain ASCII letters, digits, '_', '-' and '.'");
    }
    Ok(())
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TableName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TableName {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for TableName {
    type Error = StoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TableName> for String {
    fn from(name: TableName) -> Self {
        name.0
    }
}
