//! User profiles and roles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// The sole authorization signal consumed by the order/product core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Reseller,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Reseller => "reseller",
            Self::Customer => "customer",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            // legacy profiles carry the original label for the reseller tier
            "reseller" | "cliente" => Ok(Self::Reseller),
            "customer" => Ok(Self::Customer),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub tax_id: Option<String>,
    pub tax_regime: Option<String>,
    pub business_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_reseller_label_parses() {
        assert_eq!("cliente".parse::<Role>().unwrap(), Role::Reseller);
        assert_eq!("reseller".parse::<Role>().unwrap(), Role::Reseller);
        assert!("root".parse::<Role>().is_err());
    }
}
