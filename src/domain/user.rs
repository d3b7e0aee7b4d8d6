use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[default]
    Free,
    Freemium,
    Premium,
}

impl AccountType {
    /// Balance credited to a freshly registered account of this tier.
    pub fn initial_balance(self) -> i64 {
        match self {
            AccountType::Free => 0,
            AccountType::Freemium | AccountType::Premium => 500,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccountType::Free => "free",
            AccountType::Freemium => "freemium",
            AccountType::Premium => "premium",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(AccountType::Free),
            "freemium" => Ok(AccountType::Freemium),
            "premium" => Ok(AccountType::Premium),
            other => Err(format!("unknown account type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub account_type: AccountType,
    pub trueqq_balance: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub account_type: AccountType,
    pub trueqq_balance: i64,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    pub fn new(name: String, email: String, password_hash: String, account_type: AccountType) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            account_type,
            trueqq_balance: account_type.initial_balance(),
            created_at: Utc::now(),
        }
    }

    pub fn into_user(self) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            account_type: self.account_type,
            trueqq_balance: self.trueqq_balance,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_balance_by_tier() {
        assert_eq!(AccountType::Free.initial_balance(), 0);
        assert_eq!(AccountType::Freemium.initial_balance(), 500);
        assert_eq!(AccountType::Premium.initial_balance(), 500);
    }

    #[test]
    fn test_new_user_gets_tier_balance() {
        let user = NewUser::new(
            "Ana".to_string(),
            "ana@example.com".to_string(),
            "hash".to_string(),
            AccountType::Premium,
        );
        assert_eq!(user.trueqq_balance, 500);
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = NewUser::new(
            "Ana".to_string(),
            "ana@example.com".to_string(),
            "secret-hash".to_string(),
            AccountType::Free,
        )
        .into_user();

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["accountType"], "free");
        assert_eq!(json["trueqqBalance"], 0);
    }

    #[test]
    fn test_account_type_round_trips_through_str() {
        assert_eq!("freemium".parse::<AccountType>().unwrap(), AccountType::Freemium);
        assert!("gold".parse::<AccountType>().is_err());
    }
}
