//! Shared primitive types and record shapes used across the ledger core.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type CustomerId = i64;
pub type AccountId = i64;
pub type TxnId = i64;

/// Raised when a stored string does not map back to a known enum value.
#[derive(Debug, Error)]
#[error("unrecognized {what}: `{value}`")]
pub struct ParseEnumError {
    pub what: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Standard,
    Premier,
    Pending,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Standard => "standard",
            Tier::Premier => "premier",
            Tier::Pending => "pending",
        }
    }
}

impl FromStr for Tier {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Tier::Standard),
            "premier" => Ok(Tier::Premier),
            "pending" => Ok(Tier::Pending),
            other => Err(ParseEnumError {
                what: "tier",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    Checking,
    Savings,
    Investment,
}

impl AccountType {
    pub const ALL: [AccountType; 3] = [
        AccountType::Checking,
        AccountType::Savings,
        AccountType::Investment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "Checking",
            AccountType::Savings => "Savings",
            AccountType::Investment => "Investment",
        }
    }
}

impl FromStr for AccountType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Checking" => Ok(AccountType::Checking),
            "Savings" => Ok(AccountType::Savings),
            "Investment" => Ok(AccountType::Investment),
            other => Err(ParseEnumError {
                what: "account type",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxnKind {
    Send,
    Receive,
    AdminDeposit,
    AdminMessage,
}

impl TxnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxnKind::Send => "send",
            TxnKind::Receive => "receive",
            TxnKind::AdminDeposit => "admin_deposit",
            TxnKind::AdminMessage => "admin_message",
        }
    }
}

impl FromStr for TxnKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "send" => Ok(TxnKind::Send),
            "receive" => Ok(TxnKind::Receive),
            "admin_deposit" => Ok(TxnKind::AdminDeposit),
            "admin_message" => Ok(TxnKind::AdminMessage),
            other => Err(ParseEnumError {
                what: "transaction kind",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnStatus {
    Pending,
    Completed,
}

impl TxnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxnStatus::Pending => "pending",
            TxnStatus::Completed => "completed",
        }
    }
}

impl FromStr for TxnStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TxnStatus::Pending),
            "completed" => Ok(TxnStatus::Completed),
            other => Err(ParseEnumError {
                what: "transaction status",
                value: other.to_string(),
            }),
        }
    }
}

/// A customer-facing 10-digit account number. Construction validates the
/// format, so a held value is always well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountNumber(String);

impl AccountNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last four digits, the only part shown to counterparties.
    pub fn tail(&self) -> &str {
        &self.0[6..]
    }
}

impl FromStr for AccountNumber {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == 10 && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(AccountNumber(s.to_string()))
        } else {
            Err(ParseEnumError {
                what: "account number (expected 10 digits)",
                value: s.to_string(),
            })
        }
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: CustomerId,
    pub username: String,
    pub account_number: AccountNumber,
    pub tier: Tier,
    pub is_admin: bool,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
    pub account_id: AccountId,
    pub customer_id: CustomerId,
    pub account_type: AccountType,
    pub balance: Decimal,
}

/// Immutable audit record. `account_type` is a display label: the owning
/// account's type for ledger entries, `"System"` for admin messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub txn_id: TxnId,
    pub customer_id: CustomerId,
    pub kind: TxnKind,
    pub account_type: String,
    pub amount: Decimal,
    pub note: Option<String>,
    pub status: TxnStatus,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_number_format() {
        assert!("0123456789".parse::<AccountNumber>().is_ok());
        assert!("123456789".parse::<AccountNumber>().is_err());
        assert!("12345678901".parse::<AccountNumber>().is_err());
        assert!("12345678a9".parse::<AccountNumber>().is_err());

        let n: AccountNumber = "9876543210".parse().unwrap();
        assert_eq!(n.tail(), "3210");
    }

    #[test]
    fn enum_round_trips() {
        for tier in [Tier::Standard, Tier::Premier, Tier::Pending] {
            assert_eq!(tier.as_str().parse::<Tier>().unwrap(), tier);
        }
        for kind in [
            TxnKind::Send,
            TxnKind::Receive,
            TxnKind::AdminDeposit,
            TxnKind::AdminMessage,
        ] {
            assert_eq!(kind.as_str().parse::<TxnKind>().unwrap(), kind);
        }
        for at in AccountType::ALL {
            assert_eq!(at.as_str().parse::<AccountType>().unwrap(), at);
        }
    }
}
