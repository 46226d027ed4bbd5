//! Record types shared with the surrounding UI layer.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Venue account credentials
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A tracked auction listing
///
/// Created by import or manual add with the outcome field empty; the bid
/// executor stamps `bid_outcome_at` when a submission sequence completes.
/// The stamp records that the sequence finished, not that the venue accepted
/// the bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    pub id: i64,
    /// Venue-specific listing identifier, e.g. "stg/1234"
    pub external_ref: String,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    pub bid_amount: Decimal,
    #[serde(default)]
    pub address: String,
    /// Owning account's username; empty when unassigned
    #[serde(default)]
    pub account_username: String,
    #[serde(default)]
    pub bid_outcome_at: Option<DateTime<Utc>>,
}

impl Auction {
    /// Zero-value listings never cost a session, a login, or a timer.
    pub fn is_eligible(&self) -> bool {
        self.bid_amount > Decimal::ZERO
    }
}

/// On-disk document shape: whole-collection read/replace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFile {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub auctions: Vec<Auction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn account_debug_redacts_password() {
        let account = Account {
            id: 1,
            username: "alice".into(),
            password: "hunter2".into(),
        };
        let rendered = format!("{:?}", account);
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn auction_eligibility_requires_positive_amount() {
        let mut auction = Auction {
            id: 7,
            external_ref: "stg/7".into(),
            deadline: None,
            bid_amount: dec!(0),
            address: String::new(),
            account_username: "alice".into(),
            bid_outcome_at: None,
        };
        assert!(!auction.is_eligible());

        auction.bid_amount = dec!(0.01);
        assert!(auction.is_eligible());
    }

    #[test]
    fn auction_json_uses_camel_case_and_defaults() {
        let json = r#"{"id":3,"externalRef":"stg/1234","bidAmount":25.5}"#;
        let auction: Auction = serde_json::from_str(json).unwrap();
        assert_eq!(auction.external_ref, "stg/1234");
        assert_eq!(auction.bid_amount, dec!(25.5));
        assert!(auction.deadline.is_none());
        assert!(auction.account_username.is_empty());
        assert!(auction.bid_outcome_at.is_none());

        let rendered = serde_json::to_string(&auction).unwrap();
        assert!(rendered.contains("externalRef"));
        assert!(rendered.contains("accountUsername"));
    }
}
