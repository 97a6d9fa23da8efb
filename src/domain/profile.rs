use super::money::Balance;
use serde::{Deserialize, Serialize};

pub type ProfileId = u32;

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Client,
    Contractor,
}

impl ProfileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Contractor => "contractor",
        }
    }
}

/// An account taking part in the marketplace: a client who pays for jobs or
/// a contractor who gets paid for them.
///
/// The balance is only ever mutated through a ledger transaction.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Profile {
    pub id: ProfileId,
    pub kind: ProfileKind,
    pub first_name: String,
    pub last_name: String,
    pub profession: String,
    pub balance: Balance,
}

impl Profile {
    pub fn is_client(&self) -> bool {
        self.kind == ProfileKind::Client
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_profile_kind_roundtrip() {
        let json = r#"{
            "id": 1,
            "kind": "client",
            "first_name": "Harry",
            "last_name": "Potter",
            "profession": "wizard",
            "balance": 1150
        }"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert!(profile.is_client());
        assert_eq!(profile.full_name(), "Harry Potter");
        assert_eq!(profile.balance, Balance::new(dec!(1150)));
    }
}
