use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OpportunityError;

/// Separator between the account and staking components of a [`UserStakingId`]
pub const USER_STAKING_ID_SEPARATOR: char = '*';

/// Wallet-derived account, e.g. `eip155:1:0xabc...`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

/// Chain-qualified opportunity identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StakingId(String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(AccountId);
string_id!(StakingId);

/// One account's position in one opportunity: `accountId*stakingId`.
///
/// Built either with [`UserStakingId::compose`] or by parsing, which rejects
/// strings without a separator. Decomposition is therefore infallible.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserStakingId {
    raw: String,
    split: usize,
}

impl UserStakingId {
    pub fn compose(account_id: &AccountId, staking_id: &StakingId) -> Self {
        let raw = format!("{}{}{}", account_id, USER_STAKING_ID_SEPARATOR, staking_id);
        // Split where parsing would, so a composed id equals its own re-parse
        let split = raw.find(USER_STAKING_ID_SEPARATOR).unwrap_or(account_id.as_str().len());
        Self { raw, split }
    }

    pub fn decompose(&self) -> (AccountId, StakingId) {
        (
            AccountId::new(self.account_part()),
            StakingId::new(self.staking_part()),
        )
    }

    pub fn account_part(&self) -> &str {
        &self.raw[..self.split]
    }

    pub fn staking_part(&self) -> &str {
        &self.raw[self.split + USER_STAKING_ID_SEPARATOR.len_utf8()..]
    }

    /// Join predicate between per-account records and per-opportunity metadata
    pub fn matches_staking_id(&self, staking_id: &StakingId) -> bool {
        self.staking_part() == staking_id.as_str()
    }

    pub fn belongs_to(&self, account_id: &AccountId) -> bool {
        self.account_part() == account_id.as_str()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for UserStakingId {
    type Err = OpportunityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s
            .find(USER_STAKING_ID_SEPARATOR)
            .ok_or_else(|| OpportunityError::MalformedUserStakingId(s.to_string()))?;
        Ok(Self { raw: s.to_string(), split })
    }
}

impl TryFrom<String> for UserStakingId {
    type Error = OpportunityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UserStakingId> for String {
    fn from(value: UserStakingId) -> Self {
        value.raw
    }
}

impl fmt::Display for UserStakingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// CAIP-19 asset id: `<namespace>:<chain reference>/<asset namespace>:<asset reference>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetId {
    raw: String,
    slash: usize,
}

impl AssetId {
    pub fn chain_id(&self) -> &str {
        &self.raw[..self.slash]
    }

    pub fn asset_namespace(&self) -> &str {
        let asset = &self.raw[self.slash + 1..];
        asset.split_once(':').map(|(namespace, _)| namespace).unwrap_or(asset)
    }

    pub fn asset_reference(&self) -> &str {
        let asset = &self.raw[self.slash + 1..];
        asset.split_once(':').map(|(_, reference)| reference).unwrap_or(asset)
    }

    /// Native assets live under the `slip44` namespace, everything else is a token contract
    pub fn is_token(&self) -> bool {
        self.asset_namespace() != "slip44"
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for AssetId {
    type Err = OpportunityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || OpportunityError::MalformedAssetId(s.to_string());
        let (chain, asset) = s.split_once('/').ok_or_else(malformed)?;
        let chain_ok = chain
            .split_once(':')
            .is_some_and(|(namespace, reference)| !namespace.is_empty() && !reference.is_empty());
        let asset_ok = asset
            .split_once(':')
            .is_some_and(|(namespace, reference)| !namespace.is_empty() && !reference.is_empty());
        if !chain_ok || !asset_ok {
            return Err(malformed());
        }
        Ok(Self { raw: s.to_string(), slash: chain.len() })
    }
}

impl TryFrom<String> for AssetId {
    type Error = OpportunityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AssetId> for String {
    fn from(value: AssetId) -> Self {
        value.raw
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&AssetId> for StakingId {
    fn from(value: &AssetId) -> Self {
        StakingId::new(value.as_str())
    }
}
