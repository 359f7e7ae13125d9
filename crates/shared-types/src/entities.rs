//! # Core Domain Entities
//!
//! Identity types, accounts and connection metadata.
//!
//! ## Clusters
//!
//! - **Identity**: `Addr`, `Hash256`, `ChainId`, `Username`, `Uid`, `Binary`
//! - **Accounts**: `Account`, `AccountType`
//! - **Connectors**: `ConnectorInfo`, `ConnectorKind`, `ConnectionStatus`

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::errors::TypesError;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A 20-byte account or contract address.
///
/// Rendered as `0x` followed by 40 lowercase hex characters.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, SerializeDisplay, DeserializeFromStr,
)]
pub struct Addr(pub [u8; 20]);

impl Addr {
    /// Number of bytes in an address.
    pub const LENGTH: usize = 20;

    /// Raw address bytes (no prefix).
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Build an address from a byte slice of exactly 20 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypesError> {
        let array: [u8; 20] = bytes.try_into().map_err(|_| TypesError::InvalidLength {
            expected: Self::LENGTH,
            actual: bytes.len(),
        })?;
        Ok(Self(array))
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Addr {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s
            .strip_prefix("0x")
            .ok_or_else(|| TypesError::InvalidAddress(s.to_string()))?;
        if stripped.len() != Self::LENGTH * 2 {
            return Err(TypesError::InvalidAddress(s.to_string()));
        }
        let bytes = hex::decode(stripped).map_err(|_| TypesError::InvalidAddress(s.to_string()))?;
        Self::from_slice(&bytes)
    }
}

/// A 32-byte hash (SHA-256 output).
///
/// Rendered as 64 uppercase hex characters; parsing accepts either case.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, SerializeDisplay, DeserializeFromStr,
)]
pub struct Hash256(pub [u8; 32]);

/// Fingerprint of a signing key (public key or passkey credential id).
pub type KeyHash = Hash256;

impl Hash256 {
    /// Number of bytes in a hash.
    pub const LENGTH: usize = 32;

    /// The all-zero hash.
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypesError> {
        let array: [u8; 32] = bytes.try_into().map_err(|_| TypesError::InvalidLength {
            expected: Self::LENGTH,
            actual: bytes.len(),
        })?;
        Ok(Self(array))
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl FromStr for Hash256 {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        if stripped.len() != Self::LENGTH * 2 {
            return Err(TypesError::InvalidHash(s.to_string()));
        }
        let bytes = hex::decode(stripped).map_err(|_| TypesError::InvalidHash(s.to_string()))?;
        Self::from_slice(&bytes)
    }
}

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

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

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_newtype!(
    /// Identifier of a chain (e.g. `"dev-1"`).
    ChainId
);

string_newtype!(
    /// Registered username owning one or more accounts.
    Username
);

string_newtype!(
    /// Process-unique tag of a connector instance.
    ///
    /// Not stable across restarts; persisted sessions are matched back to
    /// connectors by `ConnectorInfo::id`.
    Uid
);

impl Uid {
    /// Generate a fresh random uid.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }
}

/// Arbitrary bytes, serialized as standard base64.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Binary(pub Vec<u8>);

impl Binary {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    pub fn from_base64(encoded: &str) -> Result<Self, TypesError> {
        STANDARD
            .decode(encoded)
            .map(Self)
            .map_err(|e| TypesError::InvalidBase64(e.to_string()))
    }
}

impl From<Vec<u8>> for Binary {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Binary {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl Serialize for Binary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Binary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// CLUSTER B: ACCOUNTS
// =============================================================================

/// Kind of smart account owned by a user.
///
/// The numeric code is the single byte appended to the account salt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Spot,
    Margin,
    Multi,
}

impl AccountType {
    /// Salt byte for this account type.
    pub fn code(self) -> u8 {
        match self {
            Self::Spot => 0,
            Self::Margin => 1,
            Self::Multi => 2,
        }
    }
}

impl FromStr for AccountType {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spot" => Ok(Self::Spot),
            "margin" => Ok(Self::Margin),
            "multi" => Ok(Self::Multi),
            other => Err(TypesError::UnknownAccountType(other.to_string())),
        }
    }
}

/// An on-chain account as reported by a connector.
///
/// Immutable once produced; connections keep an index into their account
/// list rather than a separate copy of the active account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account address.
    pub address: Addr,
    /// Owner username.
    pub username: Username,
    /// Index assigned by the account factory.
    pub index: u32,
    /// Account type tag.
    #[serde(rename = "type")]
    pub account_type: AccountType,
}

// =============================================================================
// CLUSTER C: CONNECTORS
// =============================================================================

/// Wallet technology behind a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorKind {
    /// Injected browser-extension provider (EIP-1193).
    Eip1193,
    /// WebAuthn passkey.
    Passkey,
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eip1193 => f.write_str("eip1193"),
            Self::Passkey => f.write_str("passkey"),
        }
    }
}

/// Serializable identity of a connector.
///
/// This is the reduced form a connection carries and persists in place of
/// the live connector object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectorInfo {
    /// Stable connector id (e.g. `"passkey"`, `"metamask"`, an EIP-6963 rdns).
    pub id: String,
    /// Human readable name.
    pub name: String,
    /// Wallet technology.
    #[serde(rename = "type")]
    pub kind: ConnectorKind,
    /// Process-unique instance tag.
    pub uid: Uid,
}

/// Overall connection status of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
        };
        f.write_str(label)
    }
}
