//! # EIP-712 Transaction Typed Data
//!
//! The document an injected wallet signs with `eth_signTypedData_v4` for a
//! transaction. Its message commits to the sign bytes, so the account
//! contract can rebuild the digest from the transaction alone.
//!
//! ```text
//! domain  = EIP712Domain(string name,address verifyingContract)
//! message = Tx(address sender,string chain_id,uint32 sequence,bytes32 sign_bytes)
//! digest  = keccak256(0x19 ∥ 0x01 ∥ hashStruct(domain) ∥ hashStruct(message))
//! ```
//!
//! [`TypedData`] hashes any v4 document from its declared types. Off-chain
//! payloads are wrapped in `EIP712Domain(string name)`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_types::{Addr, ChainId, Hash256};

use crate::errors::CryptoError;
use crate::hashing::keccak256;

const DOMAIN_NAME: &str = "EIP712Domain";
const DOMAIN_TYPE: &str = "EIP712Domain(string name,address verifyingContract)";
const TX_TYPE: &str = "Tx(address sender,string chain_id,uint32 sequence,bytes32 sign_bytes)";

/// One field of an EIP-712 struct type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedDataProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl TypedDataProperty {
    fn new(name: &str, kind: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
        }
    }
}

/// Signing domain: the application name and the account being operated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Domain {
    pub name: String,
    pub verifying_contract: Addr,
}

/// The `Tx` struct value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxTypedMessage {
    pub sender: Addr,
    pub chain_id: ChainId,
    pub sequence: u32,
    /// `0x` + lowercase hex of the 32 sign bytes.
    pub sign_bytes: String,
}

/// Full `eth_signTypedData_v4` document for a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxTypedData {
    pub types: BTreeMap<String, Vec<TypedDataProperty>>,
    pub primary_type: String,
    pub domain: Eip712Domain,
    pub message: TxTypedMessage,
}

impl TxTypedData {
    /// Build the document for `sender` signing `sign_bytes`.
    pub fn new(
        app_name: &str,
        sender: Addr,
        chain_id: ChainId,
        sequence: u32,
        sign_bytes: &Hash256,
    ) -> Self {
        let mut types = BTreeMap::new();
        types.insert(
            "EIP712Domain".to_string(),
            vec![
                TypedDataProperty::new("name", "string"),
                TypedDataProperty::new("verifyingContract", "address"),
            ],
        );
        types.insert(
            "Tx".to_string(),
            vec![
                TypedDataProperty::new("sender", "address"),
                TypedDataProperty::new("chain_id", "string"),
                TypedDataProperty::new("sequence", "uint32"),
                TypedDataProperty::new("sign_bytes", "bytes32"),
            ],
        );

        Self {
            types,
            primary_type: "Tx".to_string(),
            domain: Eip712Domain {
                name: app_name.to_string(),
                verifying_contract: sender,
            },
            message: TxTypedMessage {
                sender,
                chain_id,
                sequence,
                sign_bytes: format!("0x{}", hex::encode(sign_bytes.as_bytes())),
            },
        }
    }

    /// The committed sign bytes.
    pub fn sign_bytes(&self) -> Result<[u8; 32], CryptoError> {
        let stripped = self
            .message
            .sign_bytes
            .strip_prefix("0x")
            .unwrap_or(&self.message.sign_bytes);
        let bytes = hex::decode(stripped).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
        bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidHex(self.message.sign_bytes.clone()))
    }

    /// `hashStruct(domain)`.
    pub fn domain_separator(&self) -> [u8; 32] {
        let mut encoded = Vec::with_capacity(32 * 3);
        encoded.extend_from_slice(&keccak256(DOMAIN_TYPE.as_bytes()));
        encoded.extend_from_slice(&keccak256(self.domain.name.as_bytes()));
        encoded.extend_from_slice(&pad_address(&self.domain.verifying_contract));
        keccak256(&encoded)
    }

    /// `hashStruct(message)`.
    pub fn struct_hash(&self) -> Result<[u8; 32], CryptoError> {
        let mut sequence = [0u8; 32];
        sequence[28..].copy_from_slice(&self.message.sequence.to_be_bytes());

        let mut encoded = Vec::with_capacity(32 * 5);
        encoded.extend_from_slice(&keccak256(TX_TYPE.as_bytes()));
        encoded.extend_from_slice(&pad_address(&self.message.sender));
        encoded.extend_from_slice(&keccak256(self.message.chain_id.as_str().as_bytes()));
        encoded.extend_from_slice(&sequence);
        encoded.extend_from_slice(&self.sign_bytes()?);
        Ok(keccak256(&encoded))
    }

    /// Digest the wallet signs.
    pub fn hash(&self) -> Result<[u8; 32], CryptoError> {
        let mut encoded = Vec::with_capacity(2 + 64);
        encoded.extend_from_slice(&[0x19, 0x01]);
        encoded.extend_from_slice(&self.domain_separator());
        encoded.extend_from_slice(&self.struct_hash()?);
        Ok(keccak256(&encoded))
    }
}

fn pad_address(addr: &Addr) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(addr.as_bytes());
    word
}

// =============================================================================
// Generic typed data
// =============================================================================

/// Any `eth_signTypedData_v4` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    pub types: BTreeMap<String, Vec<TypedDataProperty>>,
    pub primary_type: String,
    pub domain: Value,
    pub message: Value,
}

impl TypedData {
    /// Wrap an off-chain payload `{ types, primaryType, message }` in the
    /// application domain.
    pub fn arbitrary(app_name: &str, payload: &Value) -> Result<Self, CryptoError> {
        let types = payload
            .get("types")
            .filter(|t| t.is_object())
            .ok_or(CryptoError::TypedDataRequired)?;
        let primary_type = payload
            .get("primaryType")
            .and_then(Value::as_str)
            .ok_or(CryptoError::TypedDataRequired)?;

        let mut types: BTreeMap<String, Vec<TypedDataProperty>> =
            serde_json::from_value(types.clone()).map_err(|e| CryptoError::InvalidTypedData(e.to_string()))?;
        if !types.contains_key(primary_type) {
            return Err(CryptoError::InvalidTypedData(format!("unknown primary type {primary_type}")));
        }
        types.insert(DOMAIN_NAME.to_string(), vec![TypedDataProperty::new("name", "string")]);

        Ok(Self {
            types,
            primary_type: primary_type.to_string(),
            domain: json!({ "name": app_name }),
            message: payload.get("message").cloned().unwrap_or_else(|| json!({})),
        })
    }

    /// Digest the wallet signs.
    pub fn hash(&self) -> Result<[u8; 32], CryptoError> {
        let mut encoded = Vec::with_capacity(2 + 64);
        encoded.extend_from_slice(&[0x19, 0x01]);
        encoded.extend_from_slice(&self.hash_struct(DOMAIN_NAME, &self.domain)?);
        encoded.extend_from_slice(&self.hash_struct(&self.primary_type, &self.message)?);
        Ok(keccak256(&encoded))
    }

    /// `Name(kind field,..)` followed by every referenced struct in name order.
    pub fn encode_type(&self, name: &str) -> Result<String, CryptoError> {
        let mut deps = BTreeSet::new();
        self.collect_deps(name, &mut deps)?;
        deps.remove(name);

        let mut out = self.type_signature(name)?;
        for dep in &deps {
            out.push_str(&self.type_signature(dep)?);
        }
        Ok(out)
    }

    pub fn hash_struct(&self, name: &str, value: &Value) -> Result<[u8; 32], CryptoError> {
        let fields = self.fields(name)?;
        let mut encoded = Vec::with_capacity(32 * (fields.len() + 1));
        encoded.extend_from_slice(&keccak256(self.encode_type(name)?.as_bytes()));
        for field in fields {
            let item = value
                .get(&field.name)
                .ok_or_else(|| CryptoError::InvalidTypedData(format!("{name}.{} missing", field.name)))?;
            encoded.extend_from_slice(&self.encode_value(&field.kind, item)?);
        }
        Ok(keccak256(&encoded))
    }

    fn fields(&self, name: &str) -> Result<&[TypedDataProperty], CryptoError> {
        self.types
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| CryptoError::InvalidTypedData(format!("unknown type {name}")))
    }

    fn type_signature(&self, name: &str) -> Result<String, CryptoError> {
        let fields = self
            .fields(name)?
            .iter()
            .map(|f| format!("{} {}", f.kind, f.name))
            .collect::<Vec<_>>()
            .join(",");
        Ok(format!("{name}({fields})"))
    }

    fn collect_deps(&self, name: &str, deps: &mut BTreeSet<String>) -> Result<(), CryptoError> {
        if !deps.insert(name.to_string()) {
            return Ok(());
        }
        for field in self.fields(name)? {
            let base = base_type(&field.kind);
            if self.types.contains_key(base) {
                self.collect_deps(base, deps)?;
            }
        }
        Ok(())
    }

    fn encode_value(&self, kind: &str, value: &Value) -> Result<[u8; 32], CryptoError> {
        if let Some(item_kind) = array_item_type(kind) {
            let items = value.as_array().ok_or_else(|| mismatch(kind, value))?;
            let mut encoded = Vec::with_capacity(32 * items.len());
            for item in items {
                encoded.extend_from_slice(&self.encode_value(item_kind, item)?);
            }
            return Ok(keccak256(&encoded));
        }
        if self.types.contains_key(kind) {
            return self.hash_struct(kind, value);
        }

        let mut word = [0u8; 32];
        match kind {
            "string" => Ok(keccak256(value.as_str().ok_or_else(|| mismatch(kind, value))?.as_bytes())),
            "bytes" => Ok(keccak256(&hex_value(kind, value)?)),
            "bool" => {
                word[31] = u8::from(value.as_bool().ok_or_else(|| mismatch(kind, value))?);
                Ok(word)
            }
            "address" => {
                let bytes = hex_value(kind, value)?;
                if bytes.len() != 20 {
                    return Err(mismatch(kind, value));
                }
                word[12..].copy_from_slice(&bytes);
                Ok(word)
            }
            _ if kind.starts_with("bytes") => {
                let bytes = hex_value(kind, value)?;
                if kind[5..].parse::<usize>().ok() != Some(bytes.len()) || bytes.len() > 32 {
                    return Err(mismatch(kind, value));
                }
                word[..bytes.len()].copy_from_slice(&bytes);
                Ok(word)
            }
            _ if kind.starts_with("uint") => {
                word[16..].copy_from_slice(&uint_value(kind, value)?.to_be_bytes());
                Ok(word)
            }
            _ if kind.starts_with("int") => {
                let n = int_value(kind, value)?;
                if n < 0 {
                    word = [0xff; 32];
                }
                word[16..].copy_from_slice(&n.to_be_bytes());
                Ok(word)
            }
            _ => Err(CryptoError::InvalidTypedData(format!("unsupported type {kind}"))),
        }
    }
}

/// `T` of `T[]` or `T[n]`.
fn array_item_type(kind: &str) -> Option<&str> {
    let open = kind.strip_suffix(']')?.rfind('[')?;
    Some(&kind[..open])
}

fn base_type(kind: &str) -> &str {
    kind.split('[').next().unwrap_or(kind)
}

fn mismatch(kind: &str, value: &Value) -> CryptoError {
    CryptoError::InvalidTypedData(format!("{value} is not a valid {kind}"))
}

fn hex_value(kind: &str, value: &Value) -> Result<Vec<u8>, CryptoError> {
    let text = value.as_str().ok_or_else(|| mismatch(kind, value))?;
    hex::decode(text.strip_prefix("0x").unwrap_or(text)).map_err(|e| CryptoError::InvalidHex(e.to_string()))
}

fn uint_value(kind: &str, value: &Value) -> Result<u128, CryptoError> {
    match value {
        Value::Number(n) => n.as_u64().map(u128::from),
        Value::String(s) => match s.strip_prefix("0x") {
            Some(hex) => u128::from_str_radix(hex, 16).ok(),
            None => s.parse().ok(),
        },
        _ => None,
    }
    .ok_or_else(|| mismatch(kind, value))
}

fn int_value(kind: &str, value: &Value) -> Result<i128, CryptoError> {
    match value {
        Value::Number(n) => n.as_i64().map(i128::from),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
    .ok_or_else(|| mismatch(kind, value))
}
