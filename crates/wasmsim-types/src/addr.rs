use crate::error::TypesError;
use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length in bytes of a canonical contract address.
pub const ADDR_LEN: usize = 20;

/// Module namespace used when deriving contract addresses.
const MODULE_KEY: &[u8] = b"wasm";

/// A bech32-encoded account or contract address.
///
/// `Addr` is a thin wrapper over the encoded string: the human-readable
/// prefix is supplied by the host at simulator construction, so unlike a
/// fixed-prefix chain type there is no single canonical HRP baked in here.
/// Use [`validate_addr`] to check an untrusted input against a prefix, or
/// [`Addr::unchecked`] when the value is already known to be well-formed.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Addr(String);

impl Addr {
    /// Wrap a string without validating it.
    pub fn unchecked(input: impl Into<String>) -> Self {
        Self(input.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Addr({})", self.0)
    }
}

impl AsRef<str> for Addr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Check that a human-readable prefix is valid bech32.
pub fn validate_prefix(prefix: &str) -> Result<(), TypesError> {
    Hrp::parse(prefix).map_err(|e| TypesError::InvalidPrefix(e.to_string()))?;
    Ok(())
}

/// Validate an address string: well-formed bech32, expected prefix, and a
/// 20-byte payload.
pub fn validate_addr(prefix: &str, input: &str) -> Result<Addr, TypesError> {
    let (hrp, data) =
        bech32::decode(input).map_err(|e| TypesError::Bech32Error(e.to_string()))?;

    let expected = Hrp::parse(prefix).map_err(|e| TypesError::InvalidPrefix(e.to_string()))?;
    if hrp != expected {
        return Err(TypesError::InvalidAddressFormat(format!(
            "invalid prefix: expected '{}', got '{}'",
            prefix, hrp
        )));
    }

    if data.len() != ADDR_LEN {
        return Err(TypesError::InvalidAddressLength(data.len()));
    }

    Ok(Addr(input.to_string()))
}

/// Raw 20-byte hash for a contract instance.
///
/// # Derivation
/// `SHA256(SHA256("module") || "wasm" || 0x00 || be_u64(code_id) || be_u64(instance_id))[0..20]`
///
/// This matches the module-account scheme used by wasmd, so addresses are
/// deterministic across runs for a given `(code_id, instance_id)` pair.
pub fn contract_addr_hash(code_id: u64, instance_id: u64) -> [u8; ADDR_LEN] {
    let typ_hash = Sha256::digest(b"module");

    let mut hasher = Sha256::new();
    hasher.update(typ_hash);
    hasher.update(MODULE_KEY);
    hasher.update([0u8]);
    hasher.update(code_id.to_be_bytes());
    hasher.update(instance_id.to_be_bytes());
    let hash = hasher.finalize();

    let mut out = [0u8; ADDR_LEN];
    out.copy_from_slice(&hash[..ADDR_LEN]);
    out
}

/// Derive the bech32 address for a contract instance under the given prefix.
pub fn derive_contract_addr(
    prefix: &str,
    code_id: u64,
    instance_id: u64,
) -> Result<Addr, TypesError> {
    let hrp = Hrp::parse(prefix).map_err(|e| TypesError::InvalidPrefix(e.to_string()))?;
    let hash = contract_addr_hash(code_id, instance_id);
    let encoded = bech32::encode::<Bech32>(hrp, &hash)
        .map_err(|e| TypesError::Bech32Error(e.to_string()))?;
    Ok(Addr(encoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addr_unchecked() {
        let addr = Addr::unchecked("wasm1abcdef");
        assert_eq!(addr.as_str(), "wasm1abcdef");
        assert_eq!(addr.to_string(), "wasm1abcdef");
    }

    #[test]
    fn test_derive_deterministic() {
        let a = derive_contract_addr("wasm", 1, 1).unwrap();
        let b = derive_contract_addr("wasm", 1, 1).unwrap();
        assert_eq!(a, b);

        // Different ids give different addresses
        let c = derive_contract_addr("wasm", 1, 2).unwrap();
        assert_ne!(a, c);
        let d = derive_contract_addr("wasm", 2, 1).unwrap();
        assert_ne!(a, d);
    }

    #[test]
    fn test_derive_matches_manual_hash() {
        use sha2::{Digest, Sha256};

        let th = Sha256::digest(b"module");
        let mut payload = Vec::new();
        payload.extend_from_slice(b"wasm\0");
        payload.extend_from_slice(&1u64.to_be_bytes());
        payload.extend_from_slice(&1u64.to_be_bytes());

        let mut hasher = Sha256::new();
        hasher.update(th);
        hasher.update(&payload);
        let expected = hasher.finalize();

        assert_eq!(contract_addr_hash(1, 1), expected[..20]);
    }

    #[test]
    fn test_derived_addr_roundtrip() {
        let addr = derive_contract_addr("cosmwasm", 3, 7).unwrap();
        assert!(addr.as_str().starts_with("cosmwasm1"));

        let validated = validate_addr("cosmwasm", addr.as_str()).unwrap();
        assert_eq!(validated, addr);

        let (_, data) = bech32::decode(addr.as_str()).unwrap();
        assert_eq!(data, contract_addr_hash(3, 7));
    }

    #[test]
    fn test_validate_addr_rejects_wrong_prefix() {
        let addr = derive_contract_addr("wasm", 1, 1).unwrap();
        assert!(validate_addr("other", addr.as_str()).is_err());
    }

    #[test]
    fn test_validate_addr_rejects_garbage() {
        assert!(validate_addr("wasm", "not-an-address").is_err());
        assert!(validate_addr("wasm", "").is_err());
    }

    #[test]
    fn test_validate_prefix() {
        assert!(validate_prefix("wasm").is_ok());
        assert!(validate_prefix("").is_err());
    }

    #[test]
    fn test_addr_ordering() {
        let a = Addr::unchecked("aaa");
        let b = Addr::unchecked("bbb");
        assert!(a < b);
    }
}
