//! Signature-level ABI helpers.
//!
//! Probing works from canonical signature strings that may name functions no
//! binding declares, so selectors, interface identifiers and placeholder
//! calldata are computed here. Typed encoding and decoding of the known
//! surface lives in `bindings`.

use crate::error::AbiError;
use alloy_primitives::{keccak256, Address, Bytes, FixedBytes, Selector, B256, U256};
use alloy_sol_types::{Revert, SolError};

/// Size of one ABI word in bytes.
pub const WORD: usize = 32;

/// Four-byte ERC-165 interface identifier.
pub type InterfaceId = FixedBytes<4>;

/// Compute the 4-byte selector of a canonical function signature.
pub fn selector(signature: &str) -> Selector {
    let hash = keccak256(signature.as_bytes());
    Selector::from_slice(&hash[..4])
}

/// Compute an interface identifier as the XOR of every member selector.
///
/// XOR is commutative, so the result does not depend on declaration order.
pub fn interface_id<'a, I>(signatures: I) -> InterfaceId
where
    I: IntoIterator<Item = &'a str>,
{
    let folded = signatures
        .into_iter()
        .map(|sig| u32::from_be_bytes(selector(sig).0))
        .fold(0u32, |acc, sel| acc ^ sel);
    InterfaceId::from(folded.to_be_bytes())
}

// ============================================================================
// SIGNATURES
// ============================================================================

/// Whether a parameter can be padded with a single placeholder word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Fixed-size elementary type occupying one word
    Static,
    /// `string`, `bytes`, arrays or tuples
    Dynamic,
}

impl ParamKind {
    fn of(ty: &str) -> Self {
        if ty == "string" || ty == "bytes" || ty.ends_with(']') || ty.starts_with('(') {
            ParamKind::Dynamic
        } else {
            ParamKind::Static
        }
    }
}

/// A parsed canonical function signature such as `getState(uint256)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    canonical: String,
    name: String,
    params: Vec<String>,
}

impl FunctionSignature {
    /// Parse a canonical signature. Whitespace is rejected because it would
    /// silently change the selector.
    pub fn parse(signature: &str) -> Result<Self, AbiError> {
        let invalid = |reason: &str| AbiError::InvalidSignature {
            signature: signature.to_string(),
            reason: reason.to_string(),
        };

        if signature.chars().any(char::is_whitespace) {
            return Err(invalid("contains whitespace"));
        }
        let open = signature.find('(').ok_or_else(|| invalid("missing '('"))?;
        if !signature.ends_with(')') {
            return Err(invalid("missing trailing ')'"));
        }

        let name = &signature[..open];
        if name.is_empty() {
            return Err(invalid("empty function name"));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
            return Err(invalid("function name has illegal characters"));
        }
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(invalid("function name starts with a digit"));
        }

        let inner = &signature[open + 1..signature.len() - 1];
        let params = split_top_level(inner).ok_or_else(|| invalid("unbalanced parentheses"))?;
        if params.iter().any(String::is_empty) {
            return Err(invalid("empty parameter type"));
        }

        Ok(Self {
            canonical: signature.to_string(),
            name: name.to_string(),
            params,
        })
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn is_nullary(&self) -> bool {
        self.params.is_empty()
    }

    pub fn selector(&self) -> Selector {
        selector(&self.canonical)
    }

    /// True if any parameter is variable-length or structured.
    pub fn has_dynamic_params(&self) -> bool {
        self.params
            .iter()
            .any(|p| ParamKind::of(p) == ParamKind::Dynamic)
    }

    /// Build probe calldata: the selector followed by one small integer word
    /// per parameter (`base`, `base + 1`, ...). Zero-argument functions get
    /// the bare selector.
    pub fn placeholder_calldata(&self, base: u64) -> Bytes {
        let mut data = Vec::with_capacity(4 + self.arity() * WORD);
        data.extend_from_slice(self.selector().as_slice());
        for i in 0..self.arity() {
            let value = U256::from(base.saturating_add(i as u64));
            data.extend_from_slice(&value.to_be_bytes::<WORD>());
        }
        Bytes::from(data)
    }
}

/// Split a parameter list on commas that are not nested inside a tuple.
fn split_top_level(inner: &str) -> Option<Vec<String>> {
    if inner.is_empty() {
        return Some(Vec::new());
    }
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in inner.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
                current.push(c);
            }
            ',' if depth == 0 => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if depth != 0 {
        return None;
    }
    parts.push(current);
    Some(parts)
}

// ============================================================================
// REVERT PAYLOADS
// ============================================================================

/// Encode the standard `Error(string)` revert payload.
pub fn encode_revert_reason(reason: &str) -> Bytes {
    Bytes::from(
        Revert {
            reason: reason.to_string(),
        }
        .abi_encode(),
    )
}

/// Decode an `Error(string)` revert payload, if that is what `data` holds.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    Revert::abi_decode(data, true).ok().map(|revert| revert.reason)
}

// ============================================================================
// WORD READER
// ============================================================================

/// Bounds-checked word reader for plausibility checks on return data whose
/// exact type is not known up front. Typed decoding goes through `bindings`.
#[derive(Debug, Clone, Copy)]
pub struct AbiReader<'a> {
    data: &'a [u8],
}

impl<'a> AbiReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of complete words in the payload.
    pub fn word_count(&self) -> usize {
        self.data.len() / WORD
    }

    /// True if the payload is a whole number of words.
    pub fn is_word_aligned(&self) -> bool {
        self.data.len() % WORD == 0
    }

    pub fn word(&self, index: usize) -> Result<B256, AbiError> {
        let start = index * WORD;
        let end = start + WORD;
        if end > self.data.len() {
            return Err(AbiError::ShortData {
                needed: end,
                got: self.data.len(),
            });
        }
        Ok(B256::from_slice(&self.data[start..end]))
    }

    pub fn u256(&self, index: usize) -> Result<U256, AbiError> {
        Ok(U256::from_be_bytes(self.word(index)?.0))
    }

    pub fn u64(&self, index: usize) -> Result<u64, AbiError> {
        u64::try_from(self.u256(index)?).map_err(|_| AbiError::InvalidWord {
            index,
            kind: "uint64",
        })
    }

    pub fn u8(&self, index: usize) -> Result<u8, AbiError> {
        u8::try_from(self.u256(index)?).map_err(|_| AbiError::InvalidWord {
            index,
            kind: "uint8",
        })
    }

    /// Read an address, rejecting dirty upper bytes.
    pub fn address(&self, index: usize) -> Result<Address, AbiError> {
        let word = self.word(index)?;
        if word[..12].iter().any(|b| *b != 0) {
            return Err(AbiError::InvalidWord {
                index,
                kind: "address",
            });
        }
        Ok(Address::from_word(word))
    }

    /// Read a bool, rejecting anything other than 0 or 1.
    pub fn bool(&self, index: usize) -> Result<bool, AbiError> {
        match self.u256(index)? {
            v if v == U256::ZERO => Ok(false),
            v if v == U256::from(1u8) => Ok(true),
            _ => Err(AbiError::InvalidWord {
                index,
                kind: "bool",
            }),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::INFA1;
    use alloy_sol_types::SolCall;

    fn word(value: u64) -> [u8; WORD] {
        U256::from(value).to_be_bytes::<WORD>()
    }

    #[test]
    fn test_well_known_selectors() {
        assert_eq!(selector("supportsInterface(bytes4)").0, [0x01, 0xff, 0xc9, 0xa7]);
        assert_eq!(selector("balanceOf(address)").0, [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(selector("transfer(address,uint256)").0, [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(selector("Error(string)").0, Revert::SELECTOR);
    }

    #[test]
    fn test_interface_id_of_single_function_is_its_selector() {
        assert_eq!(
            interface_id(["supportsInterface(bytes4)"]).0,
            [0x01, 0xff, 0xc9, 0xa7]
        );
    }

    #[test]
    fn test_parse_rejects_malformed_signatures() {
        assert!(FunctionSignature::parse("getState").is_err());
        assert!(FunctionSignature::parse("getState(uint256").is_err());
        assert!(FunctionSignature::parse("getState(uint256, address)").is_err());
        assert!(FunctionSignature::parse("(uint256)").is_err());
        assert!(FunctionSignature::parse("f(uint256,)").is_err());
        assert!(FunctionSignature::parse("f((uint256,bytes32)").is_err());
        assert!(FunctionSignature::parse("9lives()").is_err());
    }

    #[test]
    fn test_parse_tuple_parameters() {
        let sig = FunctionSignature::parse(
            "updateAgentMetadata(uint256,(string,string,string,string,string,bytes32))",
        )
        .unwrap();
        assert_eq!(sig.name(), "updateAgentMetadata");
        assert_eq!(sig.arity(), 2);
        assert!(sig.has_dynamic_params());
    }

    #[test]
    fn test_dynamic_detection() {
        let cases = [
            ("pause(uint256)", false),
            ("setLogicAddress(uint256,address)", false),
            ("updateLearning(uint256,bytes32,uint256)", false),
            ("executeAction(uint256,bytes)", true),
            ("setName(string)", true),
            ("batch(uint256[])", true),
            ("fixed(uint256[2])", true),
            ("isGloballyPaused()", false),
        ];
        for (sig, dynamic) in cases {
            let parsed = FunctionSignature::parse(sig).unwrap();
            assert_eq!(parsed.has_dynamic_params(), dynamic, "{}", sig);
        }
    }

    #[test]
    fn test_placeholder_calldata_layout() {
        let sig = FunctionSignature::parse("setLogicAddress(uint256,address)").unwrap();
        let data = sig.placeholder_calldata(1);
        assert_eq!(data.len(), 4 + 2 * WORD);
        assert_eq!(&data[..4], sig.selector().as_slice());
        let reader = AbiReader::new(&data[4..]);
        assert_eq!(reader.u64(0).unwrap(), 1);
        assert_eq!(reader.u64(1).unwrap(), 2);
    }

    #[test]
    fn test_placeholder_calldata_is_a_valid_encoding() {
        let sig = FunctionSignature::parse("updateLearning(uint256,bytes32,uint256)").unwrap();
        let call = INFA1::updateLearningCall::abi_decode(&sig.placeholder_calldata(7), true).unwrap();
        assert_eq!(call.tokenId, U256::from(7u64));
        assert_eq!(call.newRoot, B256::from(word(8)));
        assert_eq!(call.newVersion, U256::from(9u64));
    }

    #[test]
    fn test_zero_arg_calldata_is_bare_selector() {
        let sig = FunctionSignature::parse("isGloballyPaused()").unwrap();
        assert!(sig.is_nullary());
        assert_eq!(sig.placeholder_calldata(1).len(), 4);
    }

    #[test]
    fn test_revert_reason_round_trip() {
        let data = encode_revert_reason("NFA: not owner");
        assert_eq!(&data[..4], &Revert::SELECTOR);
        assert_eq!(decode_revert_reason(&data).as_deref(), Some("NFA: not owner"));
        assert_eq!(decode_revert_reason(&[0x12, 0x34]), None);
    }

    #[test]
    fn test_reader_rejects_dirty_words() {
        let mut dirty = Address::with_last_byte(9).into_word().0;
        dirty[0] = 1;
        let reader = AbiReader::new(&dirty);
        assert!(reader.address(0).is_err());

        let two = word(2);
        assert!(AbiReader::new(&two).bool(0).is_err());
    }

    #[test]
    fn test_reader_bounds() {
        let data = word(4096);
        let reader = AbiReader::new(&data);
        assert_eq!(reader.u64(0).unwrap(), 4096);
        assert!(matches!(reader.u8(0), Err(AbiError::InvalidWord { .. })));
        assert!(matches!(reader.word(1), Err(AbiError::ShortData { .. })));
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn signatures_and_permutation() -> impl Strategy<Value = (Vec<String>, Vec<String>)> {
        prop::collection::vec("[a-z][a-zA-Z0-9]{0,12}", 1..12)
            .prop_map(|names| {
                names
                    .into_iter()
                    .map(|n| format!("{}(uint256)", n))
                    .collect::<Vec<_>>()
            })
            .prop_flat_map(|sigs| (Just(sigs.clone()), Just(sigs).prop_shuffle()))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Interface identifiers do not depend on declaration order.
        #[test]
        fn prop_interface_id_order_independent((sigs, shuffled) in signatures_and_permutation()) {
            let forward = interface_id(sigs.iter().map(String::as_str));
            let reordered = interface_id(shuffled.iter().map(String::as_str));
            prop_assert_eq!(forward, reordered);
        }

        /// Word reads never panic on arbitrary payloads.
        #[test]
        fn prop_reader_total_on_garbage(data in prop::collection::vec(any::<u8>(), 0..200), index in 0usize..8) {
            let reader = AbiReader::new(&data);
            let _ = reader.word(index);
            let _ = reader.address(index);
            let _ = reader.bool(index);
            let _ = reader.u8(index);
        }
    }
}
