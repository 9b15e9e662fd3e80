use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const RAW_ADDRESS_LEN: usize = 39;
const PRETTY_GROUP_LEN: usize = 6;
const BASE32_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// 39 base32 chars carry 195 bits for 24 address bytes; the three padding
/// bits are zero, so only these chars can end a raw address.
const VALID_LAST_CHARS: &[char] = &['A', 'I', 'Q', 'Y'];

/// Network an address belongs to, taken from its leading character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkType {
    MainNet,
    TestNet,
    Private,
    PrivateTest,
}

impl NetworkType {
    fn from_prefix(c: char) -> Option<NetworkType> {
        match c {
            'N' => Some(Self::MainNet),
            'T' => Some(Self::TestNet),
            'P' => Some(Self::Private),
            'V' => Some(Self::PrivateTest),
            _ => None,
        }
    }

    /// Numeric network identifier used on the wire by the node.
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::MainNet => 104,
            Self::TestNet => 152,
            Self::Private => 120,
            Self::PrivateTest => 168,
        }
    }
}

/// A structured account address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    raw: String,
    network: NetworkType,
}

impl Address {
    /// Parses a raw (`TATNE7Q5...`) or pretty (`TATNE7-Q5BITM-...`) address.
    ///
    /// Input is trimmed, upper-cased and stripped of hyphens before validation.
    pub fn parse(input: &str) -> Result<Address> {
        let fail = |reason: &str| Error::AddressParse {
            address: input.to_string(),
            reason: reason.to_string(),
        };

        let raw: String = input
            .trim()
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if raw.len() != RAW_ADDRESS_LEN {
            return Err(fail(&format!(
                "expected {RAW_ADDRESS_LEN} characters, found {}",
                raw.len()
            )));
        }
        if !raw.chars().all(|c| BASE32_ALPHABET.contains(c)) {
            return Err(fail("contains characters outside the base32 alphabet"));
        }
        if !raw.ends_with(VALID_LAST_CHARS) {
            return Err(fail("last character is not a valid base32 tail"));
        }

        let network = raw
            .chars()
            .next()
            .and_then(NetworkType::from_prefix)
            .ok_or_else(|| fail("unknown network prefix"))?;

        Ok(Address { raw, network })
    }

    #[must_use]
    pub fn plain(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn network(&self) -> NetworkType {
        self.network
    }

    /// Returns the address in hyphen-separated groups of six characters.
    #[must_use]
    pub fn pretty(&self) -> String {
        self.raw
            .as_bytes()
            .chunks(PRETTY_GROUP_LEN)
            .map(|chunk| String::from_utf8_lossy(chunk))
            .collect::<Vec<_>>()
            .join("-")
    }

    /// Short display form: first four characters, an ellipsis, last three.
    #[must_use]
    pub fn shortened(&self) -> String {
        let head = &self.raw[..4];
        let tail = &self.raw[self.raw.len() - 3..];
        format!("{head}-...-{tail}")
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Address> for String {
    fn from(a: Address) -> Self {
        a.raw
    }
}
