//! Typed key/value model for TxInfo entries. Grounded on
//! original_source/src/txinfo.{h,cpp}'s `TxInfoKey`/`CTxInfo`; validity
//! rules and `ToString` renderings are preserved byte-for-byte (spec.md
//! §4.4, §6.4) since other parts of the system log these strings.

use std::fmt;

/// The four key types a TxInfo entry can be bound under. Numeric values
/// match the persisted `key_type` column (spec.md §6.3) exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum TxInfoType {
    Normal = 0,
    WriteOnce = 1,
    Unique = 2,
    Id = 3,
}

impl TxInfoType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(TxInfoType::Normal),
            1 => Some(TxInfoType::WriteOnce),
            2 => Some(TxInfoType::Unique),
            3 => Some(TxInfoType::Id),
            _ => None,
        }
    }

    pub fn is_write_once_ever(self) -> bool {
        matches!(self, TxInfoType::WriteOnce | TxInfoType::Unique | TxInfoType::Id)
    }

    pub fn is_globally_unique(self) -> bool {
        matches!(self, TxInfoType::Unique | TxInfoType::Id)
    }
}

fn is_valid_id_character(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'
}

/// `(type, keyString)` pair identifying a binding slot for an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInfoKey {
    pub key_type: TxInfoType,
    pub key_string: String,
}

impl TxInfoKey {
    pub fn new(key_type: TxInfoType, key_string: impl Into<String>) -> Self {
        TxInfoKey { key_type, key_string: key_string.into() }
    }

    pub fn is_valid(&self) -> bool {
        !self.key_string.is_empty() && self.key_string.chars().all(is_valid_id_character)
    }
}

impl fmt::Display for TxInfoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key_type == TxInfoType::Id && self.key_string == "n" {
            return write!(f, "Name");
        }

        let prefix = match self.key_type {
            TxInfoType::Normal => "n:",
            TxInfoType::WriteOnce => "w:",
            TxInfoType::Unique => "u:",
            TxInfoType::Id => "i:",
        };
        write!(f, "{prefix}{}", self.key_string)
    }
}

pub type TxInfoValue = String;

/// A key/value pair pending validation or storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CTxInfo {
    pub key: TxInfoKey,
    pub value: TxInfoValue,
}

impl CTxInfo {
    pub fn new(key: TxInfoKey, value: impl Into<TxInfoValue>) -> Self {
        CTxInfo { key, value: value.into() }
    }

    /// Validates the key and value shape only — not store-level constraints
    /// like uniqueness or write-once, which require a database lookup and
    /// live in `TxInfoStore::is_valid`.
    pub fn is_valid(&self, reason: &mut String) -> bool {
        if !self.key.is_valid() {
            reason.push_str("Invalid key");
            return false;
        }

        if self.value.is_empty() {
            reason.push_str("Invalid value");
            return false;
        }

        if self.key.key_type == TxInfoType::Id && !self.value.chars().all(is_valid_id_character) {
            reason.push_str("Invalid ID character in value");
            return false;
        }

        true
    }
}

impl fmt::Display for CTxInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_name_special_case_renders_as_name() {
        let key = TxInfoKey::new(TxInfoType::Id, "n");
        assert_eq!(key.to_string(), "Name");
    }

    #[test]
    fn unique_key_renders_with_u_prefix() {
        let key = TxInfoKey::new(TxInfoType::Unique, "handle");
        assert_eq!(key.to_string(), "u:handle");
    }

    #[test]
    fn all_type_prefixes() {
        assert_eq!(TxInfoKey::new(TxInfoType::Normal, "x").to_string(), "n:x");
        assert_eq!(TxInfoKey::new(TxInfoType::WriteOnce, "x").to_string(), "w:x");
        assert_eq!(TxInfoKey::new(TxInfoType::Id, "other").to_string(), "i:other");
    }

    #[test]
    fn key_rejects_uppercase_and_punctuation() {
        assert!(!TxInfoKey::new(TxInfoType::Normal, "Bio").is_valid());
        assert!(!TxInfoKey::new(TxInfoType::Normal, "bio!").is_valid());
        assert!(!TxInfoKey::new(TxInfoType::Normal, "").is_valid());
        assert!(TxInfoKey::new(TxInfoType::Normal, "bio-2").is_valid());
    }

    #[test]
    fn value_must_be_non_empty() {
        let info = CTxInfo::new(TxInfoKey::new(TxInfoType::Normal, "bio"), "");
        let mut reason = String::new();
        assert!(!info.is_valid(&mut reason));
        assert_eq!(reason, "Invalid value");
    }

    #[test]
    fn id_value_rejects_space() {
        let info = CTxInfo::new(TxInfoKey::new(TxInfoType::Id, "n"), "john doe");
        let mut reason = String::new();
        assert!(!info.is_valid(&mut reason));
        assert_eq!(reason, "Invalid ID character in value");
    }

    #[test]
    fn normal_value_allows_arbitrary_characters() {
        let info = CTxInfo::new(TxInfoKey::new(TxInfoType::Normal, "bio"), "Hello, world! 😀");
        let mut reason = String::new();
        assert!(info.is_valid(&mut reason));
    }
}
