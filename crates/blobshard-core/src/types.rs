use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BlobShardError;

/// Metadata returned by prefix listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMetadata {
    /// Blob name relative to the key path of the listing.
    pub name: String,
    pub length: u64,
}

impl BlobMetadata {
    pub fn new(name: impl Into<String>, length: u64) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }
}

/// A physical replica of a storage account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Primary,
    Secondary,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Primary => write!(f, "primary"),
            Location::Secondary => write!(f, "secondary"),
        }
    }
}

/// Read-routing preference applied to every operation of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationMode {
    #[default]
    PrimaryOnly,
    PrimaryThenSecondary,
    SecondaryOnly,
    SecondaryThenPrimary,
}

impl LocationMode {
    /// Locations tried by read operations, in order.
    pub fn read_targets(self) -> &'static [Location] {
        match self {
            LocationMode::PrimaryOnly => &[Location::Primary],
            LocationMode::PrimaryThenSecondary => &[Location::Primary, Location::Secondary],
            LocationMode::SecondaryOnly => &[Location::Secondary],
            LocationMode::SecondaryThenPrimary => &[Location::Secondary, Location::Primary],
        }
    }

    /// Location used by write operations. Secondaries are read-only, so
    /// `SecondaryOnly` has none.
    pub fn write_target(self) -> Option<Location> {
        match self {
            LocationMode::SecondaryOnly => None,
            _ => Some(Location::Primary),
        }
    }
}

impl fmt::Display for LocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationMode::PrimaryOnly => write!(f, "primary_only"),
            LocationMode::PrimaryThenSecondary => write!(f, "primary_then_secondary"),
            LocationMode::SecondaryOnly => write!(f, "secondary_only"),
            LocationMode::SecondaryThenPrimary => write!(f, "secondary_then_primary"),
        }
    }
}

impl std::str::FromStr for LocationMode {
    type Err = BlobShardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "primary_only" => Ok(LocationMode::PrimaryOnly),
            "primary_then_secondary" => Ok(LocationMode::PrimaryThenSecondary),
            "secondary_only" => Ok(LocationMode::SecondaryOnly),
            "secondary_then_primary" => Ok(LocationMode::SecondaryThenPrimary),
            _ => Err(BlobShardError::InvalidLocationMode(s.to_string())),
        }
    }
}

/// Hash used to map blob keys onto the account pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingHash {
    /// Wrapping 32-bit sum of the key's code points. Keeps placement
    /// compatible with repositories written by earlier releases.
    #[default]
    CharSum,
    /// 64-bit FNV-1a over the key's UTF-8 bytes.
    Fnv1a,
}

impl fmt::Display for RoutingHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingHash::CharSum => write!(f, "char_sum"),
            RoutingHash::Fnv1a => write!(f, "fnv1a"),
        }
    }
}

impl std::str::FromStr for RoutingHash {
    type Err = BlobShardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "char_sum" | "charsum" => Ok(RoutingHash::CharSum),
            "fnv1a" | "fnv_1a" => Ok(RoutingHash::Fnv1a),
            _ => Err(BlobShardError::InvalidRoutingHash(s.to_string())),
        }
    }
}

/// Backend behind a configured storage account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    Local,
    Azure,
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageType::Local => write!(f, "local"),
            StorageType::Azure => write!(f, "azure"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_mode_parse() {
        assert_eq!(
            "primary_only".parse::<LocationMode>().unwrap(),
            LocationMode::PrimaryOnly
        );
        assert_eq!(
            "PRIMARY_THEN_SECONDARY".parse::<LocationMode>().unwrap(),
            LocationMode::PrimaryThenSecondary
        );
        assert_eq!(
            "secondary-only".parse::<LocationMode>().unwrap(),
            LocationMode::SecondaryOnly
        );
        assert_eq!(
            "Secondary_Then_Primary".parse::<LocationMode>().unwrap(),
            LocationMode::SecondaryThenPrimary
        );
        assert!(matches!(
            "nearest".parse::<LocationMode>(),
            Err(BlobShardError::InvalidLocationMode(s)) if s == "nearest"
        ));
    }

    #[test]
    fn location_mode_display_parses_back() {
        for mode in [
            LocationMode::PrimaryOnly,
            LocationMode::PrimaryThenSecondary,
            LocationMode::SecondaryOnly,
            LocationMode::SecondaryThenPrimary,
        ] {
            assert_eq!(mode.to_string().parse::<LocationMode>().unwrap(), mode);
        }
    }

    #[test]
    fn read_targets_follow_mode_order() {
        assert_eq!(LocationMode::PrimaryOnly.read_targets(), &[Location::Primary]);
        assert_eq!(
            LocationMode::SecondaryThenPrimary.read_targets(),
            &[Location::Secondary, Location::Primary]
        );
    }

    #[test]
    fn secondary_only_has_no_write_target() {
        assert_eq!(LocationMode::SecondaryOnly.write_target(), None);
        assert_eq!(
            LocationMode::SecondaryThenPrimary.write_target(),
            Some(Location::Primary)
        );
    }

    #[test]
    fn routing_hash_parse() {
        assert_eq!("char_sum".parse::<RoutingHash>().unwrap(), RoutingHash::CharSum);
        assert_eq!("FNV1A".parse::<RoutingHash>().unwrap(), RoutingHash::Fnv1a);
        assert!("murmur".parse::<RoutingHash>().is_err());
    }
}
