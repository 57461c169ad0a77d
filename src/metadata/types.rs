//! Metadata service payloads

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// IPv4 addresses assigned to the instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv4Data {
    /// Public addresses, in CIDR notation
    #[serde(default, deserialize_with = "null_as_empty")]
    pub public: Vec<String>,
    /// Private addresses, in CIDR notation
    #[serde(default, deserialize_with = "null_as_empty")]
    pub private: Vec<String>,
    /// Shared addresses, in CIDR notation
    #[serde(default, deserialize_with = "null_as_empty")]
    pub elastic: Vec<String>,
}

/// IPv6 addresses assigned to the instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Ipv6Data {
    /// Routed ranges
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ranges: Vec<String>,
    /// SLAAC link-local address
    #[serde(default)]
    pub link_local: String,
    /// Shared ranges
    #[serde(default, deserialize_with = "null_as_empty")]
    pub elastic_ranges: Vec<String>,
}

impl Ipv6Data {
    /// Parse the routed ranges
    pub fn parsed_ranges(&self) -> Result<Vec<IpNet>> {
        self.ranges.iter().map(|r| r.parse()).collect()
    }
}

/// Network configuration of the instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkData {
    /// VLAN the instance is attached to, 0 when none
    #[serde(default)]
    pub vlan_id: u32,
    /// IPv4 addresses
    #[serde(default)]
    pub ipv4: Ipv4Data,
    /// IPv6 addresses
    #[serde(default)]
    pub ipv6: Ipv6Data,
}

/// Authorized keys per user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshKeysUsers {
    /// Keys authorized for root
    #[serde(default, deserialize_with = "null_as_empty")]
    pub root: Vec<String>,
}

/// SSH keys configured for the instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshKeysData {
    /// Keys grouped by user
    #[serde(default)]
    pub users: SshKeysUsers,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// CIDR ranges
// ============================================================================

/// An IP network in CIDR notation.
///
/// Parsing masks off host bits, so `2600:3c03::1/64` becomes
/// `2600:3c03::/64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpNet {
    network: IpAddr,
    prefix_len: u8,
}

impl IpNet {
    /// Build a network from an address and prefix length
    pub fn new(addr: IpAddr, prefix_len: u8) -> Result<Self> {
        let max = match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if prefix_len > max {
            return Err(Error::decode(format!(
                "prefix length {prefix_len} is too long for {addr}"
            )));
        }

        let network = match addr {
            IpAddr::V4(v4) => {
                let mask = u32::MAX.checked_shl(32 - u32::from(prefix_len)).unwrap_or(0);
                IpAddr::V4(Ipv4Addr::from(u32::from(v4) & mask))
            }
            IpAddr::V6(v6) => {
                let mask = u128::MAX.checked_shl(128 - u32::from(prefix_len)).unwrap_or(0);
                IpAddr::V6(Ipv6Addr::from(u128::from(v6) & mask))
            }
        };

        Ok(Self {
            network,
            prefix_len,
        })
    }

    /// Network address
    pub fn network(&self) -> IpAddr {
        self.network
    }

    /// Prefix length in bits
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Whether `addr` falls inside this network
    pub fn contains(&self, addr: IpAddr) -> bool {
        match (addr.is_ipv4(), self.network.is_ipv4()) {
            (true, true) | (false, false) => {
                Self::new(addr, self.prefix_len).is_ok_and(|net| net.network == self.network)
            }
            _ => false,
        }
    }
}

impl FromStr for IpNet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::decode(format!("failed to parse cidr '{s}': {reason}"));

        let (addr, prefix) = s.split_once('/').ok_or_else(|| invalid("missing prefix"))?;
        let addr: IpAddr = addr.parse().map_err(|_| invalid("invalid address"))?;
        let prefix: u8 = prefix.parse().map_err(|_| invalid("invalid prefix length"))?;
        Self::new(addr, prefix)
    }
}

impl fmt::Display for IpNet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

impl Serialize for IpNet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IpNet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
