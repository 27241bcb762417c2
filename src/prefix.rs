use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::utils::ParseError;

/// Parse a dotted-quad address (E.g. "192.168.0.1") into its packed u32 form
pub fn pack(dotted: &str) -> Result<u32, ParseError> {
    let addr: Ipv4Addr = dotted
        .parse()
        .map_err(|err| ParseError::new(format!("{} '{}'", err, dotted)))?;
    Ok(u32::from(addr))
}

/// Format a packed u32 address as a dotted quad
pub fn unpack(addr: u32) -> String {
    Ipv4Addr::from(addr).to_string()
}

/// Number of set bits in a netmask (the prefix length for CIDR-legal masks)
pub fn prefix_len(mask: u32) -> u8 {
    mask.count_ones() as u8
}

/// Build a netmask from a prefix length (0..=32)
pub fn mask_from_len(len: u8) -> u32 {
    match len {
        0 => 0,
        len => u32::max_value() << (32 - u32::from(len.min(32))),
    }
}

/// Do two addresses fall in the same network under the given mask?
pub fn same_network(a: u32, b: u32, mask: u32) -> bool {
    (a & mask) == (b & mask)
}

/// Drop the lowest set bit of a netmask, yielding the mask one bit shorter
/// E.g. 255.255.255.0 (/24) -> 255.255.254.0 (/23)
pub fn shorten(mask: u32) -> u32 {
    match prefix_len(mask) {
        0 => 0,
        len => mask & !(1 << (32 - u32::from(len))),
    }
}

/// A CIDR-legal mask is a contiguous left-aligned run of 1-bits
pub fn is_contiguous(mask: u32) -> bool {
    mask.count_ones() == mask.leading_ones()
}

/// An IPv4 network: address bits plus the netmask that scopes them
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Prefix {
    pub network: u32,
    pub netmask: u32,
}

impl Prefix {
    pub fn new(network: u32, netmask: u32) -> Self {
        Self { network, netmask }
    }

    pub fn len(&self) -> u8 {
        prefix_len(self.netmask)
    }

    pub fn contains(&self, addr: u32) -> bool {
        same_network(addr, self.network, self.netmask)
    }

    /// CIDR-legal mask with no host bits set below the mask boundary
    pub fn is_valid(&self) -> bool {
        is_contiguous(self.netmask) && self.network & !self.netmask == 0
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", unpack(self.network), self.len())
    }
}

impl FromStr for Prefix {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if let Some(i) = value.find('/') {
            let (addr, len) = value.split_at(i);
            let len: u8 = len[1..]
                .parse()
                .map_err(|err| ParseError::new(format!("{} '{}'", err, value)))?;
            if len > 32 {
                return Err(ParseError::new(format!("Prefix too long: '{}'", value)));
            }
            Ok(Prefix::new(pack(addr)?, mask_from_len(len)))
        } else {
            Err(ParseError::new(format!("Not a valid prefix: '{}'", value)))
        }
    }
}
