use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::prefix::Prefix;

/// Route origin attribute; IGP is preferred over EGP, EGP over UNK
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Origin {
    Igp,
    Egp,
    Unk,
}

impl Origin {
    /// Rank for route selection (higher is preferred)
    pub fn preference(self) -> u8 {
        match self {
            Origin::Igp => 2,
            Origin::Egp => 1,
            Origin::Unk => 0,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Origin::Igp => "IGP",
            Origin::Egp => "EGP",
            Origin::Unk => "UNK",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Origin {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Origin {
    fn deserialize<D>(deserializer: D) -> Result<Origin, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "IGP" => Ok(Origin::Igp),
            "EGP" => Ok(Origin::Egp),
            "UNK" => Ok(Origin::Unk),
            _ => Err(serde::de::Error::custom(format!(
                "Unsupported origin: '{}'",
                s
            ))),
        }
    }
}

/// One announced route and its attributes, as carried in `update` messages
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RouteAdvert {
    pub network: Ipv4Addr,
    pub netmask: Ipv4Addr,
    #[serde(rename = "localpref")]
    pub local_pref: u32,
    #[serde(rename = "selfOrigin")]
    pub self_origin: bool,
    #[serde(rename = "ASPath")]
    pub as_path: Vec<u32>,
    pub origin: Origin,
}

impl RouteAdvert {
    pub fn prefix(&self) -> Prefix {
        Prefix::new(u32::from(self.network), u32::from(self.netmask))
    }
}

/// A (network, netmask) pair as carried in `withdraw` victim lists
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct PrefixSpec {
    pub network: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

impl From<&PrefixSpec> for Prefix {
    fn from(spec: &PrefixSpec) -> Prefix {
        Prefix::new(u32::from(spec.network), u32::from(spec.netmask))
    }
}

/// One row of a `table` reply: a forwarding entry tagged with the neighbor
/// it was learned from
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TableEntry {
    pub network: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub peer: Ipv4Addr,
    #[serde(rename = "localpref")]
    pub local_pref: u32,
    #[serde(rename = "selfOrigin")]
    pub self_origin: bool,
    #[serde(rename = "ASPath")]
    pub as_path: Vec<u32>,
    pub origin: Origin,
}

/// Messages with no payload carry an empty object on the wire
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Empty {}

/// Control message payload, dispatched by the wire `type` tag
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", content = "msg", rename_all = "lowercase")]
pub enum Payload {
    Handshake(Empty),
    Update(RouteAdvert),
    Withdraw(Vec<PrefixSpec>),
    Data(Value),
    #[serde(rename = "no route")]
    NoRoute(Empty),
    Dump(Empty),
    Table(Vec<TableEntry>),
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Handshake(_) => "handshake",
            Payload::Update(_) => "update",
            Payload::Withdraw(_) => "withdraw",
            Payload::Data(_) => "data",
            Payload::NoRoute(_) => "no route",
            Payload::Dump(_) => "dump",
            Payload::Table(_) => "table",
        }
    }
}

/// A control channel message: sender, recipient and typed payload
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Envelope {
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    #[serde(flatten)]
    pub payload: Payload,
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "<{} {} -> {}>",
            self.payload.kind(),
            self.src,
            self.dst
        )
    }
}

/// An outbound message bound for a specific neighbor's transport
#[derive(Clone, Debug, PartialEq)]
pub struct Outbound {
    pub to: Ipv4Addr,
    pub envelope: Envelope,
}
