use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{self, Deserialize, Deserializer, Serialize, Serializer};

use crate::utils::ParseError;

/// Commercial relationship with a neighbor, governing which routes
/// and which traffic may transit
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Relation {
    Customer,
    Peer,
    Provider,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Relation::*;
        let display = match self {
            Customer => "cust",
            Peer => "peer",
            Provider => "prov",
        };
        write!(f, "{}", display)
    }
}

impl FromStr for Relation {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "cust" => Ok(Relation::Customer),
            "peer" => Ok(Relation::Peer),
            "prov" => Ok(Relation::Provider),
            _ => Err(ParseError::new(format!(
                "Unsupported relation: '{}'",
                value
            ))),
        }
    }
}

impl Serialize for Relation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Relation {
    fn deserialize<D>(deserializer: D) -> Result<Relation, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One neighbor descriptor of the form "port-address-relation"
/// E.g. "7777-192.168.0.2-cust"
#[derive(Clone, Debug)]
pub struct NeighborConfig {
    pub port: u16,
    pub addr: Ipv4Addr,
    pub relation: Relation,
}

impl NeighborConfig {
    /// The router's own address on this neighbor's subnet: the links are
    /// point-to-point and the router is always host .1
    pub fn local_addr(&self) -> Ipv4Addr {
        local_addr(self.addr)
    }
}

impl fmt::Display for NeighborConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<Neighbor {} [{}]>", self.addr, self.relation)
    }
}

impl FromStr for NeighborConfig {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = value.splitn(3, '-').collect();
        if parts.len() != 3 {
            return Err(ParseError::new(format!(
                "Not a valid neighbor descriptor: '{}'",
                value
            )));
        }
        let port: u16 = parts[0]
            .parse()
            .map_err(|err| ParseError::new(format!("{} '{}'", err, value)))?;
        let addr: Ipv4Addr = parts[1]
            .parse()
            .map_err(|err| ParseError::new(format!("{} '{}'", err, value)))?;
        let relation: Relation = parts[2].parse()?;
        Ok(NeighborConfig {
            port,
            addr,
            relation,
        })
    }
}

/// The router's address on a neighbor's subnet (last octet replaced by 1)
pub fn local_addr(neighbor: Ipv4Addr) -> Ipv4Addr {
    let octets = neighbor.octets();
    Ipv4Addr::new(octets[0], octets[1], octets[2], 1)
}

#[derive(Clone, Debug)]
pub struct RouterConfig {
    pub asn: u32,
    pub neighbors: Vec<NeighborConfig>,
}

impl RouterConfig {
    pub fn new(asn: u32, neighbors: Vec<NeighborConfig>) -> Self {
        Self { asn, neighbors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_neighbor() {
        let neighbor: NeighborConfig = "7777-192.168.0.2-cust".parse().unwrap();
        assert_eq!(neighbor.port, 7777);
        assert_eq!(neighbor.addr, Ipv4Addr::new(192, 168, 0, 2));
        assert_eq!(neighbor.relation, Relation::Customer);

        let neighbor: NeighborConfig = "1024-10.0.5.2-prov".parse().unwrap();
        assert_eq!(neighbor.relation, Relation::Provider);
    }

    #[test]
    fn test_parse_neighbor_err() {
        assert!("7777-192.168.0.2".parse::<NeighborConfig>().is_err());
        assert!("port-192.168.0.2-cust".parse::<NeighborConfig>().is_err());
        assert!("7777-192.168.0-cust".parse::<NeighborConfig>().is_err());
        assert!("7777-192.168.0.2-customer"
            .parse::<NeighborConfig>()
            .is_err());
    }

    #[test]
    fn test_relation_serde() {
        let relation: Relation = serde_json::from_str("\"peer\"").unwrap();
        assert_eq!(relation, Relation::Peer);
        assert_eq!(
            serde_json::to_string(&Relation::Customer).unwrap(),
            "\"cust\""
        );
        assert!(serde_json::from_str::<Relation>("\"upstream\"").is_err());
    }

    #[test]
    fn test_local_addr() {
        let neighbor: NeighborConfig = "7777-192.168.0.2-cust".parse().unwrap();
        assert_eq!(neighbor.local_addr(), Ipv4Addr::new(192, 168, 0, 1));
        assert_eq!(
            local_addr(Ipv4Addr::new(172, 16, 5, 254)),
            Ipv4Addr::new(172, 16, 5, 1)
        );
    }
}
