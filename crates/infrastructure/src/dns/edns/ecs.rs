//! EDNS Client Subnet (RFC 7871).

use hickory_proto::op::Edns;
use hickory_proto::rr::rdata::opt::{ClientSubnet, EdnsCode, EdnsOption};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

const FAMILY_IPV4: u16 = 1;
const FAMILY_IPV6: u16 = 2;

/// Decoded client subnet option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subnet {
    pub addr: IpAddr,
    pub source_prefix: u8,
    pub scope_prefix: u8,
}

impl Subnet {
    /// Read the fields back from the option's wire form: FAMILY, SOURCE
    /// PREFIX-LENGTH, SCOPE PREFIX-LENGTH, then the truncated ADDRESS.
    pub fn from_option(subnet: &ClientSubnet) -> Option<Self> {
        let wire = Vec::<u8>::try_from(subnet).ok()?;
        if wire.len() < 4 {
            return None;
        }
        let family = u16::from_be_bytes([wire[0], wire[1]]);
        let address = &wire[4..];

        let addr = match family {
            FAMILY_IPV4 => {
                let mut octets = [0u8; 4];
                let n = address.len().min(octets.len());
                octets[..n].copy_from_slice(&address[..n]);
                IpAddr::V4(Ipv4Addr::from(octets))
            }
            FAMILY_IPV6 => {
                let mut octets = [0u8; 16];
                let n = address.len().min(octets.len());
                octets[..n].copy_from_slice(&address[..n]);
                IpAddr::V6(Ipv6Addr::from(octets))
            }
            _ => return None,
        };

        Some(Self {
            addr,
            source_prefix: wire[2],
            scope_prefix: wire[3],
        })
    }

    pub fn to_option(self) -> EdnsOption {
        EdnsOption::Subnet(ClientSubnet::new(
            self.addr,
            self.source_prefix,
            self.scope_prefix,
        ))
    }
}

/// Subnet announced by the client, if any.
pub fn client_subnet(edns: &Edns) -> Option<Subnet> {
    match edns.option(EdnsCode::Subnet) {
        Some(EdnsOption::Subnet(subnet)) => Subnet::from_option(subnet),
        _ => None,
    }
}

/// Address used for traffic steering.
pub fn steering_source(subnet: Option<&Subnet>, peer: IpAddr) -> IpAddr {
    subnet.map(|s| s.addr).unwrap_or(peer)
}

/// Echo of the request subnet; the scope equals the source prefix because
/// answers are computed for the announced subnet as a whole.
pub fn echo_subnet(subnet: &Subnet) -> EdnsOption {
    Subnet {
        scope_prefix: subnet.source_prefix,
        ..*subnet
    }
    .to_option()
}
