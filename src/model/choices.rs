use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// AFI/SAFI combinations an address family can be configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AfiSafi {
    Ipv4Unicast,
    Ipv4LabeledUnicast,
    Ipv4Multicast,
    Ipv4Flowspec,
    Ipv6Unicast,
    Ipv6LabeledUnicast,
    Ipv6Multicast,
    Ipv6Flowspec,
    Vpnv4Unicast,
    Vpnv4Multicast,
    Vpnv4Flowspec,
    Vpnv6Unicast,
    Vpnv6Multicast,
    Vpnv6Flowspec,
    L2vpnVpls,
    L2vpnEvpn,
}

impl AfiSafi {
    pub const ALL: [AfiSafi; 16] = [
        AfiSafi::Ipv4Unicast,
        AfiSafi::Ipv4LabeledUnicast,
        AfiSafi::Ipv4Multicast,
        AfiSafi::Ipv4Flowspec,
        AfiSafi::Ipv6Unicast,
        AfiSafi::Ipv6LabeledUnicast,
        AfiSafi::Ipv6Multicast,
        AfiSafi::Ipv6Flowspec,
        AfiSafi::Vpnv4Unicast,
        AfiSafi::Vpnv4Multicast,
        AfiSafi::Vpnv4Flowspec,
        AfiSafi::Vpnv6Unicast,
        AfiSafi::Vpnv6Multicast,
        AfiSafi::Vpnv6Flowspec,
        AfiSafi::L2vpnVpls,
        AfiSafi::L2vpnEvpn,
    ];

    pub fn value(&self) -> &'static str {
        match self {
            AfiSafi::Ipv4Unicast => "ipv4_unicast",
            AfiSafi::Ipv4LabeledUnicast => "ipv4_labeled_unicast",
            AfiSafi::Ipv4Multicast => "ipv4_multicast",
            AfiSafi::Ipv4Flowspec => "ipv4_flowspec",
            AfiSafi::Ipv6Unicast => "ipv6_unicast",
            AfiSafi::Ipv6LabeledUnicast => "ipv6_labeled_unicast",
            AfiSafi::Ipv6Multicast => "ipv6_multicast",
            AfiSafi::Ipv6Flowspec => "ipv6_flowspec",
            AfiSafi::Vpnv4Unicast => "vpnv4_unicast",
            AfiSafi::Vpnv4Multicast => "vpnv4_multicast",
            AfiSafi::Vpnv4Flowspec => "vpnv4_flowspec",
            AfiSafi::Vpnv6Unicast => "vpnv6_unicast",
            AfiSafi::Vpnv6Multicast => "vpnv6_multicast",
            AfiSafi::Vpnv6Flowspec => "vpnv6_flowspec",
            AfiSafi::L2vpnVpls => "l2vpn_vpls",
            AfiSafi::L2vpnEvpn => "l2vpn_evpn",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AfiSafi::Ipv4Unicast => "IPv4 Unicast",
            AfiSafi::Ipv4LabeledUnicast => "IPv4 Labeled Unicast",
            AfiSafi::Ipv4Multicast => "IPv4 Multicast",
            AfiSafi::Ipv4Flowspec => "IPv4 Flowspec",
            AfiSafi::Ipv6Unicast => "IPv6 Unicast",
            AfiSafi::Ipv6LabeledUnicast => "IPv6 Labeled Unicast",
            AfiSafi::Ipv6Multicast => "IPv6 Multicast",
            AfiSafi::Ipv6Flowspec => "IPv6 Flowspec",
            AfiSafi::Vpnv4Unicast => "VPNv4 Unicast",
            AfiSafi::Vpnv4Multicast => "VPNv4 Multicast",
            AfiSafi::Vpnv4Flowspec => "VPNv4 Flowspec",
            AfiSafi::Vpnv6Unicast => "VPNv6 Unicast",
            AfiSafi::Vpnv6Multicast => "VPNv6 Multicast",
            AfiSafi::Vpnv6Flowspec => "VPNv6 Flowspec",
            AfiSafi::L2vpnVpls => "L2VPN VPLS",
            AfiSafi::L2vpnEvpn => "L2VPN EVPN",
        }
    }
}

impl fmt::Display for AfiSafi {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AfiSafi {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AfiSafi::ALL
            .iter()
            .copied()
            .find(|choice| choice.value() == s)
            .ok_or_else(|| format!("\"{}\" is not a valid choice.", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_afi_safi_value_matches_serde_name() {
        for choice in AfiSafi::ALL {
            let json = serde_json::to_value(choice).unwrap();
            assert_eq!(json, serde_json::json!(choice.value()));
            assert_eq!(choice.value().parse::<AfiSafi>().unwrap(), choice);
        }
    }

    #[test]
    fn test_unknown_afi_safi_rejected() {
        let err = "ipv5_unicast".parse::<AfiSafi>().unwrap_err();
        assert!(err.contains("not a valid choice"));
    }
}
