//! Remote view addresses
//!
//! Canonical form:
//! `<relayEndpoint>/<network>/<channel>:<contract>:<function>:<arg1>:...:<argN>`
//!
//! The scheme has no escaping, so fields containing their delimiter are
//! rejected at construction instead of producing an ambiguous address.

use std::fmt;
use std::str::FromStr;

use crate::configure::{NetworkDirectory, NetworkProfile};
use crate::interop::errors::InteropError;
use crate::interop::types::{AssetCategory, AssetRef};

pub const SEGMENT_DELIMITER: char = '/';
pub const FIELD_DELIMITER: char = ':';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteViewAddress {
    pub relay_endpoint: String,
    pub network: String,
    pub channel: String,
    pub contract: String,
    pub function: String,
    pub args: Vec<String>,
}

impl RemoteViewAddress {
    pub fn new(
        relay_endpoint: &str,
        network: &str,
        channel: &str,
        contract: &str,
        function: &str,
        args: Vec<String>,
    ) -> Result<Self, InteropError> {
        let address = Self {
            relay_endpoint: relay_endpoint.to_string(),
            network: network.to_string(),
            channel: channel.to_string(),
            contract: contract.to_string(),
            function: function.to_string(),
            args,
        };
        address.validate()?;
        Ok(address)
    }

    /// Address of `function(args)` on the network described by `profile`
    pub fn for_profile(
        profile: &NetworkProfile,
        network: &str,
        function: &str,
        args: Vec<String>,
    ) -> Result<Self, InteropError> {
        Self::new(
            &profile.relay_endpoint,
            network,
            &profile.channel,
            &profile.contract,
            function,
            args,
        )
    }

    fn validate(&self) -> Result<(), InteropError> {
        let required = [
            ("relay endpoint", &self.relay_endpoint),
            ("network", &self.network),
            ("channel", &self.channel),
            ("contract", &self.contract),
            ("function", &self.function),
        ];
        for (name, value) in required {
            if value.is_empty() {
                return Err(InteropError::InvalidInput(format!("address {} is empty", name)));
            }
        }

        // The relay endpoint is a host:port, so only '/' is reserved there
        if self.relay_endpoint.contains(SEGMENT_DELIMITER) {
            return Err(delimiter_error("relay endpoint", &self.relay_endpoint));
        }
        if self.network.contains(SEGMENT_DELIMITER) || self.network.contains(FIELD_DELIMITER) {
            return Err(delimiter_error("network", &self.network));
        }
        for (name, value) in [
            ("channel", &self.channel),
            ("contract", &self.contract),
            ("function", &self.function),
        ] {
            if value.contains(FIELD_DELIMITER) {
                return Err(delimiter_error(name, value));
            }
        }
        for (i, arg) in self.args.iter().enumerate() {
            if arg.contains(FIELD_DELIMITER) {
                return Err(delimiter_error(&format!("argument {}", i), arg));
            }
        }
        Ok(())
    }
}

fn delimiter_error(field: &str, value: &str) -> InteropError {
    InteropError::InvalidInput(format!(
        "address {} '{}' contains a reserved delimiter",
        field, value
    ))
}

impl fmt::Display for RemoteViewAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}:{}:{}",
            self.relay_endpoint, self.network, self.channel, self.contract, self.function
        )?;
        for arg in &self.args {
            write!(f, ":{}", arg)?;
        }
        Ok(())
    }
}

impl FromStr for RemoteViewAddress {
    type Err = InteropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || InteropError::InvalidInput(format!("malformed view address '{}'", s));

        let mut segments = s.splitn(3, SEGMENT_DELIMITER);
        let relay_endpoint = segments.next().ok_or_else(malformed)?;
        let network = segments.next().ok_or_else(malformed)?;
        let query = segments.next().ok_or_else(malformed)?;

        let mut fields = query.split(FIELD_DELIMITER);
        let channel = fields.next().ok_or_else(malformed)?;
        let contract = fields.next().ok_or_else(malformed)?;
        let function = fields.next().ok_or_else(malformed)?;
        let args = fields.map(str::to_string).collect();

        Self::new(relay_endpoint, network, channel, contract, function, args)
    }
}

/// Inputs of a claim-status query against the destination network
#[derive(Debug, Clone)]
pub struct ClaimStatusQuery<'a> {
    pub category: &'a str,
    pub asset_type: &'a str,
    pub asset_id_or_qty: &'a str,
    pub pledge_id: &'a str,
    pub pledger_cert: &'a str,
    pub source_network: &'a str,
    pub recipient_cert: &'a str,
    pub dest_network: &'a str,
    pub expiry_secs: u64,
}

/// Build the address of the claim-status view on the destination network
///
/// Fails before any I/O on an unrecognized category, a bad token quantity or
/// an unresolvable destination network.
pub fn build_claim_status_address(
    networks: &NetworkDirectory,
    query: &ClaimStatusQuery<'_>,
) -> Result<RemoteViewAddress, InteropError> {
    let category = AssetCategory::parse(query.category)?;
    let asset = AssetRef::parse(category, query.asset_id_or_qty)?;
    let profile = networks.remote(query.dest_network)?;

    let args = vec![
        query.asset_type.to_string(),
        asset.to_string(),
        query.pledge_id.to_string(),
        query.pledger_cert.to_string(),
        query.source_network.to_string(),
        query.recipient_cert.to_string(),
        query.dest_network.to_string(),
        query.expiry_secs.to_string(),
    ];

    RemoteViewAddress::for_profile(
        profile,
        query.dest_network,
        category.claim_status_function(),
        args,
    )
}

/// Inputs of a pledge-status query against the source network
#[derive(Debug, Clone)]
pub struct PledgeStatusQuery<'a> {
    pub category: &'a str,
    pub pledge_id: &'a str,
    pub source_network: &'a str,
    pub recipient_network: &'a str,
    pub recipient_cert: &'a str,
}

/// Build the address of the pledge-status view on the source network
pub fn build_pledge_status_address(
    networks: &NetworkDirectory,
    query: &PledgeStatusQuery<'_>,
) -> Result<RemoteViewAddress, InteropError> {
    let category = AssetCategory::parse(query.category)?;
    let profile = networks.remote(query.source_network)?;

    let args = vec![
        query.pledge_id.to_string(),
        query.source_network.to_string(),
        query.recipient_network.to_string(),
        query.recipient_cert.to_string(),
    ];

    RemoteViewAddress::for_profile(
        profile,
        query.source_network,
        category.pledge_status_function(),
        args,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> NetworkDirectory {
        let mut dir = NetworkDirectory::default();
        dir.insert(
            "network2",
            NetworkProfile {
                relay_endpoint: "localhost:9083".to_string(),
                channel: "mychannel".to_string(),
                contract: "simpleasset".to_string(),
                gateway_url: String::new(),
            },
        );
        dir
    }

    fn query<'a>(category: &'a str, qty: &'a str, dest: &'a str) -> ClaimStatusQuery<'a> {
        ClaimStatusQuery {
            category,
            asset_type: "token1",
            asset_id_or_qty: qty,
            pledge_id: "p1",
            pledger_cert: "YWxpY2U=",
            source_network: "network1",
            recipient_cert: "Ym9i",
            dest_network: dest,
            expiry_secs: 1_700_000_000,
        }
    }

    #[test]
    fn test_claim_status_address_format() {
        let address = build_claim_status_address(&directory(), &query("token", "50", "network2")).unwrap();
        assert_eq!(
            address.to_string(),
            "localhost:9083/network2/mychannel:simpleasset:GetTokenAssetClaimStatus:\
             token1:50:p1:YWxpY2U=:network1:Ym9i:network2:1700000000"
        );

        let address = build_claim_status_address(&directory(), &query("bond", "a01", "network2")).unwrap();
        assert_eq!(address.function, "GetAssetClaimStatus");
    }

    #[test]
    fn test_claim_status_address_errors() {
        assert!(matches!(
            build_claim_status_address(&directory(), &query("nft", "50", "network2")),
            Err(InteropError::UnrecognizedCategory(_))
        ));
        assert!(matches!(
            build_claim_status_address(&directory(), &query("token", "abc", "network2")),
            Err(InteropError::InvalidQuantity(_))
        ));
        assert!(matches!(
            build_claim_status_address(&directory(), &query("token", "50", "network7")),
            Err(InteropError::InvalidDestinationNetwork(_))
        ));
    }

    #[test]
    fn test_pledge_status_address() {
        let q = PledgeStatusQuery {
            category: "bond",
            pledge_id: "p1",
            source_network: "network2",
            recipient_network: "network1",
            recipient_cert: "Ym9i",
        };
        let address = build_pledge_status_address(&directory(), &q).unwrap();
        assert_eq!(
            address.to_string(),
            "localhost:9083/network2/mychannel:simpleasset:GetAssetPledgeStatus:p1:network2:network1:Ym9i"
        );
    }

    #[test]
    fn test_parse_build_roundtrip() {
        let cases = vec![
            RemoteViewAddress::new("localhost:9080", "network1", "mychannel", "simpleasset", "GetAssetPledgeStatus", vec!["p1".to_string()]).unwrap(),
            RemoteViewAddress::new("relay.example.org:443", "net-a", "ch", "cc", "Read", vec![]).unwrap(),
            RemoteViewAddress::new("r", "n", "c", "k", "f", vec![String::new(), "x=".to_string()]).unwrap(),
        ];
        for address in cases {
            let parsed: RemoteViewAddress = address.to_string().parse().unwrap();
            assert_eq!(parsed, address);
        }
    }

    #[test]
    fn test_parse_malformed() {
        assert!("localhost:9080".parse::<RemoteViewAddress>().is_err());
        assert!("localhost:9080/network1".parse::<RemoteViewAddress>().is_err());
        assert!("localhost:9080/network1/mychannel:simpleasset".parse::<RemoteViewAddress>().is_err());
        assert!("localhost:9080/network1/mychannel::Read".parse::<RemoteViewAddress>().is_err());
    }

    #[test]
    fn test_delimiter_in_argument_is_rejected() {
        let result = RemoteViewAddress::new("r", "n", "c", "k", "f", vec!["a:b".to_string()]);
        assert!(matches!(result, Err(InteropError::InvalidInput(_))));
    }
}
