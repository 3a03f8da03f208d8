use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;

use crate::error::{BridgeError, Result};

/// Validated UDP destination. Only constructed through [`validate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: [u8; 4],
    port: u16,
}

impl Endpoint {
    pub fn host(&self) -> [u8; 4] {
        self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::from(*self))
    }
}

impl From<Endpoint> for SocketAddrV4 {
    fn from(ep: Endpoint) -> Self {
        SocketAddrV4::new(Ipv4Addr::from(ep.host), ep.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.host;
        write!(f, "{}.{}.{}.{}:{}", a, b, c, d, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        validate(s)
    }
}

/// Parse "a.b.c.d:port". Every octet must be a canonical integer in 0..=255 and
/// the port a canonical integer in 1..=65535; anything else is rejected whole.
pub fn validate(input: &str) -> Result<Endpoint> {
    let invalid = || BridgeError::InvalidEndpoint(input.to_string());

    let (host_part, port_part) = input.rsplit_once(':').ok_or_else(invalid)?;

    let parts: Vec<&str> = host_part.split('.').collect();
    if parts.len() != 4 {
        return Err(invalid());
    }

    let mut host = [0u8; 4];
    for (slot, part) in host.iter_mut().zip(parts) {
        let octet = canonical_in_range(part, 0, 255).ok_or_else(invalid)?;
        *slot = octet as u8;
    }

    let port = canonical_in_range(port_part, 1, 65535).ok_or_else(invalid)? as u16;

    Ok(Endpoint { host, port })
}

/// Validate a bare listening port with the same canonical-integer rule.
pub fn validate_port(input: &str) -> Result<u16> {
    let trimmed = input.trim();
    if !is_canonical(trimmed) {
        return Err(BridgeError::Config(format!("'{}' is not a port number", input)));
    }
    match trimmed.parse::<i64>() {
        Ok(v) if (1..=65535).contains(&v) => Ok(v as u16),
        Ok(v) => Err(BridgeError::PortOutOfRange(v)),
        // Too many digits for i64: certainly out of range.
        Err(_) => Err(BridgeError::PortOutOfRange(i64::MAX)),
    }
}

/// Digits only, no sign, and no leading zero unless the whole string is "0".
/// Equivalent to the value formatting back to the same string.
fn is_canonical(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| b.is_ascii_digit())
        && (s == "0" || !s.starts_with('0'))
}

fn canonical_in_range(s: &str, min: u32, max: u32) -> Option<u32> {
    if !is_canonical(s) || s.len() > 5 {
        return None;
    }
    let v: u32 = s.parse().ok()?;
    (min..=max).contains(&v).then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_validate_local_audio_engine() {
        let ep = validate("127.0.0.1:57120").unwrap();
        assert_eq!(ep.host(), [127, 0, 0, 1]);
        assert_eq!(ep.port(), 57120);
        assert_eq!(ep.to_string(), "127.0.0.1:57120");
    }

    #[test]
    fn test_port_boundaries() {
        assert_eq!(validate("10.0.0.1:1").unwrap().port(), 1);
        assert_eq!(validate("10.0.0.1:65535").unwrap().port(), 65535);
        assert!(validate("10.0.0.1:0").is_err());
        assert!(validate("10.0.0.1:65536").is_err());
    }

    #[test]
    fn test_rejects_malformed_shapes() {
        for bad in [
            "",
            "127.0.0.1",
            "127.0.0.1:",
            ":9000",
            "127.0.0:9000",
            "127.0.0.1.5:9000",
            "127.0.0.01:9000",
            "127.0.0.-1:9000",
            "127.0.0.+1:9000",
            " 127.0.0.1:9000",
            "127.0.0.1:09000",
            "127.0.0.1:9000 ",
            "a.b.c.d:9000",
            "256.0.0.1:9000",
            "127.0.0.1:80:80",
        ] {
            assert!(validate(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_zero_octets_are_canonical() {
        assert_eq!(validate("0.0.0.0:9000").unwrap().host(), [0, 0, 0, 0]);
    }

    #[test]
    fn test_from_str_and_socket_addr() {
        let ep: Endpoint = "192.168.1.20:9000".parse().unwrap();
        assert_eq!(ep.socket_addr().to_string(), "192.168.1.20:9000");
    }

    #[test]
    fn test_validate_port() {
        assert_eq!(validate_port("9000").unwrap(), 9000);
        assert_eq!(validate_port(" 1 ").unwrap(), 1);
        assert!(matches!(validate_port("0"), Err(BridgeError::PortOutOfRange(0))));
        assert!(matches!(
            validate_port("70000"),
            Err(BridgeError::PortOutOfRange(70000))
        ));
        assert!(matches!(validate_port("abc"), Err(BridgeError::Config(_))));
        assert!(matches!(validate_port("0900"), Err(BridgeError::Config(_))));
    }

    proptest! {
        #[test]
        fn prop_valid_quads_roundtrip(a: u8, b: u8, c: u8, d: u8, port in 1u16..=65535) {
            let text = format!("{}.{}.{}.{}:{}", a, b, c, d, port);
            let ep = validate(&text).unwrap();
            prop_assert_eq!(ep.host(), [a, b, c, d]);
            prop_assert_eq!(ep.port(), port);
            prop_assert_eq!(ep.to_string(), text);
        }

        #[test]
        fn prop_octet_out_of_range_rejected(octet in 256u32..100_000, pos in 0usize..4) {
            let mut parts = vec!["1".to_string(); 4];
            parts[pos] = octet.to_string();
            let text = format!("{}:9000", parts.join("."));
            prop_assert!(validate(&text).is_err());
        }

        #[test]
        fn prop_leading_zero_rejected(octet in 0u8..=255, pos in 0usize..4) {
            let mut parts = vec!["1".to_string(); 4];
            parts[pos] = format!("0{}", octet);
            let text = format!("{}:9000", parts.join("."));
            prop_assert!(validate(&text).is_err());
        }

        #[test]
        fn prop_port_out_of_range_rejected(port in 65536u64..10_000_000) {
            let text = format!("127.0.0.1:{}", port);
            prop_assert!(validate(&text).is_err());
        }
    }
}
