use std::fmt;

use rosc::{encoder, OscMessage, OscPacket, OscType};

use crate::error::Result;

/// The argument types this bridge puts on the wire.
#[derive(Clone, Debug, PartialEq)]
pub enum OscArg {
    Int(i32),
    Float(f32),
    Str(String),
}

impl OscArg {
    pub fn to_osc(&self) -> OscType {
        match self {
            OscArg::Int(v) => OscType::Int(*v),
            OscArg::Float(v) => OscType::Float(*v),
            OscArg::Str(s) => OscType::String(s.clone()),
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            OscArg::Float(v) => Some(*v),
            OscArg::Int(v) => Some(*v as f32),
            OscArg::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OscArg::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for OscArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OscArg::Int(v) => write!(f, "{}", v),
            OscArg::Float(v) => write!(f, "{}", v),
            OscArg::Str(s) => f.write_str(s),
        }
    }
}

/// One outbound OSC message: an address plus ordered, typed arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageEnvelope {
    pub address: String,
    pub args: Vec<OscArg>,
}

impl MessageEnvelope {
    /// Bare address with no arguments ("stop" style signals).
    pub fn new(address: impl Into<String>) -> Self {
        MessageEnvelope {
            address: address.into(),
            args: Vec::new(),
        }
    }

    pub fn int(mut self, v: i32) -> Self {
        self.args.push(OscArg::Int(v));
        self
    }

    pub fn float(mut self, v: f32) -> Self {
        self.args.push(OscArg::Float(v));
        self
    }

    pub fn string(mut self, v: impl Into<String>) -> Self {
        self.args.push(OscArg::Str(v.into()));
        self
    }

    /// 2-vectors travel as two consecutive floats, never a composite type.
    pub fn vec2(self, a: f32, b: f32) -> Self {
        self.float(a).float(b)
    }

    /// Human readable argument list for status lines.
    pub fn value_text(&self) -> String {
        self.args
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn to_packet(&self) -> OscPacket {
        OscPacket::Message(OscMessage {
            addr: self.address.clone(),
            args: self.args.iter().map(OscArg::to_osc).collect(),
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(encoder::encode(&self.to_packet())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosc::decoder;

    #[test]
    fn test_type_tags_on_the_wire() {
        let env = MessageEnvelope::new("/mix").int(3).float(0.5).string("hi");
        let bytes = env.encode().unwrap();
        // address "/mix" padded to 8 bytes, then the type tag string
        assert_eq!(&bytes[8..13], b",ifs\0");
    }

    #[test]
    fn test_vec2_is_two_floats() {
        let env = MessageEnvelope::new("/ambisonic1").vec2(0.5, 1.25);
        assert_eq!(env.args, vec![OscArg::Float(0.5), OscArg::Float(1.25)]);

        let bytes = env.encode().unwrap();
        let (_, packet) = decoder::decode_udp(&bytes).unwrap();
        match packet {
            OscPacket::Message(msg) => {
                assert_eq!(msg.addr, "/ambisonic1");
                assert_eq!(msg.args, vec![OscType::Float(0.5), OscType::Float(1.25)]);
            }
            OscPacket::Bundle(_) => panic!("expected a message"),
        }
    }

    #[test]
    fn test_bare_address_has_no_args() {
        let env = MessageEnvelope::new("/stopAll");
        assert!(env.args.is_empty());
        assert_eq!(env.value_text(), "");
        assert!(env.encode().is_ok());
    }
}
