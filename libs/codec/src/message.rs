//! Decoded packet model
//!
//! [`Arg`] is a closed tagged union over the three supported type tags. Floats
//! compare by bit pattern so that a decoded message always equals the message
//! it was encoded from, NaN payloads included.

use crate::constants::{TAG_FLOAT, TAG_INT, TAG_STRING};
use std::fmt;

/// One argument value, dispatched by its type-tag character
#[derive(Debug, Clone)]
pub enum Arg {
    Int(i32),
    Float(f32),
    Str(String),
}

impl Arg {
    /// Type-tag character for this argument
    pub fn tag(&self) -> u8 {
        match self {
            Arg::Int(_) => TAG_INT,
            Arg::Float(_) => TAG_FLOAT,
            Arg::Str(_) => TAG_STRING,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Arg::Int(_) => "int",
            Arg::Float(_) => "float",
            Arg::Str(_) => "string",
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Arg::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Arg::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Arg {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Arg::Int(a), Arg::Int(b)) => a == b,
            (Arg::Float(a), Arg::Float(b)) => a.to_bits() == b.to_bits(),
            (Arg::Str(a), Arg::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Arg {}

impl From<i32> for Arg {
    fn from(v: i32) -> Self {
        Arg::Int(v)
    }
}

impl From<f32> for Arg {
    fn from(v: f32) -> Self {
        Arg::Float(v)
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Arg::Str(v.to_string())
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Arg::Str(v)
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Int(v) => write!(f, "{v}"),
            Arg::Float(v) => write!(f, "{v}"),
            Arg::Str(s) => write!(f, "{s:?}"),
        }
    }
}

/// An addressed argument list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub address: String,
    pub args: Vec<Arg>,
}

impl Message {
    pub fn new(address: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            address: address.into(),
            args,
        }
    }

    /// Type-tag string without the leading comma, e.g. `"iiiiif"`
    pub fn type_tags(&self) -> String {
        self.args.iter().map(|a| a.tag() as char).collect()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ,{}", self.address, self.type_tags())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// NTP-format time tag carried by bundles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeTag {
    pub seconds: u32,
    pub fraction: u32,
}

impl TimeTag {
    /// The reserved "process immediately" value
    pub const IMMEDIATE: TimeTag = TimeTag {
        seconds: 0,
        fraction: 1,
    };

    pub fn from_u64(raw: u64) -> Self {
        Self {
            seconds: (raw >> 32) as u32,
            fraction: raw as u32,
        }
    }

    pub fn as_u64(&self) -> u64 {
        ((self.seconds as u64) << 32) | self.fraction as u64
    }

    pub fn is_immediate(&self) -> bool {
        *self == Self::IMMEDIATE
    }
}

impl Default for TimeTag {
    fn default() -> Self {
        Self::IMMEDIATE
    }
}

/// Time-tagged group of packets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub time_tag: TimeTag,
    pub content: Vec<Packet>,
}

/// Top-level datagram payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Message(Message),
    Bundle(Bundle),
}

impl Packet {
    /// Flatten into messages in wire order, descending into bundles
    pub fn into_messages(self) -> Vec<Message> {
        let mut out = Vec::new();
        self.collect_messages(&mut out);
        out
    }

    fn collect_messages(self, out: &mut Vec<Message>) {
        match self {
            Packet::Message(msg) => out.push(msg),
            Packet::Bundle(bundle) => {
                for packet in bundle.content {
                    packet.collect_messages(out);
                }
            }
        }
    }
}

impl From<Message> for Packet {
    fn from(msg: Message) -> Self {
        Packet::Message(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_equality_is_bitwise() {
        assert_eq!(Arg::Float(f32::NAN), Arg::Float(f32::NAN));
        assert_ne!(Arg::Float(0.0), Arg::Float(-0.0));
        assert_ne!(Arg::Int(1), Arg::Float(1.0));
    }

    #[test]
    fn test_type_tags() {
        let msg = Message::new("/a", vec![Arg::Int(1), Arg::Float(0.5), "bd".into()]);
        assert_eq!(msg.type_tags(), "ifs");
        assert_eq!(msg.to_string(), "/a ,ifs 1 0.5 \"bd\"");
    }

    #[test]
    fn test_flatten_nested_bundles() {
        let inner = Packet::Bundle(Bundle {
            time_tag: TimeTag::IMMEDIATE,
            content: vec![Message::new("/b", vec![]).into()],
        });
        let outer = Packet::Bundle(Bundle {
            time_tag: TimeTag::from_u64(42),
            content: vec![Message::new("/a", vec![]).into(), inner, Message::new("/c", vec![]).into()],
        });

        let addrs: Vec<_> = outer.into_messages().into_iter().map(|m| m.address).collect();
        assert_eq!(addrs, vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn test_time_tag_split() {
        let tag = TimeTag::from_u64(0x0000_0001_0000_0002);
        assert_eq!(tag.seconds, 1);
        assert_eq!(tag.fraction, 2);
        assert_eq!(tag.as_u64(), 0x0000_0001_0000_0002);
        assert!(TimeTag::default().is_immediate());
    }
}
