//! Lenient field parsing for request parameters.
//!
//! Clients historically sent every parameter as a form string, so numeric
//! fields accept either a JSON number or a numeric string. Counts and
//! probabilities never fail to parse: anything unusable becomes `0`.
//! Room ids are stricter because a wrong id must not silently address
//! room `0`.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::RoomId;

/// Any JSON value a numeric field might arrive as.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

/// Deserializes a non-negative count. Garbage, negatives, fractions and
/// overflow all yield `0`.
pub(crate) fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Loose::deserialize(deserializer)? {
        Loose::Unsigned(n) => u32::try_from(n).unwrap_or(0),
        Loose::Float(f) if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => {
            f as u32
        }
        Loose::Text(s) => parse_count(&s),
        _ => 0,
    })
}

/// Deserializes a probability. Garbage, negative and non-finite values
/// yield `0.0`.
pub(crate) fn probability<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Loose::deserialize(deserializer)? {
        Loose::Unsigned(n) => n as f64,
        Loose::Signed(n) => n as f64,
        Loose::Float(f) => f,
        Loose::Text(s) => s.trim().parse().unwrap_or(0.0),
        Loose::Other(_) => 0.0,
    };
    Ok(if value.is_finite() && value > 0.0 { value } else { 0.0 })
}

/// Deserializes a room id from a number or a numeric string.
pub(crate) fn room_id<'de, D>(deserializer: D) -> Result<RoomId, D::Error>
where
    D: Deserializer<'de>,
{
    match Loose::deserialize(deserializer)? {
        Loose::Unsigned(n) => Ok(RoomId(n)),
        Loose::Text(s) => s
            .trim()
            .parse()
            .map(RoomId)
            .map_err(|_| de::Error::custom(format!("invalid game_id {s:?}"))),
        _ => Err(de::Error::custom("game_id must be a non-negative integer")),
    }
}

fn parse_count(s: &str) -> u32 {
    s.trim().parse().unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Dimensions
// ---------------------------------------------------------------------------

/// Board dimensions, written `"WxH"` on the wire.
///
/// Parsing never fails: a missing or malformed component is `0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl FromStr for Dimensions {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('x');
        let width = parts.next().map(parse_count).unwrap_or(0);
        let height = parts.next().map(parse_count).unwrap_or(0);
        Ok(Self { width, height })
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl Serialize for Dimensions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Dimensions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Loose::deserialize(deserializer)? {
            Loose::Text(s) => s.parse().unwrap_or_default(),
            _ => Dimensions::default(),
        })
    }
}
