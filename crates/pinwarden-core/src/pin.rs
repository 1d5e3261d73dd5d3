//! Pin identifiers and shape-preserving normalization
//!
//! Components declare pins as a single identifier, an ordered list, or a
//! table of named roles (e.g. `{ clock = 2, data = 3 }`). Normalization
//! translates every identifier through the board's I/O transport while
//! keeping the declared shape, order and role names intact.

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Unexpected, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::board::Board;

/// A raw or normalized identifier for a physical controller terminal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PinValue {
    /// Numeric pin (e.g. `13`)
    Number(u32),
    /// Named pin (e.g. `"A0"`, `"GPIO4"`, `"P1-7"`)
    Name(String),
}

impl PinValue {
    pub fn as_number(&self) -> Option<u32> {
        match self {
            PinValue::Number(n) => Some(*n),
            PinValue::Name(_) => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            PinValue::Number(_) => None,
            PinValue::Name(name) => Some(name),
        }
    }
}

impl From<u32> for PinValue {
    fn from(n: u32) -> Self {
        PinValue::Number(n)
    }
}

impl From<&str> for PinValue {
    fn from(name: &str) -> Self {
        PinValue::Name(name.to_string())
    }
}

impl From<String> for PinValue {
    fn from(name: String) -> Self {
        PinValue::Name(name)
    }
}

impl fmt::Display for PinValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinValue::Number(n) => write!(f, "{}", n),
            PinValue::Name(name) => f.write_str(name),
        }
    }
}

/// The shape in which a component declares its pins
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinSpec {
    /// A single pin
    Scalar(PinValue),
    /// An ordered list of pins
    Sequence(Vec<PinValue>),
    /// Named pin roles, in declaration order
    Mapping(Vec<(String, PinValue)>),
}

impl PinSpec {
    /// Build an ordered list of pins
    pub fn sequence<I, P>(pins: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PinValue>,
    {
        PinSpec::Sequence(pins.into_iter().map(Into::into).collect())
    }

    /// Build a table of named pin roles, keeping the given order
    pub fn mapping<I, K, P>(roles: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<PinValue>,
    {
        PinSpec::Mapping(
            roles
                .into_iter()
                .map(|(role, pin)| (role.into(), pin.into()))
                .collect(),
        )
    }

    /// Apply `f` to every pin, preserving shape, order and role names
    pub fn map<F>(&self, mut f: F) -> PinSpec
    where
        F: FnMut(&PinValue) -> PinValue,
    {
        match self {
            PinSpec::Scalar(pin) => PinSpec::Scalar(f(pin)),
            PinSpec::Sequence(pins) => PinSpec::Sequence(pins.iter().map(f).collect()),
            PinSpec::Mapping(roles) => PinSpec::Mapping(
                roles
                    .iter()
                    .map(|(role, pin)| (role.clone(), f(pin)))
                    .collect(),
            ),
        }
    }

    /// Every pin in declaration order, regardless of shape
    pub fn values(&self) -> Box<dyn Iterator<Item = &PinValue> + '_> {
        match self {
            PinSpec::Scalar(pin) => Box::new(std::iter::once(pin)),
            PinSpec::Sequence(pins) => Box::new(pins.iter()),
            PinSpec::Mapping(roles) => Box::new(roles.iter().map(|(_, pin)| pin)),
        }
    }

    /// Look up a named role in a mapping
    pub fn role(&self, name: &str) -> Option<&PinValue> {
        match self {
            PinSpec::Mapping(roles) => roles
                .iter()
                .find(|(role, _)| role == name)
                .map(|(_, pin)| pin),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PinSpec::Scalar(_) => 1,
            PinSpec::Sequence(pins) => pins.len(),
            PinSpec::Mapping(roles) => roles.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<PinValue> for PinSpec {
    fn from(pin: PinValue) -> Self {
        PinSpec::Scalar(pin)
    }
}

impl From<u32> for PinSpec {
    fn from(n: u32) -> Self {
        PinSpec::Scalar(PinValue::Number(n))
    }
}

impl From<Vec<PinValue>> for PinSpec {
    fn from(pins: Vec<PinValue>) -> Self {
        PinSpec::Sequence(pins)
    }
}

/// Normalize a single pin identifier through the board's transport
pub fn normalize_value(pin: &PinValue, board: &Board) -> PinValue {
    board.io().normalize(pin)
}

/// Normalize every pin of a declaration through the board's transport.
///
/// The result has the same shape as the input. This never touches the
/// board's occupancy ledger.
pub fn normalize(spec: &PinSpec, board: &Board) -> PinSpec {
    let io = board.io();
    spec.map(|pin| io.normalize(pin))
}

impl Serialize for PinSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PinSpec::Scalar(pin) => pin.serialize(serializer),
            PinSpec::Sequence(pins) => pins.serialize(serializer),
            PinSpec::Mapping(roles) => {
                let mut map = serializer.serialize_map(Some(roles.len()))?;
                for (role, pin) in roles {
                    map.serialize_entry(role, pin)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for PinSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PinSpecVisitor)
    }
}

struct PinSpecVisitor;

impl<'de> Visitor<'de> for PinSpecVisitor {
    type Value = PinSpec;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a pin, a list of pins or a table of named pins")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<PinSpec, E> {
        u32::try_from(v)
            .map(|n| PinSpec::Scalar(PinValue::Number(n)))
            .map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<PinSpec, E> {
        match u64::try_from(v) {
            Ok(v) => self.visit_u64(v),
            Err(_) => Err(E::invalid_value(Unexpected::Signed(v), &self)),
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<PinSpec, E> {
        Ok(PinSpec::Scalar(PinValue::Name(v.to_string())))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<PinSpec, A::Error> {
        let mut pins = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(pin) = seq.next_element::<PinValue>()? {
            pins.push(pin);
        }
        Ok(PinSpec::Sequence(pins))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<PinSpec, A::Error> {
        let mut roles = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((role, pin)) = map.next_entry::<String, PinValue>()? {
            roles.push((role, pin));
        }
        Ok(PinSpec::Mapping(roles))
    }
}
