//! Hardware I/O transport contract
//!
//! The wire-level transport (Firmata, a serial bridge, a vendor SDK) lives
//! outside this crate. Boards only need two things from it: an optional pin
//! normalization function and a stable identity to match boards against.

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::pin::PinValue;

/// The part of a hardware transport the registration layer consumes
pub trait IoTransport: Send + Sync {
    /// Human-readable transport name
    fn name(&self) -> &str;

    /// Translate a raw pin identifier into the form this transport expects.
    ///
    /// Transports without a pin mapping keep the identity default.
    fn normalize(&self, pin: &PinValue) -> PinValue {
        pin.clone()
    }
}

/// Shared reference to a transport, compared by identity
#[derive(Clone)]
pub struct IoHandle(Arc<dyn IoTransport>);

impl IoHandle {
    pub fn new<T: IoTransport + 'static>(io: T) -> Self {
        Self(Arc::new(io))
    }

    pub fn from_arc(io: Arc<dyn IoTransport>) -> Self {
        Self(io)
    }

    /// Whether both handles point at the same transport instance
    pub fn same(&self, other: &IoHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for IoHandle {
    type Target = dyn IoTransport;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl PartialEq for IoHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for IoHandle {}

impl fmt::Debug for IoHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IoHandle").field(&self.0.name()).finish()
    }
}

type NormalizeFn = dyn Fn(&PinValue) -> PinValue + Send + Sync;

/// In-process transport with no hardware behind it.
///
/// Named pins found in the alias table are replaced first (e.g. `A0` -> 14),
/// then the optional custom normalizer runs on the result.
pub struct MockIo {
    name: String,
    aliases: HashMap<String, PinValue>,
    normalizer: Option<Box<NormalizeFn>>,
}

impl MockIo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: HashMap::new(),
            normalizer: None,
        }
    }

    /// Map a named pin onto another identifier
    pub fn with_alias(mut self, alias: impl Into<String>, pin: impl Into<PinValue>) -> Self {
        self.aliases.insert(alias.into(), pin.into());
        self
    }

    pub fn with_aliases<I, K, P>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<PinValue>,
    {
        self.aliases
            .extend(aliases.into_iter().map(|(k, p)| (k.into(), p.into())));
        self
    }

    /// Install a custom normalization function
    pub fn with_normalizer<F>(mut self, normalizer: F) -> Self
    where
        F: Fn(&PinValue) -> PinValue + Send + Sync + 'static,
    {
        self.normalizer = Some(Box::new(normalizer));
        self
    }
}

impl Default for MockIo {
    fn default() -> Self {
        Self::new("MockIo")
    }
}

impl fmt::Debug for MockIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockIo")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("normalizer", &self.normalizer.is_some())
            .finish()
    }
}

impl IoTransport for MockIo {
    fn name(&self) -> &str {
        &self.name
    }

    fn normalize(&self, pin: &PinValue) -> PinValue {
        let aliased = match pin {
            PinValue::Name(name) => self.aliases.get(name).unwrap_or(pin),
            PinValue::Number(_) => pin,
        };
        match &self.normalizer {
            Some(normalizer) => normalizer(aliased),
            None => aliased.clone(),
        }
    }
}
