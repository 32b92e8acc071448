//! Ordered, typed option maps.
//!
//! Mission configurations are nested mappings whose key order is meaningful
//! to the people who write them.
//! An [`OptionMap`] keeps keys in insertion order, and its keys are enums
//! generated by [`option_keys!`] with an `Other` catch-all, so keys this crate
//! does not know about survive a round trip untouched.

use std::{fmt, marker::PhantomData};

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};
use sortie_core::{TaggedBounds, TaggedValue, Unit};

/// A key in an [`OptionMap`].
pub trait OptionKey: Clone + PartialEq {
    /// Returns the key as written in a configuration literal.
    fn as_str(&self) -> &str;

    /// Parses a key, falling back to a catch-all for unknown names.
    fn from_name(name: &str) -> Self;
}

impl OptionKey for String {
    fn as_str(&self) -> &str {
        self
    }

    fn from_name(name: &str) -> Self {
        name.to_owned()
    }
}

/// Generates an [`OptionKey`] enum with an `Other(String)` catch-all.
macro_rules! option_keys {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$doc:meta])* $variant:ident => $key:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$doc])* $variant,)+
            /// A key with no dedicated variant, kept verbatim.
            Other(String),
        }

        impl $crate::option::OptionKey for $name {
            fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $key,)+
                    Self::Other(name) => name,
                }
            }

            fn from_name(name: &str) -> Self {
                match name {
                    $($key => Self::$variant,)+
                    other => Self::Other(other.to_owned()),
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::option::OptionKey::as_str(self))
            }
        }
    };
}

pub(crate) use option_keys;

/// A single option value in a configuration literal.
///
/// Variants are tried in declaration order when deserializing, so a
/// two-element `[[lo, hi], "unit"]` pair is read as bounds and
/// `[value, "unit"]` as a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Flag(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    Bounds(TaggedBounds),
    Quantity(TaggedValue),
}

impl OptionValue {
    #[must_use]
    pub fn quantity(value: f64, unit: Unit) -> Self {
        Self::Quantity(TaggedValue::scalar(value, unit))
    }

    #[must_use]
    pub fn bounds(lower: f64, upper: f64, unit: Unit) -> Self {
        Self::Bounds(TaggedBounds::new(lower, upper, unit))
    }

    #[must_use]
    pub fn as_quantity(&self) -> Option<&TaggedValue> {
        match self {
            Self::Quantity(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bounds(&self) -> Option<&TaggedBounds> {
        match self {
            Self::Bounds(bounds) => Some(bounds),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<bool> for OptionValue {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for OptionValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<TaggedValue> for OptionValue {
    fn from(value: TaggedValue) -> Self {
        Self::Quantity(value)
    }
}

impl From<TaggedBounds> for OptionValue {
    fn from(bounds: TaggedBounds) -> Self {
        Self::Bounds(bounds)
    }
}

/// An insertion-ordered map from option keys to values.
///
/// Replacing the value of an existing key keeps its position.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionMap<K, V = OptionValue> {
    entries: Vec<(K, V)>,
}

impl<K, V> Default for OptionMap<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: OptionKey, V> OptionMap<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `self` with `key` set to `value`.
    #[must_use]
    pub fn with(mut self, key: K, value: impl Into<V>) -> Self {
        self.insert(key, value.into());
        self
    }

    /// Sets `key`, returning the value it replaced.
    ///
    /// New keys are appended; existing keys keep their position.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.get_mut(&key) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Removes `key`, shifting later keys forward.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl<K: OptionKey> OptionMap<K, OptionValue> {
    #[must_use]
    pub fn quantity(&self, key: &K) -> Option<&TaggedValue> {
        self.get(key).and_then(OptionValue::as_quantity)
    }

    #[must_use]
    pub fn bounds(&self, key: &K) -> Option<&TaggedBounds> {
        self.get(key).and_then(OptionValue::as_bounds)
    }

    /// Returns a boolean option, treating an absent key as `false`.
    #[must_use]
    pub fn flag(&self, key: &K) -> bool {
        self.get(key).and_then(OptionValue::as_flag).unwrap_or(false)
    }
}

impl<K: OptionKey, V> FromIterator<(K, V)> for OptionMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<K: OptionKey, V: Serialize> Serialize for OptionMap<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key.as_str(), value)?;
        }
        map.end()
    }
}

impl<'de, K: OptionKey, V: Deserialize<'de>> Deserialize<'de> for OptionMap<K, V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OptionMapVisitor(PhantomData))
    }
}

struct OptionMapVisitor<K, V>(PhantomData<(K, V)>);

impl<'de, K: OptionKey, V: Deserialize<'de>> Visitor<'de> for OptionMapVisitor<K, V> {
    type Value = OptionMap<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map of option names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = OptionMap::new();
        while let Some((name, value)) = access.next_entry::<String, V>()? {
            map.insert(K::from_name(&name), value);
        }
        Ok(map)
    }
}
