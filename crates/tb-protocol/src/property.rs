//! Property bags: ordered string-to-string request parameters
//!
//! Values always travel as text. Whether `"1.5"` is a float or `"XY_PLANE"`
//! an enum is agreed between the operator and the server, not the codec.

use bytes::BytesMut;

use crate::error::{DecodingError, EncodingError};
use crate::wire::{self, ReadResult, MAX_COUNT};

/// Ordered mapping from unique string keys to string values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyBag {
    entries: Vec<(String, String)>,
}

impl PropertyBag {
    /// Create an empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a property, returning the previous value for `key`.
    ///
    /// Replacing a value keeps the key at its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let position = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(position).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodingError> {
        wire::put_count(dst, "property", self.entries.len(), MAX_COUNT)?;
        for (key, value) in &self.entries {
            wire::put_string(dst, "property key", key)?;
            wire::put_string(dst, "property value", value)?;
        }
        Ok(())
    }

    pub(crate) fn decode(src: &mut &[u8]) -> ReadResult<Self> {
        let count = wire::get_count(src, "property", MAX_COUNT)?;
        // Every pair needs at least two length prefixes
        let mut bag = PropertyBag {
            entries: Vec::with_capacity(count.min(src.len() / 8)),
        };
        for _ in 0..count {
            let key = wire::get_string(src, "property key")?;
            let value = wire::get_string(src, "property value")?;
            if bag.contains_key(&key) {
                return Err(DecodingError::DuplicateKey(key).into());
            }
            bag.entries.push((key, value));
        }
        Ok(bag)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = PropertyBag::new();
        bag.extend(iter);
        bag
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for PropertyBag {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl IntoIterator for PropertyBag {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::ReadError;

    fn median_axis_bag() -> PropertyBag {
        PropertyBag::new()
            .with("projectionPlane", "XY_PLANE")
            .with("zEpsilon", "1.5")
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut bag = median_axis_bag();
        let previous = bag.insert("projectionPlane", "YZ_PLANE");

        assert_eq!(previous.as_deref(), Some("XY_PLANE"));
        assert_eq!(bag.len(), 2);
        let keys: Vec<&str> = bag.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["projectionPlane", "zEpsilon"]);
        assert_eq!(bag.get("projectionPlane"), Some("YZ_PLANE"));
    }

    #[test]
    fn test_remove() {
        let mut bag = median_axis_bag();
        assert_eq!(bag.remove("zEpsilon").as_deref(), Some("1.5"));
        assert_eq!(bag.remove("zEpsilon"), None);
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn test_bag_roundtrip() {
        let bag: PropertyBag = [
            ("projectionPlane", "XY_PLANE"),
            ("useMultiThreading", "FALSE"),
            ("zEpsilon", "1.5"),
            ("unitSystem", "METRIC"),
            ("note", "ünïcödé ✓"),
            ("empty", ""),
        ]
        .into_iter()
        .collect();

        let mut buf = BytesMut::new();
        bag.encode(&mut buf).unwrap();

        let mut cursor: &[u8] = &buf[..];
        let decoded = PropertyBag::decode(&mut cursor).unwrap();
        assert_eq!(decoded, bag);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_empty_bag_is_four_bytes() {
        let mut buf = BytesMut::new();
        PropertyBag::new().encode(&mut buf).unwrap();
        assert_eq!(&buf[..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut buf = BytesMut::new();
        wire::put_count(&mut buf, "property", 2, MAX_COUNT).unwrap();
        for _ in 0..2 {
            wire::put_string(&mut buf, "k", "zEpsilon").unwrap();
            wire::put_string(&mut buf, "v", "1.5").unwrap();
        }

        let mut cursor: &[u8] = &buf[..];
        let result = PropertyBag::decode(&mut cursor);
        assert!(matches!(
            result,
            Err(ReadError::Invalid(DecodingError::DuplicateKey(ref k))) if k == "zEpsilon"
        ));
    }
}
