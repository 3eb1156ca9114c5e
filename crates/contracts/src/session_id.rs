//! SessionId - recording session name
//!
//! The folder name of a recording (tabs replaced by spaces). Doubles as the
//! `player_name` join key against the participants table.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Session identifier, `Arc<str>` backed so records, failures and table rows
/// can all hold one without reallocating.
///
/// # Examples
/// ```
/// use contracts::SessionId;
///
/// let id = SessionId::from_folder_name("Ivan\tPetrov");
/// assert_eq!(id, "Ivan Petrov");
/// ```
#[derive(Clone, Default, PartialOrd, Ord)]
pub struct SessionId(Arc<str>);

impl SessionId {
    #[inline]
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Session name from a recording folder name: tabs become spaces so the
    /// id matches the `First Name Last Name` of the participants table.
    pub fn from_folder_name(folder: &str) -> Self {
        Self::from(folder.replace('\t', " "))
    }

    /// Get the underlying string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for SessionId {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for SessionId {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SessionId {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    #[inline]
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for SessionId {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<Arc<str>> for SessionId {
    #[inline]
    fn from(s: Arc<str>) -> Self {
        Self(s)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({:?})", self.0)
    }
}

impl PartialEq for SessionId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for SessionId {}

impl PartialEq<str> for SessionId {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for SessionId {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl PartialEq<String> for SessionId {
    #[inline]
    fn eq(&self, other: &String) -> bool {
        self.0.as_ref() == other
    }
}

impl Hash for SessionId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl Serialize for SessionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};

    #[test]
    fn clone_shares_allocation() {
        let a: SessionId = "Anna Smirnova".into();
        let b = a.clone();
        assert_eq!(a.as_str().as_ptr(), b.as_str().as_ptr());
    }

    #[test]
    fn folder_name_tabs_become_spaces() {
        let id = SessionId::from_folder_name("Anna\tSmirnova");
        assert_eq!(id, "Anna Smirnova");
        assert_eq!(id, String::from("Anna Smirnova"));
    }

    #[test]
    fn lookup_by_str() {
        let mut map: HashMap<SessionId, i32> = HashMap::new();
        map.insert("s1".into(), 1);
        assert_eq!(map.get("s1"), Some(&1));

        let mut ordered: BTreeMap<SessionId, i32> = BTreeMap::new();
        ordered.insert("b".into(), 2);
        ordered.insert("a".into(), 1);
        let keys: Vec<&str> = ordered.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(ordered.get("b"), Some(&2));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id: SessionId = "p01".into();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"p01\"");
        let parsed: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
