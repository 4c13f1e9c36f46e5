use std::collections::BTreeMap;

/// A label mapping supplied by one source (metric, resource or user labels).
pub type LabelMap = BTreeMap<String, String>;

/// Returns the index of the first key equal to `key`.
///
/// Comparison is case-sensitive and the empty string is a valid key.
#[must_use]
pub fn find_key_index<K: AsRef<str>>(keys: &[K], key: &str) -> Option<usize> {
    keys.iter().position(|k| k.as_ref() == key)
}

/// Returns true if `key` is present in `keys`.
#[must_use]
pub fn key_exists<K: AsRef<str>>(keys: &[K], key: &str) -> bool {
    find_key_index(keys, key).is_some()
}

/// Appends `key`/`value` if the key is absent.
///
/// When the key is already present the value at its first occurrence is replaced
/// if `override_existing` is set, otherwise nothing changes.
pub fn add_or_override(
    keys: &mut Vec<String>,
    values: &mut Vec<String>,
    key: &str,
    value: &str,
    override_existing: bool,
) {
    match find_key_index(keys, key) {
        None => {
            keys.push(key.to_owned());
            values.push(value.to_owned());
        }
        Some(index) if override_existing => {
            if let Some(slot) = values.get_mut(index) {
                value.clone_into(slot);
            }
        }
        Some(_) => {}
    }
}

/// An ordered label set stored as two parallel sequences.
///
/// Keys are unique and insertion order is preserved, so the first source to set a key
/// wins unless a later source explicitly overrides it in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet {
    keys: Vec<String>,
    values: Vec<String>,
}

impl LabelSet {
    /// Creates an empty label set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Creates an empty label set with room for `capacity` labels.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Appends the label unless the key already exists. Returns true if appended.
    pub fn push_if_absent(&mut self, key: &str, value: &str) -> bool {
        if self.key_exists(key) {
            return false;
        }
        self.keys.push(key.to_owned());
        self.values.push(value.to_owned());
        true
    }

    /// See [`add_or_override`].
    pub fn add_or_override(&mut self, key: &str, value: &str, override_existing: bool) {
        add_or_override(&mut self.keys, &mut self.values, key, value, override_existing);
    }

    /// See [`find_key_index`].
    #[must_use]
    pub fn find_key_index(&self, key: &str) -> Option<usize> {
        find_key_index(&self.keys, key)
    }

    /// See [`key_exists`].
    #[must_use]
    pub fn key_exists(&self, key: &str) -> bool {
        key_exists(&self.keys, key)
    }

    /// Value stored for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.find_key_index(key)
            .and_then(|index| self.values.get(index))
            .map(String::as_str)
    }

    /// Keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Values, parallel to [`keys`](Self::keys).
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Number of labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if the set holds no labels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keys
            .iter()
            .zip(self.values.iter())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Splits the set into its key and value sequences.
    #[must_use]
    pub fn into_parts(self) -> (Vec<String>, Vec<String>) {
        (self.keys, self.values)
    }
}

impl<K, V> FromIterator<(K, V)> for LabelSet
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    /// Builds a set with skip-existing semantics: later duplicates of a key are dropped.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (k, v) in iter {
            set.push_if_absent(k.as_ref(), v.as_ref());
        }
        set
    }
}
