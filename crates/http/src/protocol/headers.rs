//! Ordered, case-insensitive header storage shared by requests and responses.
//!
//! Unlike `http::HeaderMap`, a [`HeaderTable`] keeps the spelling of every field name and
//! the order in which names were first inserted, which is also the order they are written
//! back to the wire. Each name is stored once: a repeated field is folded into the
//! existing value with a `,` separator.
//!
//! Wire parsing lives in [`crate::codec`], see [`HeaderTable::parse`].

use std::fmt;

/// An ordered sequence of `(name, value)` pairs keyed case-insensitively.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HeaderTable {
    entries: Vec<(String, String)>,
}

impl HeaderTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity) }
    }

    /// Sets `name` to `value`, overwriting any existing value.
    ///
    /// An overwritten field keeps its original position and spelling.
    pub fn set<N, V>(&mut self, name: N, value: V)
    where
        N: Into<String>,
        V: Into<String>,
    {
        let name = name.into();
        match self.position(&name) {
            Some(index) => self.entries[index].1 = value.into(),
            None => self.entries.push((name, value.into())),
        }
    }

    /// Adds `value` under `name`, folding it into an existing value as `old,value`.
    pub fn append<N, V>(&mut self, name: N, value: V)
    where
        N: Into<String>,
        V: AsRef<str>,
    {
        let name = name.into();
        let value = value.as_ref();
        match self.position(&name) {
            Some(index) => {
                let existing = &mut self.entries[index].1;
                existing.reserve(value.len() + 1);
                existing.push(',');
                existing.push_str(value);
            }
            None => self.entries.push((name, value.to_owned())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|index| self.entries[index].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Removes `name` and returns its value; a missing name is a no-op.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name).map(|index| self.entries.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> Iter<'_> {
        Iter { inner: self.entries.iter() }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(key, _)| key.eq_ignore_ascii_case(name))
    }
}

impl fmt::Debug for HeaderTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<N, V> FromIterator<(N, V)> for HeaderTable
where
    N: Into<String>,
    V: AsRef<str>,
{
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut table = HeaderTable::new();
        for (name, value) in iter {
            table.append(name, value);
        }
        table
    }
}

impl<'a> IntoIterator for &'a HeaderTable {
    type Item = (&'a str, &'a str);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct Iter<'a> {
    inner: std::slice::Iter<'a, (String, String)>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}
