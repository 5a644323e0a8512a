use super::Value;
use indexmap::IndexMap;

/// Member name to value pairs for one row, in declaration order.
///
/// Produced from an entity instance or from a partial object. Insert and
/// update statements render their column lists from these.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MemberValues {
    entries: IndexMap<String, Value>,
}

impl MemberValues {
    pub fn new() -> MemberValues {
        MemberValues::default()
    }

    pub fn with(mut self, member: impl Into<String>, value: impl Into<Value>) -> MemberValues {
        self.insert(member, value);
        self
    }

    /// Sets `member`, keeping its original position when already present.
    pub fn insert(&mut self, member: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(member.into(), value.into());
    }

    pub fn get(&self, member: &str) -> Option<&Value> {
        self.entries.get(member)
    }

    pub fn contains(&self, member: &str) -> bool {
        self.entries.contains_key(member)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Adds every entry of `other`, overwriting values for shared members.
    pub fn merge(&mut self, other: MemberValues) {
        self.entries.extend(other.entries);
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for MemberValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        MemberValues {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for MemberValues {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
