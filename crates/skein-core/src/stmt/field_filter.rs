/// Restricts which members an insert or update writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldFilter {
    /// When set, only these members are written
    pub only: Option<Vec<String>>,

    /// Members never written
    pub ignore: Vec<String>,
}

impl FieldFilter {
    pub fn allows(&self, member: &str) -> bool {
        if self.ignore.iter().any(|m| m == member) {
            return false;
        }
        match &self.only {
            Some(only) => only.iter().any(|m| m == member),
            None => true,
        }
    }

    pub fn only(&mut self, members: impl IntoIterator<Item = impl Into<String>>) {
        self.only
            .get_or_insert_with(Vec::new)
            .extend(members.into_iter().map(Into::into));
    }

    pub fn ignore(&mut self, members: impl IntoIterator<Item = impl Into<String>>) {
        self.ignore.extend(members.into_iter().map(Into::into));
    }
}
