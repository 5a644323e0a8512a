use crate::{entity::entity_map, Entity, Result};
use skein_core::{
    driver::Response,
    schema::Schema,
    stmt::{Include, Value},
};
use std::fmt;

/// A one-to-many navigation: the `C` rows whose `child_key` equals the
/// parent's `parent_key`, collected into a `Vec<C>` field of the parent.
pub struct HasMany<P, C> {
    name: &'static str,
    parent_key: &'static str,
    child_key: &'static str,
    field: fn(&mut P) -> &mut Vec<C>,

    /// Navigations of the children, loaded in the same round trip
    then: Vec<Box<dyn IncludeLoader<C>>>,
}

/// Loads one navigation of `P` and grafts the children onto the parents.
pub(crate) trait IncludeLoader<P>: Send + Sync {
    fn parent_key(&self) -> &str;

    /// The untyped include tree rooted at this navigation.
    fn include(&self, schema: &Schema) -> Result<Include>;

    /// Reads this navigation's result set, then those of its nested
    /// navigations in the order their statements were rendered.
    fn graft(&self, parents: &mut [P], response: &mut Response, schema: &Schema) -> Result<()>;
}

impl<P: Entity, C: Entity> HasMany<P, C> {
    pub fn new(
        name: &'static str,
        parent_key: &'static str,
        child_key: &'static str,
        field: fn(&mut P) -> &mut Vec<C>,
    ) -> HasMany<P, C> {
        HasMany {
            name,
            parent_key,
            child_key,
            field,
            then: vec![],
        }
    }

    /// Also loads a navigation of the children.
    pub fn then<G: Entity + Clone>(mut self, navigation: HasMany<C, G>) -> HasMany<P, C> {
        self.then.push(Box::new(navigation));
        self
    }
}

/// Children are cloned onto every parent sharing a key, as happens when the
/// parent query joins another table.
impl<P: Entity, C: Entity + Clone> IncludeLoader<P> for HasMany<P, C> {
    fn parent_key(&self) -> &str {
        self.parent_key
    }

    fn include(&self, schema: &Schema) -> Result<Include> {
        let target = entity_map::<C>(schema)?;
        target.member_or_err(self.child_key)?;

        let mut then = Vec::with_capacity(self.then.len());
        for nested in &self.then {
            then.push(nested.include(schema)?);
        }

        Ok(Include {
            navigation: self.name.to_string(),
            target,
            parent_key: self.parent_key.to_string(),
            child_key: self.child_key.to_string(),
            then,
        })
    }

    fn graft(&self, parents: &mut [P], response: &mut Response, schema: &Schema) -> Result<()> {
        let map = entity_map::<C>(schema)?;
        let child_key = map.member_or_err(self.child_key)?;
        let rows = response.next_rows()?.into_values()?;

        let mut keys = Vec::with_capacity(rows.len());
        let mut children = Vec::with_capacity(rows.len());
        for row in rows.rows() {
            keys.push(row.get(&child_key.member_name)?.clone().cast(&child_key.ty)?);
            children.push(C::load(row, &map)?);
        }

        for nested in &self.then {
            nested.graft(&mut children, response, schema)?;
        }

        let mut groups: Vec<(Value, Vec<C>)> = vec![];
        for (key, child) in keys.into_iter().zip(children) {
            match groups.iter_mut().find(|(group, _)| *group == key) {
                Some((_, members)) => members.push(child),
                None => groups.push((key, vec![child])),
            }
        }

        let parent_keys = parent_keys(parents, self.parent_key);
        let mut grafted = 0;
        for (parent, key) in parents.iter_mut().zip(parent_keys) {
            let key = key.cast(&child_key.ty)?;
            if let Some((_, members)) = groups.iter().find(|(group, _)| *group == key) {
                (self.field)(parent).extend(members.iter().cloned());
                grafted += members.len();
            }
        }

        tracing::debug!(navigation = self.name, rows = rows.len(), grafted, "include grafted");
        Ok(())
    }
}

impl<P, C> fmt::Debug for HasMany<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HasMany")
            .field("name", &self.name)
            .field("parent_key", &self.parent_key)
            .field("child_key", &self.child_key)
            .field("then", &self.then.len())
            .finish()
    }
}

/// The `member` value of every parent, in parent order.
pub(crate) fn parent_keys<P: Entity>(parents: &[P], member: &str) -> Vec<Value> {
    parents
        .iter()
        .map(|parent| parent.to_values().get(member).cloned().unwrap_or_default())
        .collect()
}

/// Distinct, non-null key values to load children for.
pub(crate) fn distinct_keys(keys: Vec<Value>) -> Vec<Value> {
    let mut distinct: Vec<Value> = Vec::with_capacity(keys.len());
    for key in keys {
        if !key.is_null() && !distinct.contains(&key) {
            distinct.push(key);
        }
    }
    distinct
}
