use crate::{Expr, Result};
use skein_core::{
    schema::{EntityMap, EntityMapBuilder, MemberMap, Schema},
    stmt::{self, MemberValues, Primitive, Row, ScopeId},
};
use std::sync::Arc;

/// A struct mapped to a table.
///
/// Implemented by [`entity!`](crate::entity!); every field is a member of
/// the entity map, addressed in expressions through [`Entity::Fields`].
pub trait Entity: Sized + Send + Sync + 'static {
    /// Entity name, used to look up the entity map
    const NAME: &'static str;

    /// One typed expression per member
    type Fields;

    /// Declared mapping, before any registration-time configuration.
    fn entity_map_builder() -> EntityMapBuilder;

    fn entity_map() -> Result<EntityMap> {
        Self::entity_map_builder().build()
    }

    /// Columns of the entity at table position `table` of the statement
    /// with scope `scope`.
    fn fields(scope: ScopeId, table: usize) -> Self::Fields;

    /// Reads an instance from a row labelled with member names.
    fn load(row: Row<'_>, map: &EntityMap) -> Result<Self>;

    /// The mapped members of the instance.
    fn to_values(&self) -> MemberValues;
}

/// A value materialized from one result row.
pub trait FromRow: Sized + Send + 'static {
    fn from_row(row: Row<'_>, schema: &Schema) -> Result<Self>;
}

macro_rules! impl_from_row {
    ( $( $ty:ty ),* ) => {
        $(
            impl FromRow for $ty {
                fn from_row(row: Row<'_>, _schema: &Schema) -> Result<Self> {
                    <$ty as Primitive>::from_value(row.index(0)?.clone())
                }
            }

            impl FromRow for Option<$ty> {
                fn from_row(row: Row<'_>, _schema: &Schema) -> Result<Self> {
                    <Option<$ty> as Primitive>::from_value(row.index(0)?.clone())
                }
            }
        )*
    };
}

impl_from_row!(bool, i32, i64, f64, String, Vec<u8>, uuid::Uuid);

/// Looks up the registered map of `T`, registering its declared map on
/// first use.
pub(crate) fn entity_map<T: Entity>(schema: &Schema) -> Result<Arc<EntityMap>> {
    schema.get_or_register(T::NAME, T::entity_map)
}

/// Member declaration derived from a field's Rust type.
pub fn member<V: Primitive>(name: &str, keys: &[&str], auto_increment: &[&str]) -> MemberMap {
    let mut member = MemberMap::new(name, V::TYPE).nullable(V::NULLABLE);
    if keys.contains(&name) {
        member = member.key();
    }
    if auto_increment.contains(&name) {
        member = member.auto_increment();
    }
    member
}

pub fn column<V>(scope: ScopeId, table: usize, member: &str) -> Expr<V> {
    Expr::from_untyped(stmt::Expr::column(scope, table, member))
}

/// Reads one member from a row, through the member's type handler.
///
/// Ignored members are not selected and read as the type's default.
pub fn read_member<V: Primitive + Default>(row: Row<'_>, map: &EntityMap, name: &str) -> Result<V> {
    if map.member(name).is_some_and(|member| member.is_ignore) {
        return Ok(V::default());
    }
    let member = map.member_or_err(name)?;

    let value = row.get(&member.member_name)?.clone();
    let value = match &member.type_handler {
        Some(handler) => handler.from_db(value)?,
        None => value,
    };
    V::from_value(value)
}

/// Declares an entity: the struct, its fields accessor and its mapping.
///
/// ```ignore
/// skein::entity! {
///     table = "user",
///     fields = UserFields,
///     key = [id],
///     auto_increment = [id],
///     has_many = [posts: Post [id => user_id]],
///
///     #[derive(Debug, Clone)]
///     pub struct User {
///         pub id: i64,
///         pub name: String,
///     }
/// }
/// ```
///
/// `auto_increment` and `has_many` are optional. A `has_many` navigation
/// adds a `Vec` field to the struct, filled by `include`, and an associated
/// function of the same name returning the [`HasMany`](crate::HasMany)
/// descriptor.
#[macro_export]
macro_rules! entity {
    (
        table = $table:literal,
        fields = $fields:ident,
        key = [$($key:ident),* $(,)?],
        auto_increment = [$($auto:ident),* $(,)?],
        has_many = [$( $nav:ident : $child:ty [$pk:ident => $ck:ident] ),* $(,)?],
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$fmeta:meta])* pub $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )*
            $( pub $nav: $crate::codegen_support::Vec<$child>, )*
        }

        pub struct $fields {
            $( pub $field: $crate::codegen_support::Expr<$ty>, )*
        }

        impl $name {
            $(
                pub fn $nav() -> $crate::codegen_support::HasMany<$name, $child> {
                    $crate::codegen_support::HasMany::new(
                        stringify!($nav),
                        stringify!($pk),
                        stringify!($ck),
                        |parent: &mut $name| &mut parent.$nav,
                    )
                }
            )*
        }

        impl $crate::codegen_support::Entity for $name {
            const NAME: &'static str = stringify!($name);

            type Fields = $fields;

            fn entity_map_builder() -> $crate::codegen_support::EntityMapBuilder {
                let keys: &[&str] = &[$(stringify!($key)),*];
                let auto_increment: &[&str] = &[$(stringify!($auto)),*];
                $crate::codegen_support::EntityMap::builder(stringify!($name))
                    .table_name($table)
                    $(
                        .member($crate::codegen_support::member::<$ty>(
                            stringify!($field),
                            keys,
                            auto_increment,
                        ))
                    )*
            }

            fn fields(scope: $crate::codegen_support::ScopeId, table: usize) -> $fields {
                $fields {
                    $( $field: $crate::codegen_support::column(scope, table, stringify!($field)), )*
                }
            }

            fn load(
                row: $crate::codegen_support::Row<'_>,
                map: &$crate::codegen_support::EntityMap,
            ) -> $crate::codegen_support::Result<Self> {
                Ok($name {
                    $( $field: $crate::codegen_support::read_member::<$ty>(row, map, stringify!($field))?, )*
                    $( $nav: $crate::codegen_support::Vec::new(), )*
                })
            }

            fn to_values(&self) -> $crate::codegen_support::MemberValues {
                let mut values = $crate::codegen_support::MemberValues::new();
                $(
                    values.insert(
                        stringify!($field),
                        <$ty as $crate::codegen_support::Primitive>::into_value(
                            ::core::clone::Clone::clone(&self.$field),
                        ),
                    );
                )*
                values
            }
        }

        impl $crate::codegen_support::FromRow for $name {
            fn from_row(
                row: $crate::codegen_support::Row<'_>,
                schema: &$crate::codegen_support::Schema,
            ) -> $crate::codegen_support::Result<Self> {
                let map = schema.get_or_register(
                    <$name as $crate::codegen_support::Entity>::NAME,
                    <$name as $crate::codegen_support::Entity>::entity_map,
                )?;
                <$name as $crate::codegen_support::Entity>::load(row, &map)
            }
        }
    };

    (
        table = $table:literal,
        fields = $fields:ident,
        key = [$($key:ident),* $(,)?],
        auto_increment = [$($auto:ident),* $(,)?],
        $($rest:tt)*
    ) => {
        $crate::entity! {
            table = $table,
            fields = $fields,
            key = [$($key),*],
            auto_increment = [$($auto),*],
            has_many = [],
            $($rest)*
        }
    };

    (
        table = $table:literal,
        fields = $fields:ident,
        key = [$($key:ident),* $(,)?],
        $($rest:tt)*
    ) => {
        $crate::entity! {
            table = $table,
            fields = $fields,
            key = [$($key),*],
            auto_increment = [],
            $($rest)*
        }
    };
}
