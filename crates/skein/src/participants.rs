use crate::{entity::entity_map, Entity, Result};
use skein_core::{
    schema::{EntityMap, Schema},
    stmt::ScopeId,
};
use std::sync::Arc;

/// The entities a statement reads: one entity, or a tuple of joined
/// entities in join order.
///
/// Filter and projection closures receive [`Participants::Fields`], one
/// fields accessor per entity.
pub trait Participants: Send + Sync + 'static {
    /// Entity of the FROM table; rows are read into it
    type Root: Entity;

    type Fields;

    fn fields(scope: ScopeId) -> Self::Fields;

    fn entity_maps(schema: &Schema) -> Result<Vec<Arc<EntityMap>>>;
}

/// Adds `N` as the next joined entity.
pub trait JoinWith<N: Entity>: Participants {
    type Output: Participants<Root = Self::Root>;
}

impl<A: Entity> Participants for A {
    type Root = A;
    type Fields = A::Fields;

    fn fields(scope: ScopeId) -> A::Fields {
        A::fields(scope, 0)
    }

    fn entity_maps(schema: &Schema) -> Result<Vec<Arc<EntityMap>>> {
        Ok(vec![entity_map::<A>(schema)?])
    }
}

impl<A: Entity, N: Entity> JoinWith<N> for A {
    type Output = (A, N);
}

macro_rules! impl_participants {
    ( $( ( $( $t:ident : $index:tt ),* ); )* ) => {
        $(
            impl<$($t: Entity),*> Participants for ($($t,)*) {
                type Root = impl_participants!(@first $($t)*);
                type Fields = ($($t::Fields,)*);

                fn fields(scope: ScopeId) -> Self::Fields {
                    ($($t::fields(scope, $index),)*)
                }

                fn entity_maps(schema: &Schema) -> Result<Vec<Arc<EntityMap>>> {
                    Ok(vec![$(entity_map::<$t>(schema)?),*])
                }
            }
        )*
    };
    (@first $first:ident $($rest:ident)*) => { $first };
}

impl_participants! {
    (A: 0, B: 1);
    (A: 0, B: 1, C: 2);
    (A: 0, B: 1, C: 2, D: 3);
}

impl<A: Entity, B: Entity, N: Entity> JoinWith<N> for (A, B) {
    type Output = (A, B, N);
}

impl<A: Entity, B: Entity, C: Entity, N: Entity> JoinWith<N> for (A, B, C) {
    type Output = (A, B, C, N);
}
