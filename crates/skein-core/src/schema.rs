mod entity_map;
pub use entity_map::{EntityMap, EntityMapBuilder};

mod member_map;
pub use member_map::MemberMap;

mod provider;
pub use provider::{EntityMapProvider, Schema};

mod sharding;
pub use sharding::{
    sharded_table_name, split_sharding_parameters, ShardBy, Sharding, ShardingProvider,
    TableSharding,
};

mod type_handler;
pub use type_handler::TypeHandler;
