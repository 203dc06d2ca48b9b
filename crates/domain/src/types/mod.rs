//! Domain types for the NJUNS REST API

pub mod entity;
pub mod options;
pub mod query;
pub mod search;
pub mod user;

pub use entity::Entity;
pub use options::{validate_limit, EntityOptions, ListOptions, QueryOptions, SearchOptions};
pub use query::{PredefinedQuery, QueryParameter};
pub use search::{SearchCondition, SearchFilter, SearchGroup, SearchOperator};
pub use user::UserInfo;
