//! Domain types

pub mod query;
pub mod request;
pub mod response;
pub mod token;

pub use query::{append_query, QueryParams};
pub use request::{HttpMethod, RequestDescriptor};
pub use response::ApiResponse;
pub use token::{TokenGrant, TokenInfo, TokenRecord};
