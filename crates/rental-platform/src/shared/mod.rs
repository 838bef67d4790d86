pub mod api_common;
pub mod error;
pub mod indexes;
pub mod middleware;
pub mod route_policy;
pub mod tsid;

pub use api_common::MessageResponse;
pub use error::{ErrorResponse, PlatformError, Result};
pub use middleware::{Authenticated, AuthorizerState, CallerContext, RequestAuthorizerLayer};
pub use route_policy::{AccessRule, RoutePolicy};
pub use tsid::TsidGenerator;
