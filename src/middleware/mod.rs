pub mod auth;
pub mod correlation;
pub mod rate_limit;
pub mod timing;

pub use auth::optional_auth_middleware;
pub use correlation::{correlation_middleware, CorrelationId};
pub use rate_limit::rate_limit_middleware;
pub use timing::timing_middleware;
