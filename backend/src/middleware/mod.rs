pub mod auth;
pub mod device_identity;
pub mod rate_limit;
pub mod request_id;

pub use auth::*;
pub use device_identity::*;
pub use rate_limit::*;
pub use request_id::*;
