pub mod cookies;
pub mod jwt;
pub mod net;
pub mod password;
pub mod qr_token;
pub mod time;

pub use jwt::*;
pub use password::*;
pub use time::*;
