pub mod claims;
pub mod errors;
pub mod extractors;
pub mod jwt;
pub mod password;

pub use claims::TokenClaims;
pub use errors::AuthError;
pub use extractors::{AdminUser, AuthenticatedUser};
pub use jwt::JwtService;
pub use password::{hash_password, verify_dummy_password, verify_password};
