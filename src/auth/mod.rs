//! Authentication for the users API
//!
//! Bearer tokens are HS256 JWTs whose subject is the user id.

mod jwt;

pub use jwt::{generate_access_token, get_user_id_from_claims, verify_token, Claims, JwtError};
