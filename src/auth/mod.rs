//! Authentication and authorization for Wilbe
//!
//! Provides:
//! - JWT token generation and validation
//! - Role ladder for route authorization
//! - Password hashing with Argon2

pub mod jwt;
pub mod password;
pub mod roles;

pub use jwt::{extract_token_from_header, Claims, JwtValidator, TokenValidationResult};
pub use password::{hash_password, validate_new_password, verify_password};
pub use roles::{is_operation_allowed, required_role, AdminOperation, Role};
