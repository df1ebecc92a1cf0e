//! Access token issuance and verification.

pub mod jwt;
pub mod service;

pub use jwt::{
    AccessTokenClaims, IssuedToken, JwtError, Jwk, Jwks, SigningAlgorithm, SigningKey,
    TokenIssuer, TokenVerifier,
};
pub use service::TokenService;
