use chrono::Duration;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{auth::{claims::TokenClaims, errors::AuthError}, models::UserRole};

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expires_in: Duration,
}

impl JwtService {
    /// `expires_in` accepts `30s`, `15m`, `24h`, `7d` or a bare number of hours.
    pub fn new(secret: &str, expires_in: &str) -> Result<Self, AuthError> {
        let secret = secret.as_bytes();
        let expires_in = parse_duration(expires_in)
            .ok_or_else(|| AuthError::Internal(format!("invalid token lifetime: {}", expires_in)))?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::default(),
            expires_in,
        })
    }

    pub fn encode_token(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Failed to encode JWT: {}", e)))
    }

    pub fn decode_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            })
    }

    pub fn create_token_for_user(&self, user_id: Uuid, email: String, role: UserRole) -> Result<String, AuthError> {
        let claims = TokenClaims::new(user_id, email, role, self.expires_in);
        self.encode_token(&claims)
    }
}

fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let (number, unit) = match value.char_indices().last()? {
        (idx, c) if c.is_ascii_alphabetic() => (&value[..idx], c),
        _ => (value, 'h'),
    };
    let amount: i64 = number.parse().ok().filter(|n| *n > 0)?;

    match unit {
        's' => Some(Duration::seconds(amount)),
        'm' => Some(Duration::minutes(amount)),
        'h' => Some(Duration::hours(amount)),
        'd' => Some(Duration::days(amount)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-for-jwt-authentication";

    #[test]
    fn lifetimes_parse_with_units() {
        assert_eq!(parse_duration("30s"), Some(Duration::seconds(30)));
        assert_eq!(parse_duration("15m"), Some(Duration::minutes(15)));
        assert_eq!(parse_duration("24h"), Some(Duration::hours(24)));
        assert_eq!(parse_duration("7d"), Some(Duration::days(7)));
        assert_eq!(parse_duration("12"), Some(Duration::hours(12)));
        assert_eq!(parse_duration("0h"), None);
        assert_eq!(parse_duration("1w"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn token_round_trip_keeps_subject_and_role() {
        let service = JwtService::new(SECRET, "1h").unwrap();
        let user_id = Uuid::new_v4();

        let token = service
            .create_token_for_user(user_id, "jane@example.com".into(), UserRole::Admin)
            .unwrap();
        let claims = service.decode_token(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, UserRole::Admin);
        assert!(!claims.is_expired());
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let issuer = JwtService::new("another-secret-key-entirely-0000", "1h").unwrap();
        let verifier = JwtService::new(SECRET, "1h").unwrap();

        let token = issuer
            .create_token_for_user(Uuid::new_v4(), "x@example.com".into(), UserRole::User)
            .unwrap();

        assert!(matches!(verifier.decode_token(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let service = JwtService::new(SECRET, "1h").unwrap();
        let mut claims = TokenClaims::new(Uuid::new_v4(), "x@example.com".into(), UserRole::User, Duration::hours(1));
        claims.iat -= 7200;
        claims.exp -= 7200;

        let token = service.encode_token(&claims).unwrap();
        assert!(matches!(service.decode_token(&token), Err(AuthError::TokenExpired)));
    }
}
