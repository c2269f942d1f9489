use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::{Claims, TokenPurpose};
use crate::{config::AppConfig, error::AuthError};

#[derive(Clone)]
pub struct JwtKeys {
    pub enc: EncodingKey,
    pub dec: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            enc: EncodingKey::from_secret(secret),
            dec: DecodingKey::from_secret(secret),
        }
    }
}

pub fn now_unix() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs() as usize
}

/// Signs and validates purpose-tagged JWTs. Holds only keys and lifetimes;
/// revocation state lives in the credential store.
#[derive(Clone)]
pub struct TokenService {
    keys: JwtKeys,
    access_ttl_secs: usize,
    refresh_ttl_secs: usize,
    email_ttl_secs: usize,
}

impl TokenService {
    pub fn new(
        keys: JwtKeys,
        access_ttl_secs: usize,
        refresh_ttl_secs: usize,
        email_ttl_secs: usize,
    ) -> Self {
        Self {
            keys,
            access_ttl_secs,
            refresh_ttl_secs,
            email_ttl_secs,
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(
            JwtKeys::from_secret(cfg.jwt_secret.as_bytes()),
            cfg.access_ttl_secs,
            cfg.refresh_ttl_secs,
            cfg.email_ttl_secs,
        )
    }

    pub fn access_ttl_secs(&self) -> usize {
        self.access_ttl_secs
    }

    pub fn issue(&self, subject: &str, purpose: TokenPurpose) -> Result<String, AuthError> {
        let ttl = match purpose {
            TokenPurpose::Access => self.access_ttl_secs,
            TokenPurpose::Refresh => self.refresh_ttl_secs,
            TokenPurpose::Email => self.email_ttl_secs,
        };
        let iat = now_unix();
        let claims = Claims {
            sub: subject.to_string(),
            iat,
            exp: iat + ttl,
            // rotation depends on every minted token being distinct, even
            // two issues for the same subject within one clock second
            jti: uuid::Uuid::new_v4(),
            scope: purpose,
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".into());

        encode(&header, &claims, &self.keys.enc).map_err(|err| {
            tracing::error!("token encoding failed: {err}");
            AuthError::InvalidCredentials
        })
    }

    /// Verifies signature and expiry and checks the purpose tag, returning
    /// the bound subject. Every failure mode collapses to the same error so
    /// callers cannot distinguish expired from malformed tokens.
    pub fn validate(&self, token: &str, expected: TokenPurpose) -> Result<String, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let data = decode::<Claims>(token, &self.keys.dec, &validation)
            .map_err(|_| AuthError::InvalidCredentials)?;

        if data.claims.scope != expected {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::{TokenPurpose, TokenService};
    use crate::error::AuthError;

    fn service() -> TokenService {
        TokenService::new(
            super::JwtKeys::from_secret(b"unit-test-secret"),
            900,
            3600,
            600,
        )
    }

    #[test]
    fn issued_access_token_validates_with_matching_purpose() {
        let tokens = service();
        let token = tokens
            .issue("alice@example.com", TokenPurpose::Access)
            .expect("token should encode");

        let subject = tokens
            .validate(&token, TokenPurpose::Access)
            .expect("token should validate");
        assert_eq!(subject, "alice@example.com");
    }

    #[test]
    fn refresh_token_is_rejected_as_access_token() {
        let tokens = service();
        let refresh = tokens
            .issue("alice@example.com", TokenPurpose::Refresh)
            .unwrap();

        assert_eq!(
            tokens.validate(&refresh, TokenPurpose::Access),
            Err(AuthError::InvalidCredentials)
        );
        // and the other way around
        let access = tokens
            .issue("alice@example.com", TokenPurpose::Access)
            .unwrap();
        assert_eq!(
            tokens.validate(&access, TokenPurpose::Refresh),
            Err(AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn back_to_back_issues_mint_distinct_tokens() {
        let tokens = service();
        // same subject, same purpose, same clock second
        let first = tokens
            .issue("alice@example.com", TokenPurpose::Refresh)
            .unwrap();
        let second = tokens
            .issue("alice@example.com", TokenPurpose::Refresh)
            .unwrap();
        assert_ne!(first, second);

        // both still validate for the same subject
        assert_eq!(
            tokens.validate(&first, TokenPurpose::Refresh).unwrap(),
            tokens.validate(&second, TokenPurpose::Refresh).unwrap()
        );
    }

    #[test]
    fn garbage_and_foreign_key_tokens_fail_uniformly() {
        let tokens = service();
        assert_eq!(
            tokens.validate("not-a-token", TokenPurpose::Access),
            Err(AuthError::InvalidCredentials)
        );

        let other = TokenService::new(
            super::JwtKeys::from_secret(b"different-secret"),
            900,
            3600,
            600,
        );
        let foreign = other.issue("alice@example.com", TokenPurpose::Access).unwrap();
        assert_eq!(
            tokens.validate(&foreign, TokenPurpose::Access),
            Err(AuthError::InvalidCredentials)
        );
    }
}
