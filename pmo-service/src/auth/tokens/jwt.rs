//! JWT session tokens
//!
//! Signing and validation share one configuration: HS* uses `secret` for
//! both, RS*/ES* sign with `key_path` and validate with `public_key_path`.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::config::TokenConfig;
use crate::error::Error;
use crate::repository::EmployeeIdentity;

use super::{SessionClaims, SessionIssuer};

/// Signs and validates [`SessionClaims`] as JWTs
#[derive(Clone)]
pub struct JwtIssuer {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Validation,
    algorithm: Algorithm,
    lifetime: Duration,
    issuer: Option<String>,
    audience: Option<String>,
}

impl std::fmt::Debug for JwtIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIssuer")
            .field("algorithm", &self.algorithm)
            .field("lifetime", &self.lifetime)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

impl JwtIssuer {
    /// Create an issuer from configuration
    ///
    /// HS* algorithms sign with `secret`; RS*/ES* read a PEM key from
    /// `key_path`.
    pub fn new(config: &TokenConfig) -> Result<Self, Error> {
        let algorithm = parse_algorithm(&config.algorithm)?;

        let (private_bytes, public_bytes) = match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                let secret = config
                    .secret
                    .as_ref()
                    .filter(|s| !s.is_empty())
                    .map(|s| s.as_bytes().to_vec())
                    .ok_or_else(|| {
                        config_error(format!("tokens.secret is required for {:?}", algorithm))
                    })?;
                (secret.clone(), secret)
            }
            _ => {
                let private = read_key(config.key_path.as_deref(), "key_path", "private", algorithm)?;
                let public = read_key(
                    config.public_key_path.as_deref(),
                    "public_key_path",
                    "public",
                    algorithm,
                )?;
                (private, public)
            }
        };

        let encoding_key = create_encoding_key(&private_bytes, algorithm)?;
        let decoding_key = create_decoding_key(&public_bytes, algorithm)?;

        let mut validation = Validation::new(algorithm);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        if let Some(audience) = &config.audience {
            validation.set_audience(&[audience]);
        }

        Ok(Self {
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            validation,
            algorithm,
            lifetime: Duration::from_secs(config.lifetime_secs),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        })
    }

    /// Sign arbitrary claims, filling issuer and audience from configuration
    pub fn sign(&self, claims: &SessionClaims) -> Result<String, Error> {
        let mut claims = claims.clone();
        if claims.iss.is_none() {
            claims.iss = self.issuer.clone();
        }
        if claims.aud.is_none() {
            claims.aud = self.audience.clone();
        }
        let header = Header::new(self.algorithm);
        encode(&header, &claims, &self.encoding_key).map_err(Error::from)
    }
}

impl SessionIssuer for JwtIssuer {
    fn issue(&self, identity: &EmployeeIdentity) -> Result<String, Error> {
        let claims = SessionClaims::for_identity(identity, Utc::now().timestamp(), self.lifetime);
        self.sign(&claims)
    }

    fn validate(&self, token: &str) -> Result<SessionClaims, Error> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Session token rejected");
                Error::Unauthorized("Invalid or expired session token".to_string())
            })
    }

    fn lifetime(&self) -> Duration {
        self.lifetime
    }
}

fn config_error(message: String) -> Error {
    Error::Config(Box::new(figment::Error::from(message)))
}

fn read_key(
    path: Option<&Path>,
    field: &str,
    kind: &str,
    algorithm: Algorithm,
) -> Result<Vec<u8>, Error> {
    let path = path
        .ok_or_else(|| config_error(format!("tokens.{} is required for {:?}", field, algorithm)))?;
    fs::read(path).map_err(|e| {
        config_error(format!(
            "Failed to read JWT {} key '{}': {}",
            kind,
            path.display(),
            e
        ))
    })
}

fn parse_algorithm(alg: &str) -> Result<Algorithm, Error> {
    match alg.to_uppercase().as_str() {
        "RS256" => Ok(Algorithm::RS256),
        "RS384" => Ok(Algorithm::RS384),
        "RS512" => Ok(Algorithm::RS512),
        "ES256" => Ok(Algorithm::ES256),
        "ES384" => Ok(Algorithm::ES384),
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        _ => Err(config_error(format!("Unsupported JWT algorithm: {}", alg))),
    }
}

fn create_encoding_key(key_bytes: &[u8], algorithm: Algorithm) -> Result<EncodingKey, Error> {
    match algorithm {
        Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => {
            EncodingKey::from_rsa_pem(key_bytes).map_err(Error::from)
        }
        Algorithm::ES256 | Algorithm::ES384 => {
            EncodingKey::from_ec_pem(key_bytes).map_err(Error::from)
        }
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            Ok(EncodingKey::from_secret(key_bytes))
        }
        _ => Err(config_error(
            "Unsupported algorithm for key creation".to_string(),
        )),
    }
}

fn create_decoding_key(key_bytes: &[u8], algorithm: Algorithm) -> Result<DecodingKey, Error> {
    match algorithm {
        Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => {
            DecodingKey::from_rsa_pem(key_bytes).map_err(Error::from)
        }
        Algorithm::ES256 | Algorithm::ES384 => {
            DecodingKey::from_ec_pem(key_bytes).map_err(Error::from)
        }
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            Ok(DecodingKey::from_secret(key_bytes))
        }
        _ => Err(config_error(
            "Unsupported algorithm for key creation".to_string(),
        )),
    }
}
