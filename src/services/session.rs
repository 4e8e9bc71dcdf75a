// src/services/session.rs

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::common::error::AppError;

// As claims do token de sessão emitido pelo provedor de identidade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String, // ID do usuário no provedor
    pub exp: usize,
    #[serde(default)]
    pub iat: Option<usize>,
}

/// Verifica os tokens de sessão. RS256 (chave pública PEM) em produção,
/// HS256 (segredo compartilhado) em desenvolvimento e testes.
#[derive(Clone)]
pub struct SessionVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl SessionVerifier {
    pub fn from_rsa_pem(pem: &str) -> anyhow::Result<Self> {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())?;
        Ok(Self::with_algorithm(key, Algorithm::RS256))
    }

    pub fn from_secret(secret: &str) -> Self {
        Self::with_algorithm(DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
    }

    fn with_algorithm(key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        // Tokens do Clerk não trazem `aud`
        validation.validate_aud = false;
        Self { key, validation }
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, AppError> {
        let data = decode::<SessionClaims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!("Token de sessão rejeitado: {}", e);
            AppError::InvalidToken
        })?;

        if data.claims.sub.trim().is_empty() {
            return Err(AppError::InvalidToken);
        }
        Ok(data.claims)
    }
}
