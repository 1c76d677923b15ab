//! Bearer token issuing and verification together with the resolution of the
//! calling principal.
//!
//! Tokens are HS256 JSON web tokens: `header.claims.signature`, each part
//! base64url encoded without padding.
use crate::error::JobsiteError;
use crate::repository::company_repository::CompanyRepository;
use crate::repository::contractor_repository::ContractorRepository;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

const JWT_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Contractor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Id of the admin or contractor row
    pub sub: i64,
    pub company_id: i64,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Deserialize)]
struct Header {
    alg: String,
}

pub struct TokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenSigner {
    #[must_use]
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        TokenSigner {
            secret: secret.as_bytes().to_vec(),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Issues a token for `subject` which expires after the configured time to live
    ///
    /// # Errors
    /// Returns an error if the claims can not be serialized or the key is rejected
    pub fn issue(&self, role: Role, subject: i64, company_id: i64) -> Result<String, JobsiteError> {
        self.issue_at(role, subject, company_id, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        role: Role,
        subject: i64,
        company_id: i64,
        now: DateTime<Utc>,
    ) -> Result<String, JobsiteError> {
        let claims = Claims {
            sub: subject,
            company_id,
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let header = URL_SAFE_NO_PAD.encode(JWT_HEADER);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signing_input = format!("{header}.{payload}");
        let signature = URL_SAFE_NO_PAD.encode(self.sign(&signing_input)?);
        Ok(format!("{signing_input}.{signature}"))
    }

    /// Verifies signature, algorithm and expiry of the token and returns its claims
    ///
    /// # Errors
    /// Returns `JobsiteError::InvalidToken` if any of the checks fails
    pub fn verify(&self, token: &str) -> Result<Claims, JobsiteError> {
        self.verify_at(token, Utc::now())
    }

    pub(crate) fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, JobsiteError> {
        let parts: Vec<&str> = token.trim().split('.').collect();
        let [header, payload, signature] = parts.as_slice() else {
            return Err(JobsiteError::InvalidToken("malformed token".to_string()));
        };

        let header: Header = decode_part(header)?;
        if header.alg != "HS256" {
            return Err(JobsiteError::InvalidToken(format!(
                "unsupported algorithm {}",
                header.alg
            )));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|e| JobsiteError::InvalidToken(e.to_string()))?;
        let mut mac = self.mac()?;
        mac.update(format!("{}.{payload}", parts[0]).as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| JobsiteError::InvalidToken("signature mismatch".to_string()))?;

        let claims: Claims = decode_part(payload)?;
        if claims.exp <= now.timestamp() {
            return Err(JobsiteError::InvalidToken("token expired".to_string()));
        }
        Ok(claims)
    }

    fn mac(&self) -> Result<HmacSha256, JobsiteError> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| JobsiteError::InvalidToken(e.to_string()))
    }

    fn sign(&self, input: &str) -> Result<Vec<u8>, JobsiteError> {
        let mut mac = self.mac()?;
        mac.update(input.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

fn decode_part<T: for<'de> Deserialize<'de>>(part: &str) -> Result<T, JobsiteError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(part)
        .map_err(|e| JobsiteError::InvalidToken(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| JobsiteError::InvalidToken(e.to_string()))
}

/// Returns the value of the cookie `name` from a `Cookie` request header
#[must_use]
pub fn parse_cookie(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// The tokens a request carries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenCandidates {
    pub bearer: Option<String>,
    pub admin_cookie: Option<String>,
    pub user_cookie: Option<String>,
}

impl TokenCandidates {
    /// Collects tokens from the `Authorization` and `Cookie` header values
    #[must_use]
    pub fn from_headers(
        authorization: Option<&str>,
        cookie: Option<&str>,
        admin_cookie_name: &str,
        user_cookie_name: &str,
    ) -> Self {
        let bearer = authorization
            .and_then(|value| value.trim().strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());
        TokenCandidates {
            bearer,
            admin_cookie: cookie.and_then(|c| parse_cookie(c, admin_cookie_name)),
            user_cookie: cookie.and_then(|c| parse_cookie(c, user_cookie_name)),
        }
    }
}

/// The authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    Admin { admin_id: i64, company_id: i64 },
    Contractor { contractor_id: i64, company_id: i64 },
}

impl Principal {
    #[must_use]
    pub fn company_id(&self) -> i64 {
        match self {
            Principal::Admin { company_id, .. } | Principal::Contractor { company_id, .. } => {
                *company_id
            }
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Principal::Admin { .. })
    }

    #[must_use]
    pub fn contractor_id(&self) -> Option<i64> {
        match self {
            Principal::Contractor { contractor_id, .. } => Some(*contractor_id),
            Principal::Admin { .. } => None,
        }
    }

    /// Returns the admin id, or `Forbidden` for contractors
    ///
    /// # Errors
    /// Returns `JobsiteError::Forbidden` if the principal is not an admin
    pub fn require_admin(&self) -> Result<i64, JobsiteError> {
        match self {
            Principal::Admin { admin_id, .. } => Ok(*admin_id),
            Principal::Contractor { .. } => Err(JobsiteError::Forbidden(
                "Admin access required".to_string(),
            )),
        }
    }
}

/// Resolves request tokens into a `Principal`, admin tokens first
pub struct Authenticator {
    signer: TokenSigner,
    company_repo: Arc<dyn CompanyRepository>,
    contractor_repo: Arc<dyn ContractorRepository>,
}

impl Authenticator {
    pub fn new(
        signer: TokenSigner,
        company_repo: Arc<dyn CompanyRepository>,
        contractor_repo: Arc<dyn ContractorRepository>,
    ) -> Self {
        Self {
            signer,
            company_repo,
            contractor_repo,
        }
    }

    #[must_use]
    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// Mints a token for an existing admin or an active contractor, so that
    /// every issued token can authenticate
    ///
    /// # Errors
    /// `NotFound` for an unknown subject, `BadInput` for an inactive contractor
    pub fn issue_for(&self, role: Role, subject: i64, company_id: i64) -> Result<String, JobsiteError> {
        match role {
            Role::Admin => {
                self.company_repo
                    .find_admin(company_id, subject)?
                    .ok_or_else(|| JobsiteError::not_found("Admin", subject))?;
            }
            Role::Contractor => {
                let contractor = self
                    .contractor_repo
                    .find_by_id(company_id, subject)?
                    .ok_or_else(|| JobsiteError::not_found("Contractor", subject))?;
                if !contractor.active {
                    return Err(JobsiteError::BadInput(format!(
                        "Contractor {subject} is not active"
                    )));
                }
            }
        }
        self.signer.issue(role, subject, company_id)
    }

    /// # Errors
    /// Returns `JobsiteError::Unauthorized` when no candidate resolves to an
    /// existing admin or active contractor
    pub fn authenticate(&self, candidates: &TokenCandidates) -> Result<Principal, JobsiteError> {
        for token in [&candidates.bearer, &candidates.admin_cookie].into_iter().flatten() {
            if let Some(principal) = self.resolve_admin(token)? {
                return Ok(principal);
            }
        }
        for token in [&candidates.bearer, &candidates.user_cookie].into_iter().flatten() {
            if let Some(principal) = self.resolve_contractor(token)? {
                return Ok(principal);
            }
        }
        Err(JobsiteError::Unauthorized)
    }

    fn resolve_admin(&self, token: &str) -> Result<Option<Principal>, JobsiteError> {
        let Some(claims) = self.claims_with_role(token, Role::Admin) else {
            return Ok(None);
        };
        let admin = self.company_repo.find_admin(claims.company_id, claims.sub)?;
        Ok(admin.map(|admin| Principal::Admin {
            admin_id: admin.id,
            company_id: admin.company_id,
        }))
    }

    fn resolve_contractor(&self, token: &str) -> Result<Option<Principal>, JobsiteError> {
        let Some(claims) = self.claims_with_role(token, Role::Contractor) else {
            return Ok(None);
        };
        let contractor = self
            .contractor_repo
            .find_by_id(claims.company_id, claims.sub)?
            .filter(|c| c.active);
        Ok(contractor.map(|c| Principal::Contractor {
            contractor_id: c.id,
            company_id: c.company_id,
        }))
    }

    fn claims_with_role(&self, token: &str, role: Role) -> Option<Claims> {
        match self.signer.verify(token) {
            Ok(claims) if claims.role == role => Some(claims),
            Ok(_) => None,
            Err(e) => {
                debug!("Rejected token: {e}");
                None
            }
        }
    }
}
