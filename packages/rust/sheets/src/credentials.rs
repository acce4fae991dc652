//! Service-account credentials and the signed JWT bearer assertion.
//!
//! Google's server-to-server OAuth flow: the key file holds an RSA private
//! key (PEM, PKCS#8). We sign an RS256 JWT naming the account, the scope and
//! the token endpoint, then trade it at `token_uri` for an access token.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use clubfeed_shared::{ClubfeedError, Result};
use ring::rand::SystemRandom;
use ring::signature::{RSA_PKCS1_SHA256, RsaKeyPair};
use serde::{Deserialize, Serialize};

/// Read-only access to spreadsheet values.
pub const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

/// Lifetime requested for each assertion, in seconds. Google caps it at one hour.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// The fields of a service-account key file we use.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
}

#[derive(Serialize)]
struct Header<'a> {
    alg: &'static str,
    typ: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    kid: Option<&'a str>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct Claims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl ServiceAccountKey {
    /// Load and parse a key file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ClubfeedError::io(path, e))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| ClubfeedError::Auth(format!("invalid service-account key: {e}")))
    }

    /// Build a signed JWT assertion issued at `now` (unix seconds).
    pub fn assertion(&self, now: i64) -> Result<String> {
        let key_pair = self.key_pair()?;

        let header = Header {
            alg: "RS256",
            typ: "JWT",
            kid: self.private_key_id.as_deref(),
        };
        let claims = Claims {
            iss: self.client_email.clone(),
            scope: SHEETS_READONLY_SCOPE.to_string(),
            aud: self.token_uri.clone(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let signing_input = format!("{}.{}", encode_part(&header)?, encode_part(&claims)?);

        let mut signature = vec![0; key_pair.public().modulus_len()];
        key_pair
            .sign(
                &RSA_PKCS1_SHA256,
                &SystemRandom::new(),
                signing_input.as_bytes(),
                &mut signature,
            )
            .map_err(|_| ClubfeedError::Auth("failed to sign assertion".into()))?;

        Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature)))
    }

    fn key_pair(&self) -> Result<RsaKeyPair> {
        let der = pem_to_der(&self.private_key)?;
        RsaKeyPair::from_pkcs8(&der)
            .map_err(|e| ClubfeedError::Auth(format!("rejected private key: {e}")))
    }
}

fn encode_part<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_vec(value)
        .map_err(|e| ClubfeedError::Auth(format!("failed to encode JWT: {e}")))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Strip the armour lines of a PEM block and decode the body.
fn pem_to_der(pem: &str) -> Result<Vec<u8>> {
    let body: String = pem
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("-----"))
        .collect();
    if body.is_empty() {
        return Err(ClubfeedError::Auth("private key is empty".into()));
    }
    STANDARD
        .decode(body)
        .map_err(|e| ClubfeedError::Auth(format!("private key is not valid base64: {e}")))
}
