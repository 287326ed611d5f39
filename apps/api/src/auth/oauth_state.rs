//! Self-verifying OAuth `state` values.
//!
//! A state binds an authorization redirect to the user who requested it and
//! the time it was issued. Nothing is stored server-side: verification
//! recomputes the MAC and checks the age. A state can be replayed until it
//! expires.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::errors::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Oldest state accepted by `verify`.
pub const MAX_STATE_AGE_MINUTES: i64 = 10;
/// Tolerated clock skew for states stamped slightly in the future.
const MAX_FUTURE_SKEW_SECONDS: i64 = 60;

#[derive(Clone)]
pub struct StateSigner {
    secret: Vec<u8>,
}

impl StateSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    pub fn issue(&self, user_id: Uuid) -> String {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: Uuid, issued_at: DateTime<Utc>) -> String {
        let payload = format!("{user_id}:{}", issued_at.timestamp_millis());
        let signature = hex::encode(self.mac(payload.as_bytes()).finalize().into_bytes());
        format!("{}.{signature}", URL_SAFE_NO_PAD.encode(payload))
    }

    pub fn verify(&self, state: &str, user_id: Uuid) -> Result<(), AppError> {
        self.verify_at(state, user_id, Utc::now())
    }

    pub fn verify_at(&self, state: &str, user_id: Uuid, now: DateTime<Utc>) -> Result<(), AppError> {
        let (encoded, signature) = state
            .split_once('.')
            .ok_or_else(|| invalid("malformed state"))?;

        let payload = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| invalid("state payload is not base64"))?;
        let signature = hex::decode(signature).map_err(|_| invalid("state signature is not hex"))?;

        self.mac(&payload)
            .verify_slice(&signature)
            .map_err(|_| invalid("state signature mismatch"))?;

        let payload = String::from_utf8(payload).map_err(|_| invalid("state payload is not utf-8"))?;
        let (state_user, issued_ms) = payload
            .split_once(':')
            .ok_or_else(|| invalid("malformed state payload"))?;

        if state_user != user_id.to_string() {
            return Err(invalid("state was issued to a different user"));
        }

        let issued_at = issued_ms
            .parse::<i64>()
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .ok_or_else(|| invalid("state timestamp is invalid"))?;

        let age = now - issued_at;
        if age > Duration::minutes(MAX_STATE_AGE_MINUTES) {
            return Err(invalid("state has expired"));
        }
        if age < -Duration::seconds(MAX_FUTURE_SKEW_SECONDS) {
            return Err(invalid("state was issued in the future"));
        }

        Ok(())
    }

    fn mac(&self, payload: &[u8]) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
        mac.update(payload);
        mac
    }
}

fn invalid(detail: &str) -> AppError {
    AppError::InvalidState(detail.to_string())
}
