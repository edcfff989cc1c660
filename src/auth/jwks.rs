//! JWKS cache for RS256 access-token verification

use anyhow::{Context, Result};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::Claims;

/// Minimum spacing between two JWKS fetches
const REFETCH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    n: String,
    e: String,
}

#[derive(Clone)]
struct CachedKey {
    key: DecodingKey,
    cached_at: Instant,
}

#[derive(Default)]
struct KeySet {
    keys: HashMap<String, CachedKey>,
    last_fetch: Option<Instant>,
}

impl KeySet {
    /// Stores every usable RSA key; returns how many were stored.
    fn ingest(&mut self, jwks: JwksResponse, now: Instant) -> usize {
        self.last_fetch = Some(now);
        let mut stored = 0;

        for jwk in jwks.keys {
            if jwk.kty != "RSA" {
                continue;
            }
            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    tracing::debug!(kid = %jwk.kid, "Cached JWKS key");
                    self.keys.insert(jwk.kid, CachedKey { key, cached_at: now });
                    stored += 1;
                }
                Err(e) => tracing::warn!(kid = %jwk.kid, error = %e, "Failed to parse JWK"),
            }
        }
        stored
    }

    fn fresh(&self, kid: &str, ttl: Duration) -> Option<DecodingKey> {
        self.keys
            .get(kid)
            .filter(|cached| cached.cached_at.elapsed() < ttl)
            .map(|cached| cached.key.clone())
    }
}

/// Verifies bearer tokens against the identity provider's published keys
#[derive(Clone)]
pub struct JwksCache {
    inner: Arc<RwLock<KeySet>>,
    http: reqwest::Client,
    jwks_url: String,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl JwksCache {
    pub fn new(jwks_url: String, issuer: String, audience: String, ttl_seconds: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            inner: Arc::new(RwLock::new(KeySet::default())),
            http,
            jwks_url,
            issuer,
            audience,
            ttl: Duration::from_secs(ttl_seconds),
        })
    }

    /// Verifies signature, issuer, audience, expiry and not-before.
    pub async fn verify_token(&self, token: &str) -> Result<Claims> {
        let header = decode_header(token).context("Invalid JWT header")?;
        let kid = header.kid.context("JWT missing kid header")?;
        let key = self.key_for(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.validate_nbf = true;

        let data = decode::<Claims>(token, &key, &validation).context("JWT validation failed")?;
        Ok(data.claims)
    }

    async fn key_for(&self, kid: &str) -> Result<DecodingKey> {
        if let Some(key) = self.inner.read().fresh(kid, self.ttl) {
            return Ok(key);
        }

        self.refresh().await?;

        self.inner
            .read()
            .fresh(kid, self.ttl)
            .context("Key not found in JWKS")
    }

    async fn refresh(&self) -> Result<()> {
        let recently_fetched = self
            .inner
            .read()
            .last_fetch
            .is_some_and(|last| last.elapsed() < REFETCH_INTERVAL);
        if recently_fetched {
            return Ok(());
        }

        tracing::debug!(url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .context("Failed to fetch JWKS")?;
        if !response.status().is_success() {
            anyhow::bail!("JWKS fetch failed with status: {}", response.status());
        }
        let jwks: JwksResponse = response.json().await.context("Failed to parse JWKS")?;

        let stored = self.inner.write().ingest(jwks, Instant::now());
        tracing::info!(keys = stored, "JWKS cache refreshed");
        Ok(())
    }

    /// Fetches keys ahead of the first request.
    pub async fn warm_cache(&self) -> Result<()> {
        self.refresh().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwk(kid: &str, kty: &str, n: &str) -> Jwk {
        Jwk {
            kid: kid.into(),
            kty: kty.into(),
            n: n.into(),
            e: "AQAB".into(),
        }
    }

    #[test]
    fn test_ingest_keeps_only_usable_rsa_keys() {
        let mut set = KeySet::default();
        let stored = set.ingest(
            JwksResponse {
                keys: vec![
                    jwk("rsa-1", "RSA", "AQAB"),
                    jwk("ec-1", "EC", "AQAB"),
                    jwk("broken", "RSA", "!!!"),
                ],
            },
            Instant::now(),
        );

        assert_eq!(stored, 1);
        assert!(set.fresh("rsa-1", Duration::from_secs(60)).is_some());
        assert!(set.fresh("ec-1", Duration::from_secs(60)).is_none());
        assert!(set.last_fetch.is_some());
    }

    #[test]
    fn test_expired_key_is_not_fresh() {
        let mut set = KeySet::default();
        set.ingest(
            JwksResponse {
                keys: vec![jwk("rsa-1", "RSA", "AQAB")],
            },
            Instant::now(),
        );
        assert!(set.fresh("rsa-1", Duration::ZERO).is_none());
    }
}
