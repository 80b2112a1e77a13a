//! Key derivation: which bucket a request's bytes are attributed to.
//!
//! Extraction works on the request head only ([`Parts`]), so the request body
//! is never touched and the request reaches the inner service unchanged.

use std::fmt::{Debug, Display};

use axum::http::{request::Parts, HeaderName};

use bytemeter_core::error::{BytemeterError, Result};

/// Derives a metering key from a request head.
pub trait KeyExtractor: Clone + Send + Sync + 'static {
    type Key: Debug + Send + 'static;

    fn extract(&self, parts: &Parts) -> Result<Self::Key>;
}

/// Any `Fn(&Parts) -> Result<K, E>` is a key extractor.
impl<F, K, E> KeyExtractor for F
where
    F: Fn(&Parts) -> std::result::Result<K, E> + Clone + Send + Sync + 'static,
    K: Debug + Send + 'static,
    E: Display,
{
    type Key = K;

    fn extract(&self, parts: &Parts) -> Result<K> {
        self(parts).map_err(|e| BytemeterError::KeyDerivation(e.to_string()))
    }
}

/// Key = value of a request header (client id, API key id, tenant, ...).
#[derive(Debug, Clone)]
pub struct HeaderKey {
    name: HeaderName,
}

impl HeaderKey {
    pub fn new(name: HeaderName) -> Self {
        Self { name }
    }

    /// Parse the header name from configuration.
    pub fn from_name(name: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| BytemeterError::Config(format!("invalid key header {name:?}: {e}")))?;
        Ok(Self::new(name))
    }

    pub fn header_name(&self) -> &HeaderName {
        &self.name
    }
}

impl KeyExtractor for HeaderKey {
    type Key = String;

    fn extract(&self, parts: &Parts) -> Result<String> {
        let value = parts
            .headers
            .get(&self.name)
            .ok_or_else(|| BytemeterError::KeyDerivation(format!("missing header {}", self.name)))?;
        let value = value.to_str().map_err(|_| {
            BytemeterError::KeyDerivation(format!("header {} is not visible ascii", self.name))
        })?;
        if value.is_empty() {
            return Err(BytemeterError::KeyDerivation(format!("header {} is empty", self.name)));
        }
        Ok(value.to_owned())
    }
}

/// Key = request path, for per-route accounting. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathKey;

impl KeyExtractor for PathKey {
    type Key = String;

    fn extract(&self, parts: &Parts) -> Result<String> {
        Ok(parts.uri.path().to_owned())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use axum::http::Request;
    use bytemeter_core::ErrorCode;

    use super::*;

    fn head(req: Request<()>) -> Parts {
        req.into_parts().0
    }

    #[test]
    fn header_key_reads_value() {
        let key = HeaderKey::from_name("x-client-id").unwrap();
        let parts = head(
            Request::builder()
                .uri("/a")
                .header("x-client-id", "alice")
                .body(())
                .unwrap(),
        );
        assert_eq!(key.extract(&parts).unwrap(), "alice");
    }

    #[test]
    fn header_key_missing_or_empty_fails() {
        let key = HeaderKey::from_name("x-client-id").unwrap();

        let missing = head(Request::builder().uri("/a").body(()).unwrap());
        let err = key.extract(&missing).unwrap_err();
        assert_eq!(err.code(), ErrorCode::KeyDerivation);

        let empty = head(Request::builder().header("x-client-id", "").body(()).unwrap());
        assert!(key.extract(&empty).is_err());
    }

    #[test]
    fn header_key_rejects_bad_names() {
        let err = HeaderKey::from_name("bad header").unwrap_err();
        assert_eq!(err.code(), ErrorCode::Config);
    }

    #[test]
    fn path_key_and_closures() {
        let parts = head(Request::builder().uri("/v1/echo/10?x=1").body(()).unwrap());
        assert_eq!(PathKey.extract(&parts).unwrap(), "/v1/echo/10");

        let by_method = |p: &Parts| -> std::result::Result<String, &'static str> {
            if p.method == axum::http::Method::GET {
                Ok("reads".to_owned())
            } else {
                Err("unmetered method")
            }
        };
        assert_eq!(by_method.extract(&parts).unwrap(), "reads");

        let post = head(Request::builder().method("POST").body(()).unwrap());
        let err = by_method.extract(&post).unwrap_err();
        assert_eq!(err.to_string(), "key derivation failed: unmetered method");
    }
}
