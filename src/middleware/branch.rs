use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, Response},
};
use tower::{Layer, Service};

/// Cookie carrying the selected branch id
pub const BRANCH_COOKIE: &str = "selected_branch";

/// Configuration for the branch-selection middleware
#[derive(Clone)]
pub struct BranchCookieConfig {
    /// Cookie lifetime in days
    pub cookie_days: u64,
    /// Paths the middleware ignores (prefix matching)
    pub skip_paths: Vec<String>,
}

impl Default for BranchCookieConfig {
    fn default() -> Self {
        Self {
            cookie_days: 30,
            skip_paths: vec!["/health".to_string(), "/auth".to_string()],
        }
    }
}

/// Layer that persists a `?city=<id>` query parameter into the
/// branch-selection cookie on the response
#[derive(Clone)]
pub struct BranchCookieLayer {
    config: BranchCookieConfig,
}

impl BranchCookieLayer {
    pub fn new(config: BranchCookieConfig) -> Self {
        Self { config }
    }
}

impl<S> Layer<S> for BranchCookieLayer {
    type Service = BranchCookieMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BranchCookieMiddleware {
            inner,
            config: self.config.clone(),
        }
    }
}

/// Branch-selection middleware service
#[derive(Clone)]
pub struct BranchCookieMiddleware<S> {
    inner: S,
    config: BranchCookieConfig,
}

impl<S> Service<Request<Body>> for BranchCookieMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let path = req.uri().path().to_string();
        let city = req.uri().query().and_then(city_param);
        let config = self.config.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let skipped = config.skip_paths.iter().any(|p| path.starts_with(p));
            let mut response = inner.call(req).await?;

            if skipped {
                return Ok(response);
            }

            if let Some(city) = city {
                let cookie = format!(
                    "{}={}; Path=/; Max-Age={}; SameSite=Lax",
                    BRANCH_COOKIE,
                    city,
                    config.cookie_days * 24 * 60 * 60,
                );
                if let Ok(value) = HeaderValue::from_str(&cookie) {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
            }

            Ok(response)
        })
    }
}

/// Extract a `city` value from a raw query string. Only cookie-safe ids are
/// accepted (uuid-shaped: alphanumerics plus `-` and `_`).
fn city_param(query: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "city")
        .map(|(_, value)| value.to_string())
        .filter(|value| {
            !value.is_empty()
                && value
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_city_from_query() {
        assert_eq!(
            city_param("city=8e57e25d-8c9c-486d-b41d-ac96a2c1f4cc"),
            Some("8e57e25d-8c9c-486d-b41d-ac96a2c1f4cc".to_string())
        );
        assert_eq!(
            city_param("sizes=20,30&city=abc&priceTo=500"),
            Some("abc".to_string())
        );
    }

    #[test]
    fn rejects_missing_or_unsafe_values() {
        assert_eq!(city_param("sizes=20"), None);
        assert_eq!(city_param("city="), None);
        assert_eq!(city_param("city=a;b"), None);
        assert_eq!(city_param("city=a%20b"), None);
    }
}
