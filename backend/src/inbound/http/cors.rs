//! Cross-origin policy for the browser form clients.
//!
//! Two kinds of origin are accepted: the configured development origin
//! (exact scheme, host and port) and HTTPS subdomains of the static hosting
//! domain the forms are deployed to. The bare hosting domain itself is not
//! accepted.

use actix_cors::Cors;
use actix_web::http::header::{self, HeaderName, HeaderValue};
use url::Url;

use crate::domain::TRACE_ID_HEADER;
use crate::inbound::http::idempotency::{IDEMPOTENCY_KEY_HEADER, REPLAYED_HEADER};

/// Development origin used when none is configured.
pub const DEFAULT_DEV_ORIGIN: &str = "http://localhost:5173";

/// Static hosting domain used when none is configured.
pub const DEFAULT_STATIC_HOST_DOMAIN: &str = "netlify.app";

const PREFLIGHT_MAX_AGE_SECS: usize = 3600;

/// Origin allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    dev_origin: Option<Url>,
    static_host_suffix: String,
}

impl CorsPolicy {
    /// Build a policy. An unparseable development origin disables that
    /// entry rather than failing.
    pub fn new(dev_origin: &str, static_host_domain: &str) -> Self {
        let domain = static_host_domain.trim().trim_start_matches('.').to_ascii_lowercase();
        Self {
            dev_origin: Url::parse(dev_origin).ok(),
            static_host_suffix: format!(".{domain}"),
        }
    }

    /// Whether a browser at `origin` may call the API.
    pub fn allows(&self, origin: &str) -> bool {
        let Ok(origin) = Url::parse(origin) else {
            return false;
        };

        if self
            .dev_origin
            .as_ref()
            .is_some_and(|dev| dev.origin() == origin.origin())
        {
            return true;
        }

        let Some(host) = origin.host_str() else {
            return false;
        };
        origin.scheme() == "https"
            && host
                .strip_suffix(self.static_host_suffix.as_str())
                .is_some_and(|label| !label.is_empty())
    }

    fn allows_header(&self, origin: &HeaderValue) -> bool {
        origin.to_str().is_ok_and(|value| self.allows(value))
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_DEV_ORIGIN, DEFAULT_STATIC_HOST_DOMAIN)
    }
}

/// Build the CORS middleware for `policy`.
pub fn build_cors(policy: CorsPolicy) -> Cors {
    Cors::default()
        .allowed_origin_fn(move |origin, _head| policy.allows_header(origin))
        .allowed_methods(["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(IDEMPOTENCY_KEY_HEADER),
        ])
        .expose_headers([
            HeaderName::from_static(TRACE_ID_HEADER),
            HeaderName::from_static(REPLAYED_HEADER),
        ])
        .max_age(PREFLIGHT_MAX_AGE_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, http::StatusCode, test as actix_test, web};
    use rstest::rstest;

    #[rstest]
    #[case("http://localhost:5173")]
    #[case("https://forms.netlify.app")]
    #[case("https://deploy-preview-12--forms.netlify.app")]
    fn accepts_configured_origins(#[case] origin: &str) {
        assert!(CorsPolicy::default().allows(origin));
    }

    #[rstest]
    #[case("http://localhost:3000")]
    #[case("https://localhost:5173")]
    #[case("https://netlify.app")]
    #[case("http://forms.netlify.app")]
    #[case("https://forms.netlify.app.evil.example")]
    #[case("https://evilnetlify.app")]
    #[case("null")]
    fn rejects_other_origins(#[case] origin: &str) {
        assert!(!CorsPolicy::default().allows(origin));
    }

    #[rstest]
    fn honours_custom_configuration() {
        let policy = CorsPolicy::new("http://127.0.0.1:8081", "pages.example");
        assert!(policy.allows("http://127.0.0.1:8081"));
        assert!(policy.allows("https://qa.pages.example"));
        assert!(!policy.allows("https://forms.netlify.app"));
    }

    async fn preflight(
        origin: &str,
        method: &str,
    ) -> actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody> {
        let app = actix_test::init_service(
            App::new()
                .wrap(build_cors(CorsPolicy::default()))
                .route("/api/reports", web::put().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;
        let req = actix_test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/api/reports")
            .insert_header((header::ORIGIN, origin))
            .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, method))
            .insert_header((header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type"))
            .to_request();
        actix_test::call_service(&app, req).await
    }

    #[actix_web::test]
    async fn preflight_from_allowed_origin_succeeds() {
        let res = preflight("https://forms.netlify.app", "PUT").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("https://forms.netlify.app")
        );
    }

    #[actix_web::test]
    async fn preflight_from_unknown_origin_is_not_granted() {
        let res = preflight("https://example.com", "POST").await;
        assert!(res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }
}
