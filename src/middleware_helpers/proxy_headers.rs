use axum::{
    extract::Request,
    http::{
        header::{HeaderName, HeaderValue, HOST},
        HeaderMap,
    },
    middleware::Next,
    response::Response,
};

/// Scheme reported by a trusted reverse proxy via `X-Forwarded-Proto`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForwardedScheme(pub String);

/// Original client IP reported via `X-Forwarded-For` (first entry).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientIp(pub String);

const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

fn first_value(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Honors `X-Forwarded-*` headers set by a trusted reverse proxy.
///
/// Only mount this behind a proxy that sets these headers; a client talking
/// to the service directly could otherwise spoof its origin.
pub async fn proxy_headers_middleware(mut request: Request, next: Next) -> Response {
    let headers = request.headers().clone();

    if let Some(proto) = first_value(&headers, &X_FORWARDED_PROTO) {
        request.extensions_mut().insert(ForwardedScheme(proto));
    }

    if let Some(host) = first_value(&headers, &X_FORWARDED_HOST) {
        if let Ok(value) = HeaderValue::from_str(&host) {
            request.headers_mut().insert(HOST, value);
        }
    }

    if let Some(client_ip) = first_value(&headers, &X_FORWARDED_FOR) {
        request.extensions_mut().insert(ClientIp(client_ip));
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        extract::Extension,
        http::{Request as HttpRequest, StatusCode},
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn echo_handler(
        Extension(scheme): Extension<ForwardedScheme>,
        Extension(ip): Extension<ClientIp>,
        headers: HeaderMap,
    ) -> (StatusCode, String) {
        let host = headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        (StatusCode::OK, format!("{}|{}|{}", scheme.0, ip.0, host))
    }

    #[tokio::test]
    async fn forwarded_headers_are_applied() {
        let app = Router::new()
            .route("/", get(echo_handler))
            .layer(axum::middleware::from_fn(proxy_headers_middleware));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/")
                    .header(HOST, "internal:8080")
                    .header("x-forwarded-proto", "https")
                    .header("x-forwarded-host", "shop.example.com")
                    .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(
            String::from_utf8(body.to_vec()).unwrap(),
            "https|203.0.113.7|shop.example.com"
        );
    }
}
