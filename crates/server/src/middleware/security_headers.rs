//! Security headers middleware.
//!
//! The pages load the Supabase and PayPal browser SDKs, show ingredient photos
//! as `data:` URLs, and use the camera, so the policy allows exactly those and
//! nothing else.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

/// Content Security Policy applied to every response.
pub const CONTENT_SECURITY_POLICY_VALUE: &str = "default-src 'none'; \
     script-src 'self' https://www.paypal.com https://cdn.jsdelivr.net; \
     style-src 'self'; \
     font-src 'self'; \
     img-src 'self' data: blob: https://*.paypalobjects.com; \
     media-src 'self' blob:; \
     connect-src 'self' https://*.supabase.co https://www.paypal.com; \
     frame-src https://www.paypal.com https://www.sandbox.paypal.com; \
     object-src 'none'; \
     base-uri 'self'; \
     form-action 'self'; \
     frame-ancestors 'none'";

/// Camera for ingredient capture and payment for checkout; everything else off.
pub const PERMISSIONS_POLICY_VALUE: &str = "camera=(self), \
     payment=(self \"https://www.paypal.com\"), \
     microphone=(), \
     geolocation=(), \
     usb=(), \
     serial=(), \
     hid=(), \
     display-capture=(), \
     browsing-topics=(), \
     interest-cohort=()";

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: strict-origin-when-cross-origin` (PayPal checkout needs the origin)
/// - `Content-Security-Policy` (see [`CONTENT_SECURITY_POLICY_VALUE`])
/// - `Permissions-Policy` (see [`PERMISSIONS_POLICY_VALUE`])
/// - `Cache-Control: no-store` unless the handler already set one
/// - `Cross-Origin-Opener-Policy: same-origin-allow-popups` (PayPal opens a popup)
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY_POLICY_VALUE),
    );
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(PERMISSIONS_POLICY_VALUE),
    );

    // Recipes and drafts are per-user
    if !headers.contains_key(CACHE_CONTROL) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin-allow-popups"),
    );

    response
}
