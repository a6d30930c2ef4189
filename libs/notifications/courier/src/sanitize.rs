//! HTML sanitization for outbound bodies.

/// Strip anything unsafe from `html` using an allowlist suitable for
/// user-generated content.
///
/// Every HTML body goes through this before it reaches a provider, whatever
/// its origin.
pub fn sanitize_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    ammonia::clean(html)
}
