// Shared-secret extraction for the sync endpoint. The comparison itself
// happens in `SyncRunner::authorize` so every entry point is gated the same way.

use actix_web::HttpRequest;

use crate::api::models::SyncRequest;

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Secret presented by the caller: bearer header first, then the body's
/// `password`. Missing secrets become an empty string, which never matches.
pub fn presented_secret(req: &HttpRequest, body: Option<&SyncRequest>) -> String {
    bearer_token(req)
        .map(str::to_string)
        .or_else(|| body.and_then(|b| b.password.clone()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn prefers_bearer_header() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer from-header"))
            .to_http_request();
        let body = SyncRequest {
            password: Some("from-body".into()),
            dry_run: false,
        };
        assert_eq!(presented_secret(&req, Some(&body)), "from-header");
    }

    #[test]
    fn falls_back_to_body_password() {
        let req = TestRequest::default().to_http_request();
        let body = SyncRequest {
            password: Some("from-body".into()),
            dry_run: false,
        };
        assert_eq!(presented_secret(&req, Some(&body)), "from-body");
        assert_eq!(presented_secret(&req, None), "");
    }

    #[test]
    fn ignores_non_bearer_schemes() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Basic abc"))
            .to_http_request();
        assert_eq!(bearer_token(&req), None);
    }
}
