//! Authorize-URL construction and redirect parsing for the Notion OAuth
//! flow.

use oauth2::basic::BasicClient;
use oauth2::{AuthUrl, ClientId, CsrfToken, RedirectUrl};
use url::Url;

pub const NOTION_AUTHORIZE_URL: &str = "https://api.notion.com/v1/oauth/authorize";

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("invalid authorize url: {0}")]
    InvalidAuthUrl(String),
    #[error("invalid redirect url: {0}")]
    InvalidRedirectUrl(String),
}

/// The URL to open in the authorization window, plus the CSRF state the
/// redirect has to echo back.
#[derive(Debug, Clone)]
pub struct AuthorizeRequest {
    pub url: String,
    pub state: String,
}

/// Redirect target of the loopback listener on `port`.
pub fn loopback_redirect_url(port: u16) -> String {
    format!("http://127.0.0.1:{}/callback", port)
}

pub fn authorize_url(
    auth_url: &str,
    client_id: &str,
    redirect_url: &str,
) -> Result<AuthorizeRequest, OAuthError> {
    let auth_url = AuthUrl::new(auth_url.to_string())
        .map_err(|e| OAuthError::InvalidAuthUrl(e.to_string()))?;
    let redirect_url = RedirectUrl::new(redirect_url.to_string())
        .map_err(|e| OAuthError::InvalidRedirectUrl(e.to_string()))?;

    let client = BasicClient::new(ClientId::new(client_id.to_string()))
        .set_auth_uri(auth_url)
        .set_redirect_uri(redirect_url);
    let (url, state) = client
        .authorize_url(CsrfToken::new_random)
        .add_extra_param("owner", "user")
        .url();

    Ok(AuthorizeRequest {
        url: url.to_string(),
        state: state.secret().clone(),
    })
}

/// What the provider's redirect told us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    Code(String),
    /// The provider sent an `error` parameter (e.g. `access_denied`).
    Denied(String),
    StateMismatch,
    /// No query string, or no usable `code`.
    MissingCode,
}

pub fn parse_redirect(response_url: &str, expected_state: &str) -> RedirectOutcome {
    let Ok(url) = Url::parse(response_url) else {
        return RedirectOutcome::MissingCode;
    };

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return RedirectOutcome::Denied(error);
    }
    if state.as_deref() != Some(expected_state) {
        return RedirectOutcome::StateMismatch;
    }
    match code {
        Some(code) if !code.is_empty() => RedirectOutcome::Code(code),
        _ => RedirectOutcome::MissingCode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url_carries_notion_parameters() {
        let redirect = loopback_redirect_url(8847);
        let request = authorize_url(NOTION_AUTHORIZE_URL, "client-1", &redirect).unwrap();
        let url = Url::parse(&request.url).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let get = |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(url.host_str(), Some("api.notion.com"));
        assert_eq!(get("client_id"), Some("client-1"));
        assert_eq!(get("response_type"), Some("code"));
        assert_eq!(get("owner"), Some("user"));
        assert_eq!(get("redirect_uri"), Some(redirect.as_str()));
        assert_eq!(get("state"), Some(request.state.as_str()));
    }

    #[test]
    fn test_authorize_url_rejects_bad_redirect() {
        let err = authorize_url(NOTION_AUTHORIZE_URL, "client-1", "not a url").unwrap_err();
        assert!(matches!(err, OAuthError::InvalidRedirectUrl(_)));
    }

    #[test]
    fn test_parse_redirect_with_code() {
        let outcome = parse_redirect("http://127.0.0.1:8847/callback?code=abc123&state=s1", "s1");
        assert_eq!(outcome, RedirectOutcome::Code("abc123".to_string()));
    }

    #[test]
    fn test_parse_redirect_empty_code_is_missing() {
        let outcome = parse_redirect("http://127.0.0.1:8847/callback?code=&state=s1", "s1");
        assert_eq!(outcome, RedirectOutcome::MissingCode);
    }

    #[test]
    fn test_parse_redirect_without_query() {
        let outcome = parse_redirect("http://127.0.0.1:8847/callback", "s1");
        assert_eq!(outcome, RedirectOutcome::StateMismatch);
        assert_eq!(parse_redirect("garbage", "s1"), RedirectOutcome::MissingCode);
    }

    #[test]
    fn test_parse_redirect_denied() {
        let outcome = parse_redirect(
            "http://127.0.0.1:8847/callback?error=access_denied&state=s1",
            "s1",
        );
        assert_eq!(outcome, RedirectOutcome::Denied("access_denied".to_string()));
    }

    #[test]
    fn test_parse_redirect_state_mismatch() {
        let outcome = parse_redirect("http://127.0.0.1:8847/callback?code=abc&state=other", "s1");
        assert_eq!(outcome, RedirectOutcome::StateMismatch);
    }
}
