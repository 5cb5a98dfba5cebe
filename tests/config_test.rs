use tunetrivia::{
    config::{AuthSettings, DEFAULT_TOKEN_URL},
    spotify::auth::authorization_request,
};

#[test]
fn test_auth_settings_defaults() {
    let settings = AuthSettings::new("my-client");
    assert_eq!(settings.client_id, "my-client");
    assert_eq!(settings.token_url, DEFAULT_TOKEN_URL);
    assert!(settings.auth_url.starts_with("https://accounts.spotify.com/"));
    assert!(settings.redirect_uri.ends_with("/callback"));
}

#[test]
fn test_authorization_request_is_form_encoded() {
    let settings = AuthSettings::new("my-client");
    let request = authorization_request(&settings, "challenge-value").unwrap();

    assert!(request.url.starts_with("https://accounts.spotify.com/authorize?"));
    assert!(request.url.contains("client_id=my-client"));
    assert!(request.url.contains("code_challenge=challenge-value"));
    assert!(request.url.contains("code_challenge_method=S256"));
    assert!(request.url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A8888%2Fcallback"));
    assert!(!request.url.contains(' '));
    assert_eq!(request.code_challenge, "challenge-value");
}

#[test]
fn test_authorization_request_rejects_bad_endpoint() {
    let mut settings = AuthSettings::new("my-client");
    settings.auth_url = "not a url".to_string();
    assert!(authorization_request(&settings, "challenge").is_err());
}
