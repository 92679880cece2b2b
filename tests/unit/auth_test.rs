use jsonwebtoken::{encode, EncodingKey, Header};
use parley_server::auth::{AuthError, TokenVerifier};
use parley_server::config::Config;
use serde_json::json;

const SECRET: &str = "unit_secret_0123456789abcdef012345";

fn verifier(issuer: Option<&str>) -> TokenVerifier {
    let config = Config {
        jwt_secret: Some(SECRET.to_string()),
        jwt_issuer: issuer.map(str::to_string),
        ..Config::default()
    };
    TokenVerifier::from_config(&config).unwrap()
}

fn sign(claims: serde_json::Value) -> String {
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

fn in_an_hour() -> i64 {
    chrono::Utc::now().timestamp() + 3600
}

#[test]
fn test_verify_returns_subject() {
    let token = sign(json!({ "sub": "user_2abc", "exp": in_an_hour() }));
    assert_eq!(verifier(None).verify(&token).unwrap(), "user_2abc");
}

#[test]
fn test_verify_header_requires_bearer_scheme() {
    let v = verifier(None);
    let token = sign(json!({ "sub": "u1", "exp": in_an_hour() }));

    assert!(matches!(v.verify_header(None), Err(AuthError::MissingHeader)));
    assert!(matches!(v.verify_header(Some(&token)), Err(AuthError::InvalidFormat)));
    assert!(matches!(v.verify_header(Some("Bearer ")), Err(AuthError::InvalidFormat)));
    assert_eq!(v.verify_header(Some(&format!("Bearer {}", token))).unwrap(), "u1");
}

#[test]
fn test_verify_rejects_expired_token() {
    let token = sign(json!({ "sub": "u1", "exp": chrono::Utc::now().timestamp() - 3600 }));
    assert!(matches!(verifier(None).verify(&token), Err(AuthError::InvalidToken(_))));
}

#[test]
fn test_verify_rejects_missing_subject() {
    let token = sign(json!({ "exp": in_an_hour() }));
    assert!(matches!(verifier(None).verify(&token), Err(AuthError::MissingSubject)));
}

#[test]
fn test_verify_checks_issuer_when_configured() {
    let v = verifier(Some("https://clerk.example.com"));

    let good = sign(json!({ "sub": "u1", "exp": in_an_hour(), "iss": "https://clerk.example.com" }));
    let bad = sign(json!({ "sub": "u1", "exp": in_an_hour(), "iss": "https://evil.example.com" }));

    assert!(v.verify(&good).is_ok());
    assert!(v.verify(&bad).is_err());
}

#[test]
fn test_from_config_without_keys_is_misconfigured() {
    let result = TokenVerifier::from_config(&Config::default());
    assert!(matches!(result, Err(AuthError::Misconfigured(_))));
}
