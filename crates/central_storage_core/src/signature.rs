//! Request signing.
//!
//! A signature token has the shape `<algorithm>:<salt>:<digest>`. The digest is
//! the hex encoded hash of the canonical query string built from the signed
//! parameters plus the reserved `salt` and `secret` entries. Because the salt
//! travels inside the token, a verifier holding the same secret can rebuild the
//! exact same token from the received parameters.

use crate::request::SignableRequest;
use rand::Rng;
use rand::distr::Alphanumeric;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;
use url::form_urlencoded;

/// Query parameter holding the request timestamp.
pub const QUERY_NONCE: &str = "nonce";
pub const HEADER_SIGNATURE: &str = "centralstorage-signature";
pub const HEADER_KEY: &str = "centralstorage-key";

const KEY_SALT: &str = "salt";
const KEY_SECRET: &str = "secret";
const SALT_LENGTH: usize = 16;
const NONCE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Signed parameters, ordered by key.
pub type Parameters = BTreeMap<String, String>;

/// Hash algorithms accepted in a signature token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Algorithm {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl Algorithm {
    /// Returns `None` for anything outside of `sha256`, `sha384` and `sha512`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "sha256" => Some(Self::Sha256),
            "sha384" => Some(Self::Sha384),
            "sha512" => Some(Self::Sha512),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }

    /// Lowercase hex digest of `input`.
    pub fn hex_digest(&self, input: &[u8]) -> String {
        match self {
            Self::Sha256 => hex::encode(Sha256::digest(input)),
            Self::Sha384 => hex::encode(Sha384::digest(input)),
            Self::Sha512 => hex::encode(Sha512::digest(input)),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `algorithm:salt:digest` value sent in the signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureToken {
    pub algorithm: Algorithm,
    pub salt: String,
    pub digest: String,
}

impl SignatureToken {
    /// Parses a token. Anything but exactly three `:` separated parts with a
    /// supported algorithm is rejected.
    pub fn parse(token: &str) -> Option<Self> {
        let mut parts = token.split(':');
        let (Some(algorithm), Some(salt), Some(digest), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return None;
        };

        Some(Self {
            algorithm: Algorithm::parse(algorithm)?,
            salt: salt.to_string(),
            digest: digest.to_string(),
        })
    }
}

impl fmt::Display for SignatureToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.algorithm, self.salt, self.digest)
    }
}

/// Consumer key and shared secret.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub key: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Computes the signature token for `parameters`.
///
/// Returns `None` when `algorithm` is not supported. A salt is generated when
/// none is given; callers verifying a token pass the salt found in it.
pub fn compute_signature<I, K, V>(
    parameters: I,
    algorithm: &str,
    secret: &str,
    salt: Option<&str>,
) -> Option<SignatureToken>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let Some(algorithm) = Algorithm::parse(algorithm) else {
        debug!(algorithm, "Unsupported signature algorithm");
        return None;
    };

    Some(signature_with(parameters, algorithm, secret, salt))
}

fn signature_with<I, K, V>(
    parameters: I,
    algorithm: Algorithm,
    secret: &str,
    salt: Option<&str>,
) -> SignatureToken
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let salt = salt.map(str::to_string).unwrap_or_else(generate_salt);

    // Reserved keys win over caller supplied values of the same name.
    let mut signed: Parameters = parameters
        .into_iter()
        .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
        .collect();
    signed.insert(KEY_SALT.to_string(), salt.clone());
    signed.insert(KEY_SECRET.to_string(), secret.to_string());

    let digest = algorithm.hex_digest(canonical_query(&signed).as_bytes());

    SignatureToken {
        algorithm,
        salt,
        digest,
    }
}

/// Form encodes `parameters` in key order, joined with `&`.
pub fn canonical_query(parameters: &Parameters) -> String {
    parameters
        .iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode_component(value: &str) -> String {
    // `*` is left alone by the form serializer but percent encoded by the server.
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('*', "%2A")
}

/// 16 random alphanumeric characters.
pub fn generate_salt() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LENGTH)
        .map(char::from)
        .collect()
}

/// Current UTC time with microsecond precision, e.g. `2024-01-31 12:00:00.123456`.
pub fn generate_nonce() -> String {
    chrono::Utc::now().format(NONCE_FORMAT).to_string()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Signs outgoing requests and verifies incoming ones.
#[derive(Debug, Clone, Default)]
pub struct RequestSigner {
    credentials: Credentials,
    algorithm: Algorithm,
}

impl RequestSigner {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            algorithm: Algorithm::default(),
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Adds a nonce to the query and sets the signature and key headers.
    ///
    /// `key` and `secret` fall back to the configured credentials.
    pub fn sign(&self, request: &mut SignableRequest, key: Option<&str>, secret: Option<&str>) {
        let key = key.unwrap_or(&self.credentials.key);
        let secret = secret.unwrap_or(&self.credentials.secret);

        // Sent along and signed, never checked.
        request.set_query(QUERY_NONCE, generate_nonce());

        let token = signature_with(request.query(), self.algorithm, secret, None);
        debug!(key, algorithm = %self.algorithm, "Signed request to {}", request.url());

        request.set_header(HEADER_SIGNATURE, token.to_string());
        request.set_header(HEADER_KEY, key);
    }

    /// Checks the signature header of `request` against its query parameters.
    ///
    /// `key` names the consumer owning `secret`; it is not part of the digest.
    pub fn is_valid(&self, request: &SignableRequest, key: &str, secret: &str) -> bool {
        let Some(provided) = request.header(HEADER_SIGNATURE) else {
            debug!(key, "Request carries no signature");
            return false;
        };

        self.is_valid_parameters(request.query(), provided, secret)
    }

    /// Recomputes `provided` from `parameters` using its embedded algorithm and salt.
    pub fn is_valid_parameters<I, K, V>(&self, parameters: I, provided: &str, secret: &str) -> bool
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut parts = provided.split(':');
        let (Some(algorithm), Some(salt), Some(_digest), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return false;
        };

        compute_signature(parameters, algorithm, secret, Some(salt))
            .map(|actual| constant_time_eq(actual.to_string().as_bytes(), provided.as_bytes()))
            .unwrap_or(false)
    }

    /// Signs arbitrary parameters with the configured algorithm.
    ///
    /// A fixed `salt` makes the token stable across calls. It must not contain
    /// `:`, or the token no longer parses and never verifies.
    pub fn sign_parameters<I, K, V>(
        &self,
        parameters: I,
        secret: Option<&str>,
        salt: Option<&str>,
    ) -> SignatureToken
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let secret = secret.unwrap_or(&self.credentials.secret);
        signature_with(parameters, self.algorithm, secret, salt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Method;

    const KEY: &str = "abcdef";
    const SECRET: &str = "bcdefhijklmn";

    fn signer() -> RequestSigner {
        RequestSigner::new(Credentials::new(KEY, SECRET))
    }

    fn request() -> SignableRequest {
        let mut request = SignableRequest::new(Method::Get, "http://localhost/api/v1/assets");
        request.set_query("foo", "wololo");
        request.set_query("bar", "awlololo");
        request
    }

    #[test]
    fn signed_request_is_valid_until_tampered() {
        let signer = signer();
        let mut request = request();

        signer.sign(&mut request, Some(KEY), Some(SECRET));
        assert!(signer.is_valid(&request, KEY, SECRET));

        request.set_query("foo", "wololo2");
        assert!(!signer.is_valid(&request, KEY, SECRET));
    }

    #[test]
    fn sign_sets_headers_and_nonce() {
        let signer = signer();
        let mut request = request();
        signer.sign(&mut request, None, None);

        assert_eq!(request.header(HEADER_KEY), Some(KEY));
        let nonce = request.query().get(QUERY_NONCE).expect("nonce");
        assert!(chrono::NaiveDateTime::parse_from_str(nonce, NONCE_FORMAT).is_ok());
        assert_eq!(nonce.rsplit('.').next().map(str::len), Some(6));

        let token = SignatureToken::parse(request.header(HEADER_SIGNATURE).expect("signature"))
            .expect("well formed token");
        assert_eq!(token.algorithm, Algorithm::Sha256);
        assert_eq!(token.salt.len(), SALT_LENGTH);
        assert!(token.salt.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(token.digest.len(), 64);
    }

    #[test]
    fn per_call_credentials_override_configured_ones() {
        let signer = signer();
        let mut request = request();
        signer.sign(&mut request, Some("other"), Some("other-secret"));

        assert_eq!(request.header(HEADER_KEY), Some("other"));
        assert!(signer.is_valid(&request, "other", "other-secret"));
        assert!(!signer.is_valid(&request, KEY, SECRET));
    }

    #[test]
    fn digest_matches_canonical_query() {
        let params = [("b", "2"), ("a", "x y")];
        let token = compute_signature(params, "sha256", "s3cr3t", Some("pepper")).unwrap();

        let expected = hex::encode(Sha256::digest(b"a=x+y&b=2&salt=pepper&secret=s3cr3t"));
        assert_eq!(token.digest, expected);
        assert_eq!(token.to_string(), format!("sha256:pepper:{expected}"));
    }

    #[test]
    fn canonical_query_encodes_reserved_characters() {
        let params: Parameters = [("k&y".to_string(), "a*b/c=d~".to_string())].into();
        assert_eq!(canonical_query(&params), "k%26y=a%2Ab%2Fc%3Dd%7E");
    }

    #[test]
    fn reserved_keys_overwrite_caller_values() {
        let caller = [("salt", "mine"), ("secret", "mine")];
        let token = compute_signature(caller, "sha256", "real", Some("pepper")).unwrap();
        let expected =
            compute_signature(Vec::<(&str, &str)>::new(), "sha256", "real", Some("pepper")).unwrap();
        assert_eq!(token, expected);
    }

    #[test]
    fn supports_every_listed_algorithm() {
        for (name, hex_len) in [("sha256", 64), ("sha384", 96), ("sha512", 128)] {
            let token = compute_signature([("a", "b")], name, SECRET, None).unwrap();
            assert_eq!(token.algorithm.as_str(), name);
            assert_eq!(token.digest.len(), hex_len);
        }
    }

    #[test]
    fn rejects_unsupported_algorithms() {
        for name in ["md5", "sha1", "", "SHA256", "sha256 "] {
            assert!(compute_signature([("a", "b")], name, SECRET, None).is_none());
        }
    }

    #[test]
    fn malformed_signature_headers_are_invalid() {
        let signer = signer();
        let request = request();
        assert!(!signer.is_valid(&request, KEY, SECRET));

        for header in ["", "sha256:onlytwoparts", "sha256:a:b:c", "md5:salt:digest"] {
            let mut request = request.clone();
            request.set_header(HEADER_SIGNATURE, header);
            assert!(!signer.is_valid(&request, KEY, SECRET), "{header}");
        }
    }

    #[test]
    fn verifies_tokens_made_with_other_algorithms() {
        let signer = signer().with_algorithm(Algorithm::Sha512);
        let mut request = request();
        signer.sign(&mut request, None, None);

        assert!(request.header(HEADER_SIGNATURE).unwrap().starts_with("sha512:"));
        assert!(RequestSigner::default().is_valid(&request, KEY, SECRET));
    }

    #[test]
    fn token_parse_round_trips() {
        let token = SignatureToken::parse("sha384:abc:0123").unwrap();
        assert_eq!(token.algorithm, Algorithm::Sha384);
        assert_eq!(token.salt, "abc");
        assert_eq!(token.digest, "0123");
        assert_eq!(token.to_string(), "sha384:abc:0123");
        assert!(SignatureToken::parse("sha384:abc").is_none());
    }

    #[test]
    fn credentials_debug_hides_secret() {
        let rendered = format!("{:?}", Credentials::new(KEY, SECRET));
        assert!(rendered.contains(KEY));
        assert!(!rendered.contains(SECRET));
    }
}
