use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use central_storage_core::prelude::*;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, warn};

mod config;
mod error;
mod manager;

pub use config::*;
pub use error::*;
pub use manager::AssetManager;

pub type Result<T> = std::result::Result<T, StorageServerError>;

/// Query parameter carrying the configured asset version.
pub const QUERY_VERSION: &str = "_v";

const API_PREFIX: &str = "api/v1";
const PUBLIC_SALT_LENGTH: usize = 10;

/// Per call replacements for the configured server and credentials.
#[derive(Clone, Debug, Default)]
pub struct RequestOverrides {
    pub server: Option<String>,
    pub key: Option<String>,
    pub secret: Option<String>,
}

impl RequestOverrides {
    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    pub fn credentials(mut self, key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self.secret = Some(secret.into());
        self
    }
}

#[derive(Deserialize)]
struct StoreResponse {
    #[serde(default)]
    assets: Vec<Asset>,
}

#[derive(Deserialize)]
struct DeleteResponse {
    success: bool,
}

#[derive(Clone)]
pub struct CentralStorageClient {
    config: ClientConfig,
    signer: RequestSigner,
    client: Client,
}

impl CentralStorageClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_http_client(config, Client::new())
    }

    pub fn with_http_client(config: ClientConfig, client: Client) -> Self {
        let signer = RequestSigner::new(Credentials::new(&config.key, &config.secret));
        Self {
            config,
            signer,
            client,
        }
    }

    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        Ok(Self::new(ClientConfig::from_env()?))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    /// The url handed out to end users.
    pub fn front_url(&self) -> &str {
        self.config.front.as_deref().unwrap_or(&self.config.server)
    }

    pub fn sign(&self, request: &mut SignableRequest, key: Option<&str>, secret: Option<&str>) {
        self.signer.sign(request, key, secret);
    }

    pub fn is_valid(&self, request: &SignableRequest, key: &str, secret: &str) -> bool {
        self.signer.is_valid(request, key, secret)
    }

    pub fn sign_parameters<I, K, V>(&self, parameters: I, secret: Option<&str>) -> SignatureToken
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.signer.sign_parameters(parameters, secret, None)
    }

    fn api_url(&self, path: &str, server: Option<&str>) -> String {
        let server = server.unwrap_or(&self.config.server);
        format!("{}/{API_PREFIX}/{path}", server.trim_end_matches('/'))
    }

    /// Uploads a file and returns the asset the server created for it.
    pub async fn store<I, K, V>(
        &self,
        path: &Path,
        attributes: I,
        overrides: &RequestOverrides,
    ) -> Result<Asset>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let url = self.api_url("upload", overrides.server.as_deref());
        let mut request = SignableRequest::new(Method::Post, url)
            .with_attributes(attributes)
            .with_file(path);
        self.signer.sign(
            &mut request,
            overrides.key.as_deref(),
            overrides.secret.as_deref(),
        );

        let body = self.send(&request).await?;
        let StoreResponse { assets } = parse_json(body)?;

        // Only one asset expected
        assets
            .into_iter()
            .next()
            .ok_or(StorageServerError::EmptyResponse)
    }

    /// Removes the asset from the server and returns the server's `success` flag.
    pub async fn delete_asset<I, K, V>(
        &self,
        asset: &Asset,
        properties: I,
        overrides: &RequestOverrides,
    ) -> Result<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let url = self.api_url(
            &format!("assets/{}", asset.asset_key),
            overrides.server.as_deref(),
        );
        let mut request = SignableRequest::new(Method::Delete, url).with_attributes(properties);
        self.signer.sign(
            &mut request,
            overrides.key.as_deref(),
            overrides.secret.as_deref(),
        );

        let body = self.send(&request).await?;
        let DeleteResponse { success } = parse_json(body)?;
        if !success {
            warn!(asset = %asset.asset_key, "Server refused to delete asset");
        }

        Ok(success)
    }

    /// Public url of an asset. `properties` end up in the query string.
    pub fn asset_url<I, K, V>(&self, asset: &Asset, properties: I, server: Option<&str>) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let server = server.unwrap_or(self.front_url());
        format!(
            "{server}/assets/{}{}",
            asset.asset_key,
            self.query_suffix(properties)
        )
    }

    /// Url of a cached, optionally transformed copy of a public resource.
    ///
    /// The proxy endpoint authenticates the url with a signature using a salt
    /// derived from the url itself, so repeated calls produce the same link.
    pub fn public_asset_url<I, K, V>(&self, public_url: &str, properties: I) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut salt = hex::encode(Sha256::digest(public_url.as_bytes()));
        salt.truncate(PUBLIC_SALT_LENGTH);

        let token = self
            .signer
            .sign_parameters([("url", public_url)], None, Some(salt.as_str()));

        format!(
            "{}/proxy/{}/{}/{token}{}",
            self.front_url(),
            self.config.key,
            STANDARD.encode(public_url),
            self.query_suffix(properties)
        )
    }

    fn query_suffix<I, K, V>(&self, properties: I) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut properties: Parameters = properties
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        if let Some(version) = self.config.version.as_deref().filter(|v| !v.is_empty()) {
            properties.insert(QUERY_VERSION.to_string(), version.to_string());
        }

        if properties.is_empty() {
            String::new()
        } else {
            format!("?{}", canonical_query(&properties))
        }
    }

    async fn send(&self, request: &SignableRequest) -> Result<String> {
        let method = match request.method() {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self
            .client
            .request(method, request.url())
            .query(request.query());
        for (name, value) in request.headers() {
            builder = builder.header(name, value);
        }

        let mut files = request.files().peekable();
        if files.peek().is_some() {
            let mut form = Form::new();
            for (name, value) in request.attributes() {
                form = form.text(format!("attributes[{name}]"), value.clone());
            }

            for (index, path) in files.enumerate() {
                let data = tokio::fs::read(path).await?;
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| format!("file_{}", index + 1));
                let mime = mime_guess::from_path(path).first_or_octet_stream();

                let part = Part::bytes(data)
                    .file_name(file_name)
                    .mime_str(mime.as_ref())?;
                form = form.part(format!("file_{}", index + 1), part);
            }

            builder = builder.multipart(form);
        } else if !request.attributes().is_empty() {
            builder = builder.json(&serde_json::json!({ "attributes": request.attributes() }));
        }

        debug!("{} {}", request.method(), request.url());
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(StorageServerError::Request {
                message: format!("{} {} returned {status}", request.method(), request.url()),
                status: Some(status),
                response: Some(text),
                headers,
            });
        }

        Ok(response.text().await?)
    }
}

fn parse_json<T: DeserializeOwned>(raw: String) -> Result<T> {
    serde_json::from_str(&raw).map_err(|_| StorageServerError::InvalidContent(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_PARAMS: [(&str, &str); 0] = [];

    fn client(version: Option<&str>) -> CentralStorageClient {
        CentralStorageClient::new(
            ClientConfig::new("https://storage.example", "abcdef", "bcdefhijklmn")
                .with_version(version.map(str::to_string)),
        )
    }

    #[test]
    fn front_url_falls_back_to_server() {
        let client = client(None);
        assert_eq!(client.front_url(), "https://storage.example");

        let client = CentralStorageClient::new(
            ClientConfig::new("https://storage.example", "k", "s").with_front("https://cdn.example"),
        );
        assert_eq!(client.front_url(), "https://cdn.example");
    }

    #[test]
    fn api_urls() {
        let client = client(None);
        assert_eq!(
            client.api_url("upload", None),
            "https://storage.example/api/v1/upload"
        );
        assert_eq!(
            client.api_url("assets/k1", Some("http://other/")),
            "http://other/api/v1/assets/k1"
        );
    }

    #[test]
    fn asset_url_without_query() {
        let client = client(None);
        assert_eq!(
            client.asset_url(&Asset::new("k1"), NO_PARAMS, None),
            "https://storage.example/assets/k1"
        );
    }

    #[test]
    fn asset_url_adds_version_and_properties() {
        let client = client(Some("3"));
        assert_eq!(
            client.asset_url(&Asset::new("k1"), [("width", "200")], Some("https://cdn.example")),
            "https://cdn.example/assets/k1?_v=3&width=200"
        );
    }

    #[test]
    fn public_asset_url_is_stable_and_verifiable() {
        let client = client(Some("1"));
        let source = "https://images.example/cat picture.png";

        let first = client.public_asset_url(source, NO_PARAMS);
        let second = client.public_asset_url(source, NO_PARAMS);
        assert_eq!(first, second);

        let encoded = STANDARD.encode(source);
        let prefix = format!("https://storage.example/proxy/abcdef/{encoded}/");
        assert!(first.starts_with(&prefix), "{first}");
        assert!(first.ends_with("?_v=1"));

        let token = first
            .strip_prefix(&prefix)
            .and_then(|rest| rest.strip_suffix("?_v=1"))
            .unwrap();
        let parsed = SignatureToken::parse(token).unwrap();
        assert_eq!(parsed.salt.len(), PUBLIC_SALT_LENGTH);
        assert!(
            client
                .signer()
                .is_valid_parameters([("url", source)], token, "bcdefhijklmn")
        );
    }

    #[test]
    fn sign_parameters_uses_configured_secret() {
        let client = client(None);
        let token = client.sign_parameters([("a", "1")], None);
        assert!(
            client
                .signer()
                .is_valid_parameters([("a", "1")], &token.to_string(), "bcdefhijklmn")
        );
    }
}
