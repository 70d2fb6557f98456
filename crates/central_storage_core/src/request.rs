use crate::signature::Parameters;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use url::form_urlencoded;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request as seen by the signer.
///
/// The client builds one per call and turns it into an HTTP request after
/// signing; the verifier builds one from the parts of an incoming request.
/// Header names are stored lowercase.
#[derive(Debug, Clone, Default)]
pub struct SignableRequest {
    method: Method,
    url: String,
    query: Parameters,
    headers: BTreeMap<String, String>,
    attributes: Parameters,
    files: Vec<PathBuf>,
}

impl SignableRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            ..Default::default()
        }
    }

    /// Decodes a raw `a=1&b=2` query string into the query parameters.
    /// Repeated keys keep the last value.
    pub fn with_query_string(mut self, query: &str) -> Self {
        self.query
            .extend(form_urlencoded::parse(query.as_bytes()).into_owned());
        self
    }

    pub fn with_attributes<I, K, V>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.attributes
            .extend(attributes.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn query(&self) -> &Parameters {
        &self.query
    }

    pub fn set_query(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.insert(key.into(), value.into());
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Form fields sent along with the request body.
    pub fn attributes(&self) -> &Parameters {
        &self.attributes
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(PathBuf::as_path)
    }
}
