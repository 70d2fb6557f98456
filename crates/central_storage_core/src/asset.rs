use serde::{Deserialize, Serialize};

/// An asset stored on the central storage server.
///
/// Field names on the wire follow the server's JSON (`key`, `type`, `mimetype`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Identifier assigned by the server, used in asset urls.
    #[serde(rename = "key")]
    pub asset_key: String,

    #[serde(default)]
    pub name: String,

    /// Coarse kind reported by the server, e.g. `image`.
    #[serde(rename = "type", default)]
    pub asset_type: String,

    #[serde(rename = "mimetype", default)]
    pub mime_type: String,

    /// Size in bytes
    #[serde(default)]
    pub size: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl Asset {
    pub fn new(asset_key: impl Into<String>) -> Self {
        Self {
            asset_key: asset_key.into(),
            name: String::new(),
            asset_type: String::new(),
            mime_type: String::new(),
            size: 0,
            width: None,
            height: None,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// `(width, height)`, only when the server reported both.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }

    pub fn is_image(&self) -> bool {
        self.asset_type == "image"
    }

    pub fn is_audio(&self) -> bool {
        matches!(self.mime_type.as_str(), "audio/mp3" | "audio/mpeg")
    }

    pub fn is_video(&self) -> bool {
        self.mime_type
            .split('/')
            .next()
            .is_some_and(|major| major.eq_ignore_ascii_case("video"))
    }

    pub fn is_document(&self) -> bool {
        self.mime_type != "application/octet-stream"
    }

    pub fn is_pdf(&self) -> bool {
        matches!(
            self.mime_type.as_str(),
            "application/pdf"
                | "application/x-pdf"
                | "application/acrobat"
                | "applications/vnd.pdf"
                | "text/pdf"
                | "text/x-pdf"
        )
    }

    pub fn is_svg(&self) -> bool {
        self.mime_type == "image/svg+xml"
    }
}
