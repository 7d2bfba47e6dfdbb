//! Intercepted request model

use http::HeaderMap;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Resource type the client is fetching
///
/// Taken from `Sec-Fetch-Dest` when the client sends it, otherwise guessed
/// from the path extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
    Media,
    Empty,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Document => "document",
            Destination::Script => "script",
            Destination::Style => "style",
            Destination::Image => "image",
            Destination::Font => "font",
            Destination::Manifest => "manifest",
            Destination::Media => "media",
            Destination::Empty => "empty",
        }
    }

    /// Guess the destination from a URL path
    pub fn from_path(path: &str) -> Self {
        let file = path.rsplit('/').next().unwrap_or("");
        let extension = match file.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return Destination::Empty,
        };

        match extension.as_str() {
            "html" | "htm" => Destination::Document,
            "js" | "mjs" => Destination::Script,
            "css" => Destination::Style,
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "avif" | "ico" => {
                Destination::Image
            }
            "woff" | "woff2" | "ttf" | "otf" | "eot" => Destination::Font,
            "webmanifest" => Destination::Manifest,
            "mp4" | "webm" | "mp3" | "ogg" | "wav" => Destination::Media,
            _ => Destination::Empty,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Destination {
    type Err = std::convert::Infallible;

    /// Parse a `Sec-Fetch-Dest` value; unknown values map to `Empty`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "document" | "iframe" | "frame" => Destination::Document,
            "script" | "worker" | "sharedworker" | "serviceworker" => Destination::Script,
            "style" => Destination::Style,
            "image" => Destination::Image,
            "font" => Destination::Font,
            "manifest" => Destination::Manifest,
            "audio" | "video" | "track" => Destination::Media,
            _ => Destination::Empty,
        })
    }
}

/// Request headers that would make the origin answer with something other
/// than the full resource stored under the URL key
const PARTIAL_RESPONSE_HEADERS: [&str; 6] = [
    "range",
    "if-range",
    "if-none-match",
    "if-modified-since",
    "if-match",
    "if-unmodified-since",
];

/// A GET request observed at the interception boundary
#[derive(Debug, Clone)]
pub struct CacheRequest {
    pub url: Url,
    pub destination: Destination,
    pub headers: HeaderMap,
}

impl CacheRequest {
    /// Build a request, deriving its destination from the headers or the path
    pub fn new(url: Url, headers: HeaderMap) -> Self {
        let destination = headers
            .get("sec-fetch-dest")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<Destination>().ok())
            .filter(|d| *d != Destination::Empty)
            .unwrap_or_else(|| Destination::from_path(url.path()));

        Self {
            url,
            destination,
            headers,
        }
    }

    /// A bare GET with no headers
    pub fn get(url: Url) -> Self {
        Self::new(url, HeaderMap::new())
    }

    /// Normalized cache key: the absolute URL without its fragment
    pub fn key(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url.into()
    }

    /// Headers to send when fetching on behalf of a store
    ///
    /// Conditional and range headers are dropped so the origin returns the
    /// full representation the cache key stands for.
    pub fn network_headers(&self) -> HeaderMap {
        let mut headers = self.headers.clone();
        for name in PARTIAL_RESPONSE_HEADERS {
            headers.remove(name);
        }
        headers
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Whether the request targets the given origin
    pub fn is_same_origin(&self, origin: &Url) -> bool {
        self.url.origin() == origin.origin()
    }
}
