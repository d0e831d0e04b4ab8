use core::fmt;

/// HTTP バージョン
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Version {
    /// HTTP/1.0
    Http10,
    /// HTTP/1.1
    #[default]
    Http11,
}

impl Version {
    /// プロトコルバージョントークンを解釈 (大文字小文字を区別しない)
    pub fn from_bytes(token: &[u8]) -> Option<Self> {
        if token.eq_ignore_ascii_case(b"HTTP/1.1") {
            Some(Version::Http11)
        } else if token.eq_ignore_ascii_case(b"HTTP/1.0") {
            Some(Version::Http10)
        } else {
            None
        }
    }

    /// ワイヤ上の表記
    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
