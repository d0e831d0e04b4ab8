use crate::cookie::{Cookie, CookieSet};
use crate::error::ConfigError;
use crate::header::{HeaderMap, HttpMessage};
use crate::status;
use crate::version::Version;

/// HTTP レスポンス
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    version: Version,
    status_code: u16,
    reason_phrase: String,
    headers: HeaderMap,
    cookies: CookieSet,
    body: Vec<u8>,
}

impl Response {
    /// 新しいレスポンスを作成 (HTTP/1.1)
    ///
    /// ステータスコードが 100-599 の範囲外なら `ConfigError::InvalidStatusCode`
    pub fn new(status_code: u16, reason_phrase: &str) -> Result<Self, ConfigError> {
        validate_status(status_code)?;
        Ok(Self::with_status(Version::Http11, status_code, reason_phrase))
    }

    /// 検証済みのステータスで作成
    pub(crate) fn with_status(version: Version, status_code: u16, reason_phrase: &str) -> Self {
        Self {
            version,
            status_code,
            reason_phrase: reason_phrase.to_string(),
            headers: HeaderMap::new(),
            cookies: CookieSet::new(),
            body: Vec::new(),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn reason_phrase(&self) -> &str {
        &self.reason_phrase
    }

    /// ステータスコードが情報レスポンス (1xx) か確認
    pub fn is_informational(&self) -> bool {
        (100..200).contains(&self.status_code)
    }

    /// ステータスコードが成功 (2xx) か確認
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// ステータスコードがリダイレクト (3xx) か確認
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status_code)
    }

    /// ステータスコードがクライアントエラー (4xx) か確認
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code)
    }

    /// ステータスコードがサーバーエラー (5xx) か確認
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code)
    }

    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    pub fn set_status(&mut self, status_code: u16) -> Result<(), ConfigError> {
        validate_status(status_code)?;
        self.status_code = status_code;
        Ok(())
    }

    pub fn set_reason_phrase(&mut self, reason_phrase: &str) {
        self.reason_phrase = reason_phrase.to_string();
    }

    /// ヘッダーを追加
    pub fn add_header(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        self.headers.append(name, value)
    }

    /// ヘッダーを置き換え
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        self.headers.insert(name, value)
    }

    /// ヘッダーをまとめて置き換え
    pub fn set_headers(&mut self, headers: HeaderMap) {
        self.headers = headers;
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Cookie を追加 (同じ名前・パス・ドメインなら置き換え)
    pub fn add_cookie(&mut self, cookie: Cookie) {
        self.cookies.insert(cookie);
    }

    pub fn set_cookies(&mut self, cookies: CookieSet) {
        self.cookies = cookies;
    }

    /// ボディに追記
    pub fn append_body(&mut self, data: &[u8]) {
        self.body.extend_from_slice(data);
    }

    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = body;
    }

    /// ボディを取り出す
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

impl HttpMessage for Response {
    fn version(&self) -> Version {
        self.version
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn cookies(&self) -> &CookieSet {
        &self.cookies
    }

    fn body(&self) -> &[u8] {
        &self.body
    }
}

fn validate_status(status_code: u16) -> Result<(), ConfigError> {
    if !status::is_valid(status_code) {
        return Err(ConfigError::InvalidStatusCode(status_code));
    }
    Ok(())
}
