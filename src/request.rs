use crate::cookie::{Cookie, CookieSet};
use crate::error::ConfigError;
use crate::header::{HeaderMap, HttpMessage};
use crate::method::Method;
use crate::query::QueryParams;
use crate::uri::Uri;
use crate::version::Version;

/// HTTP リクエスト
///
/// デコーダーが組み立てる。アプリケーションが構築する場合も
/// ヘッダー名と Cookie 名は設定時に検証される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    target: Uri,
    version: Version,
    headers: HeaderMap,
    cookies: CookieSet,
    query: QueryParams,
    body: Vec<u8>,
}

impl Request {
    /// 新しいリクエストを作成 (HTTP/1.1)
    ///
    /// クエリパラメーターは `target` のクエリ文字列から作られる
    pub fn new(method: Method, target: Uri) -> Self {
        let query = target.query().map(QueryParams::parse).unwrap_or_default();
        Self {
            method,
            target,
            version: Version::Http11,
            headers: HeaderMap::new(),
            cookies: CookieSet::new(),
            query,
            body: Vec::new(),
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// request-target
    pub fn target(&self) -> &Uri {
        &self.target
    }

    /// request-target のパス
    pub fn path(&self) -> &str {
        self.target.path()
    }

    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    /// クエリパラメーターの最初の値を取得
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name)
    }

    /// `Expect: 100-continue` が指定されているか
    ///
    /// HTTP/1.0 では無視する (RFC 9110 Section 10.1.1)
    pub fn expects_continue(&self) -> bool {
        self.version == Version::Http11
            && self
                .headers
                .get_all("Expect")
                .iter()
                .any(|v| v.trim().eq_ignore_ascii_case("100-continue"))
    }

    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    /// request-target を設定し、クエリパラメーターを作り直す
    pub fn set_target(&mut self, target: Uri) {
        self.query = target.query().map(QueryParams::parse).unwrap_or_default();
        self.target = target;
    }

    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    /// 生のクエリ文字列からクエリパラメーターを設定
    pub fn set_query(&mut self, raw: &str) {
        self.query = QueryParams::parse(raw);
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

impl HttpMessage for Request {
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
