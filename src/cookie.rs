//! Cookie / Set-Cookie ヘッダーのパース
//!
//! 旧来の RFC 2109 形式 (`$Version` / `$Path` / `$Domain` / `$Port`) も受け付ける。
//! パースはベストエフォートで、解釈できない部分は読み飛ばす。エラーは返さない。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_http11_decoder::cookie::parse_cookie_header;
//!
//! let cookies = parse_cookie_header("$Version=1; session=abc; $Path=/; user=john");
//! assert_eq!(cookies.len(), 2);
//! assert_eq!(cookies[0].name(), "session");
//! assert_eq!(cookies[0].path(), Some("/"));
//! assert_eq!(cookies[0].version(), 1);
//! assert_eq!(cookies[1].path(), None);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use crate::classify::is_token_char;
use crate::error::ConfigError;

/// Cookie
///
/// 同一性は (名前, パス, ドメイン) の組で決まる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
    path: Option<String>,
    domain: Option<String>,
    version: u32,
}

impl Cookie {
    /// 新しい Cookie を作成
    ///
    /// 名前がトークンでなければ `ConfigError::InvalidCookieName`
    pub fn new(name: &str, value: &str) -> Result<Self, ConfigError> {
        if !is_valid_cookie_name(name) {
            return Err(ConfigError::InvalidCookieName(name.to_string()));
        }
        Ok(Self::unchecked(name, value))
    }

    fn unchecked(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            path: None,
            domain: None,
            version: 0,
        }
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }

    pub fn with_domain(mut self, domain: &str) -> Self {
        self.domain = Some(domain.to_string());
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Cookie のバージョン (指定なしは 0)
    pub fn version(&self) -> u32 {
        self.version
    }

    fn key(&self) -> CookieKey {
        CookieKey {
            name: self.name.clone(),
            path: self.path.clone(),
            domain: self.domain.clone(),
        }
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// CookieSet の並び順を決めるキー
///
/// 名前、パス、ドメインの順に比較する。`None` は `Some` より前に並ぶ。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct CookieKey {
    name: String,
    path: Option<String>,
    domain: Option<String>,
}

/// Cookie の集合
///
/// 同じ (名前, パス, ドメイン) の Cookie は後から追加したものに置き換わる。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieSet {
    cookies: BTreeMap<CookieKey, Cookie>,
}

impl CookieSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cookie を追加 (同一性が等しいものは置き換え)
    pub fn insert(&mut self, cookie: Cookie) {
        self.cookies.insert(cookie.key(), cookie);
    }

    /// 名前で検索し、最初に並ぶ Cookie を返す
    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.iter().find(|c| c.name == name)
    }

    /// 名前が一致する Cookie をすべて返す
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Cookie> + 'a {
        self.iter().filter(move |c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn clear(&mut self) {
        self.cookies.clear();
    }

    /// (名前, パス, ドメイン) 順に列挙
    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.values()
    }
}

impl Extend<Cookie> for CookieSet {
    fn extend<I: IntoIterator<Item = Cookie>>(&mut self, iter: I) {
        for cookie in iter {
            self.insert(cookie);
        }
    }
}

impl FromIterator<Cookie> for CookieSet {
    fn from_iter<I: IntoIterator<Item = Cookie>>(iter: I) -> Self {
        let mut set = CookieSet::new();
        set.extend(iter);
        set
    }
}

/// Cookie ヘッダーの値をパース
///
/// `;` と `,` を区切りとして `name=value` を読む。
///
/// - `$Version` は以降の Cookie に適用する
/// - `$Path` / `$Domain` は直前の Cookie に付与する (Cookie より前なら無視)
/// - `$Port` と未知の `$` 属性は無視する
/// - `=` を含まないペアや名前が不正なペアは読み飛ばす
pub fn parse_cookie_header(input: &str) -> Vec<Cookie> {
    let mut cookies: Vec<Cookie> = Vec::new();
    let mut version = 0;

    for pair in input.split([';', ',']) {
        let Some((name, value)) = split_pair(pair) else {
            continue;
        };

        if let Some(attr) = name.strip_prefix('$') {
            if attr.eq_ignore_ascii_case("Version") {
                version = value.parse().unwrap_or(0);
            } else if attr.eq_ignore_ascii_case("Path") {
                if let Some(last) = cookies.last_mut() {
                    last.path = Some(value.to_string());
                }
            } else if attr.eq_ignore_ascii_case("Domain") {
                if let Some(last) = cookies.last_mut() {
                    last.domain = Some(value.to_string());
                }
            }
            continue;
        }

        if !is_valid_cookie_name(name) {
            continue;
        }
        cookies.push(Cookie::unchecked(name, value).with_version(version));
    }

    cookies
}

/// Set-Cookie ヘッダーの値をパース
///
/// 最初の `name=value` と Path / Domain / Version 属性を読む。
/// その他の属性 (Expires, Max-Age, Secure など) は無視する。
/// 先頭のペアが解釈できなければ `None`
pub fn parse_set_cookie(input: &str) -> Option<Cookie> {
    let mut parts = input.split(';');
    let (name, value) = split_pair(parts.next()?)?;
    if !is_valid_cookie_name(name) {
        return None;
    }

    let mut cookie = Cookie::unchecked(name, value);
    for part in parts {
        let Some((attr, value)) = split_pair(part) else {
            continue;
        };
        match attr.to_ascii_lowercase().as_str() {
            "path" => cookie.path = Some(value.to_string()),
            "domain" => cookie.domain = Some(value.to_string()),
            "version" => cookie.version = value.parse().unwrap_or(0),
            _ => {}
        }
    }
    Some(cookie)
}

/// `name=value` を分割し、前後の空白と値の引用符を除去する
fn split_pair(pair: &str) -> Option<(&str, &str)> {
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    let value = value.trim();
    let value = if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    };
    Some((name, value))
}

/// 有効な Cookie 名かどうか
///
/// RFC 6265 Section 4.1.1: cookie-name = token
pub fn is_valid_cookie_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(is_token_char)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let cookies = parse_cookie_header("session=abc123; user=john");
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].name(), "session");
        assert_eq!(cookies[0].value(), "abc123");
        assert_eq!(cookies[1].name(), "user");
        assert_eq!(cookies[1].value(), "john");
    }

    #[test]
    fn test_parse_comma_separated() {
        let cookies = parse_cookie_header("a=1, b=2");
        let names: Vec<_> = cookies.iter().map(Cookie::name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_quoted_value() {
        let cookies = parse_cookie_header("token=\"xyz\"");
        assert_eq!(cookies[0].value(), "xyz");
    }

    #[test]
    fn test_parse_legacy_attributes() {
        let cookies =
            parse_cookie_header("$Version=\"1\"; a=1; $Path=\"/app\"; $Domain=example.com; b=2");
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].version(), 1);
        assert_eq!(cookies[0].path(), Some("/app"));
        assert_eq!(cookies[0].domain(), Some("example.com"));
        assert_eq!(cookies[1].version(), 1);
        assert_eq!(cookies[1].path(), None);
    }

    #[test]
    fn test_parse_path_before_any_cookie_is_ignored() {
        let cookies = parse_cookie_header("$Path=/; a=1");
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].path(), None);
    }

    #[test]
    fn test_parse_port_is_ignored() {
        let cookies = parse_cookie_header("a=1; $Port=\"80\"");
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name(), "a");
    }

    #[test]
    fn test_parse_skips_malformed_pairs() {
        let cookies = parse_cookie_header("novalue; bad name=1; =x; ok=1;;");
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name(), "ok");
        assert!(parse_cookie_header("").is_empty());
    }

    #[test]
    fn test_parse_set_cookie() {
        let cookie =
            parse_set_cookie("sid=abc; Path=/; Domain=example.com; HttpOnly; Secure").unwrap();
        assert_eq!(cookie.name(), "sid");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.domain(), Some("example.com"));
        assert!(parse_set_cookie("no-equals").is_none());
        assert!(parse_set_cookie("bad name=1").is_none());
    }

    #[test]
    fn test_cookie_set_order() {
        let set: CookieSet = [
            Cookie::new("b", "1").unwrap(),
            Cookie::new("a", "2").unwrap().with_path("/x"),
            Cookie::new("a", "3").unwrap(),
            Cookie::new("a", "4").unwrap().with_path("/x").with_domain("d"),
        ]
        .into_iter()
        .collect();
        let values: Vec<_> = set.iter().map(Cookie::value).collect();
        assert_eq!(values, vec!["3", "2", "4", "1"]);
        assert_eq!(set.get("a").map(Cookie::value), Some("3"));
        assert_eq!(set.get_all("a").count(), 3);
    }

    #[test]
    fn test_cookie_set_identity_replaces() {
        let mut set = CookieSet::new();
        set.insert(Cookie::new("a", "1").unwrap().with_path("/"));
        set.insert(Cookie::new("a", "2").unwrap().with_path("/"));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("a").map(Cookie::value), Some("2"));
    }

    #[test]
    fn test_invalid_cookie_name_is_config_error() {
        assert_eq!(
            Cookie::new("a b", "1"),
            Err(ConfigError::InvalidCookieName("a b".to_string()))
        );
        assert!(Cookie::new("", "1").is_err());
    }
}
