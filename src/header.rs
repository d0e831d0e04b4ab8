//! ヘッダーの多重マップとメッセージ共通トレイト

use crate::classify::{is_field_value_byte, is_token_char};
use crate::cookie::CookieSet;
use crate::error::ConfigError;
use crate::version::Version;

/// ヘッダーの多重マップ
///
/// 名前は大文字小文字を区別せずに比較する。
/// 挿入順を保持し、同じ名前の値は出現順に並ぶ。
/// 名前の表記は最初に現れたものを保持する。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, Vec<String>)>,
}

impl HeaderMap {
    /// 空のマップを作成
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// 最初の値を取得
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name)
            .and_then(|i| self.entries[i].1.first())
            .map(String::as_str)
    }

    /// すべての値を出現順に取得
    pub fn get_all(&self, name: &str) -> &[String] {
        match self.position(name) {
            Some(i) => &self.entries[i].1,
            None => &[],
        }
    }

    /// ヘッダーが存在するか確認
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// 異なる名前の数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 値を追加 (検証あり)
    pub fn append(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        validate_name(name)?;
        validate_value(value)?;
        self.append_unchecked(name.to_string(), value.to_string());
        Ok(())
    }

    /// 値を置き換え (検証あり)
    pub fn insert(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        validate_name(name)?;
        validate_value(value)?;
        match self.position(name) {
            Some(i) => self.entries[i].1 = vec![value.to_string()],
            None => self
                .entries
                .push((name.to_string(), vec![value.to_string()])),
        }
        Ok(())
    }

    /// 検証済みの名前と値を追加
    pub(crate) fn append_unchecked(&mut self, name: String, value: String) {
        match self.position(&name) {
            Some(i) => self.entries[i].1.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// ヘッダーを削除し、削除した値を返す
    pub fn remove(&mut self, name: &str) -> Vec<String> {
        match self.position(name) {
            Some(i) => self.entries.remove(i).1,
            None => Vec::new(),
        }
    }

    /// `(名前, 値)` を出現順に列挙
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|(name, values)| {
            values
                .iter()
                .map(move |value| (name.as_str(), value.as_str()))
        })
    }

    /// 名前を列挙
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

/// ヘッダー名が有効か確認
///
/// ASCII で、制御文字・区切り文字・空白を含まない
pub fn is_valid_header_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(is_token_char)
}

/// ヘッダー値が有効か確認 (RFC 9110 Section 5.5)
///
/// HTAB 以外の制御文字を含む場合は無効
pub fn is_valid_header_value(value: &str) -> bool {
    value.bytes().all(is_field_value_byte)
}

fn validate_name(name: &str) -> Result<(), ConfigError> {
    if !is_valid_header_name(name) {
        return Err(ConfigError::InvalidHeaderName(name.to_string()));
    }
    Ok(())
}

fn validate_value(value: &str) -> Result<(), ConfigError> {
    if !is_valid_header_value(value) {
        return Err(ConfigError::InvalidHeaderValue(value.to_string()));
    }
    Ok(())
}

/// HTTP メッセージ操作のための共通トレイト
pub trait HttpMessage {
    /// HTTP バージョンを取得
    fn version(&self) -> Version;

    /// ヘッダーを取得
    fn headers(&self) -> &HeaderMap;

    /// Cookie を取得
    fn cookies(&self) -> &CookieSet;

    /// ボディを取得
    fn body(&self) -> &[u8];

    /// ヘッダーを取得 (大文字小文字を区別しない)
    fn get_header(&self, name: &str) -> Option<&str> {
        self.headers().get(name)
    }

    /// ヘッダーが存在するか確認
    fn has_header(&self, name: &str) -> bool {
        self.headers().contains(name)
    }

    /// Content-Length ヘッダーの値を取得
    fn content_length(&self) -> Option<usize> {
        self.get_header("Content-Length")
            .and_then(|v| v.trim().parse().ok())
    }

    /// Transfer-Encoding が chunked かどうかを判定
    fn is_chunked(&self) -> bool {
        self.get_header("Transfer-Encoding").is_some_and(|v| {
            let coding = v.split(';').next().unwrap_or(v).trim();
            coding.eq_ignore_ascii_case("chunked")
        })
    }

    /// キープアライブ接続かどうかを判定
    ///
    /// close トークンがいずれかの Connection ヘッダーに存在すれば false を返す。
    fn is_keep_alive(&self) -> bool {
        let mut has_keep_alive = false;

        for conn in self.headers().get_all("Connection") {
            for token in conn.split(',') {
                let token = token.trim();
                if token.eq_ignore_ascii_case("close") {
                    return false;
                }
                if token.eq_ignore_ascii_case("keep-alive") {
                    has_keep_alive = true;
                }
            }
        }

        has_keep_alive || self.version() == Version::Http11
    }
}
