//! クエリパラメーター

use crate::uri::decode_form_component;

/// クエリパラメーターの多重マップ
///
/// 名前は大文字小文字を区別する。名前は最初に現れた順、値は出現順に並ぶ。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, Vec<String>)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// 生のクエリ文字列 (`?` を含まない) をパース
    ///
    /// `&` で区切った `name=value` を読む。`=` がなければ値は空文字列。
    /// `+` は空白に、パーセントエスケープはデコードする。
    ///
    /// ```rust
    /// use shiguredo_http11_decoder::QueryParams;
    ///
    /// let params = QueryParams::parse("q=hello+world&tag=a&tag=b&flag");
    /// assert_eq!(params.get("q"), Some("hello world"));
    /// assert_eq!(params.get_all("tag"), &["a".to_string(), "b".to_string()]);
    /// assert_eq!(params.get("flag"), Some(""));
    /// ```
    pub fn parse(query: &str) -> Self {
        let mut params = Self::new();
        for pair in query.split('&') {
            if pair.is_empty() {
                continue;
            }
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            params.append(decode_form_component(name), decode_form_component(value));
        }
        params
    }

    /// 値を追加
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// 最初の値を取得
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    /// すべての値を取得
    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// 異なる名前の数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(名前, 値)` を列挙
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(n, values)| values.iter().map(move |v| (n.as_str(), v.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let params = QueryParams::parse("a=1&b=2&a=3");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("a"), Some("1"));
        assert_eq!(params.get_all("a"), &["1".to_string(), "3".to_string()]);
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("a", "1"), ("a", "3"), ("b", "2")]);
    }

    #[test]
    fn test_parse_decodes() {
        let params = QueryParams::parse("na%6De=caf%C3%A9&sp=a+b");
        assert_eq!(params.get("name"), Some("café"));
        assert_eq!(params.get("sp"), Some("a b"));
    }

    #[test]
    fn test_parse_edge_cases() {
        assert!(QueryParams::parse("").is_empty());
        assert!(QueryParams::parse("&&").is_empty());
        let params = QueryParams::parse("k&=v&x==y");
        assert_eq!(params.get("k"), Some(""));
        assert_eq!(params.get(""), Some("v"));
        assert_eq!(params.get("x"), Some("=y"));
    }

    #[test]
    fn test_case_sensitive() {
        let params = QueryParams::parse("A=1");
        assert!(params.contains("A"));
        assert!(!params.contains("a"));
    }
}
