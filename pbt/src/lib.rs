//! PBT テスト共通ユーティリティ

use proptest::prelude::*;

// ========================================
// トークン / ヘッダー生成
// ========================================

/// トークン文字 (RFC 9110 tchar の一部)
pub fn token_char() -> impl Strategy<Value = char> {
    prop_oneof![
        prop::char::range('a', 'z'),
        prop::char::range('A', 'Z'),
        prop::char::range('0', '9'),
        Just('-'),
        Just('_'),
        Just('.'),
    ]
}

pub fn token_string(max_len: usize) -> impl Strategy<Value = String> {
    proptest::collection::vec(token_char(), 1..=max_len)
        .prop_map(|chars| chars.into_iter().collect())
}

/// ボディ長の決定に関わらないヘッダー名
pub fn header_name() -> impl Strategy<Value = String> {
    token_string(24).prop_map(|name| format!("X-{}", name))
}

/// 前後に空白を持たないヘッダー値
pub fn header_value() -> impl Strategy<Value = String> {
    "[!-~]([ -~]{0,40}[!-~])?".prop_map(|s| s)
}

pub fn headers() -> impl Strategy<Value = Vec<(String, String)>> {
    proptest::collection::vec((header_name(), header_value()), 0..8)
}

pub fn body() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..256)
}

// ========================================
// メッセージ生成
// ========================================

/// ボディの送り方
#[derive(Debug, Clone)]
pub enum Framing {
    ContentLength,
    /// チャンクの区切り位置
    Chunked(Vec<usize>),
}

pub fn framing() -> impl Strategy<Value = Framing> {
    prop_oneof![
        Just(Framing::ContentLength),
        proptest::collection::vec(1usize..64, 0..4).prop_map(Framing::Chunked),
    ]
}

/// ワイヤ形式のリクエスト
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub method: &'static str,
    pub path: String,
    pub query: Option<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub framing: Framing,
}

impl RawRequest {
    pub fn target(&self) -> String {
        match &self.query {
            Some((name, value)) => format!("{}?{}={}", self.path, name, value),
            None => self.path.clone(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!("{} {} HTTP/1.1\r\n", self.method, self.target()).into_bytes();
        for (name, value) in &self.headers {
            out.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }
        encode_body(&mut out, &self.body, &self.framing);
        out
    }
}

pub fn request() -> impl Strategy<Value = RawRequest> {
    (
        prop_oneof![Just("GET"), Just("POST"), Just("PUT"), Just("DELETE")],
        "/([a-zA-Z0-9_.-]{1,8}/?){0,4}",
        proptest::option::of((token_string(8), token_string(8))),
        headers(),
        body(),
        framing(),
    )
        .prop_map(|(method, path, query, headers, body, framing)| RawRequest {
            method,
            path,
            query,
            headers,
            body,
            framing,
        })
}

/// ワイヤ形式のレスポンス
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status_code: u16,
    pub reason_phrase: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub framing: Framing,
}

impl RawResponse {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!("HTTP/1.1 {} {}\r\n", self.status_code, self.reason_phrase)
            .into_bytes();
        for (name, value) in &self.headers {
            out.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }
        encode_body(&mut out, &self.body, &self.framing);
        out
    }
}

pub fn response() -> impl Strategy<Value = RawResponse> {
    (
        prop_oneof![200u16..=203, 205u16..=206, 400u16..=451, 500u16..=511],
        "[A-Za-z][A-Za-z ]{0,30}",
        headers(),
        body(),
        framing(),
    )
        .prop_map(
            |(status_code, reason_phrase, headers, body, framing)| RawResponse {
                status_code,
                reason_phrase,
                headers,
                body,
                framing,
            },
        )
}

/// ヘッダーの終端とボディを書き出す
pub fn encode_body(out: &mut Vec<u8>, body: &[u8], framing: &Framing) {
    match framing {
        Framing::ContentLength => {
            out.extend_from_slice(format!("Content-Length: {}\r\n\r\n", body.len()).as_bytes());
            out.extend_from_slice(body);
        }
        Framing::Chunked(sizes) => {
            out.extend_from_slice(b"Transfer-Encoding: chunked\r\n\r\n");
            for chunk in split_chunks(body, sizes) {
                encode_chunk(out, chunk);
            }
            out.extend_from_slice(b"0\r\n\r\n");
        }
    }
}

/// 1 つのチャンクを書き出す
pub fn encode_chunk(out: &mut Vec<u8>, chunk: &[u8]) {
    out.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
    out.extend_from_slice(chunk);
    out.extend_from_slice(b"\r\n");
}

/// `sizes` の長さで順に区切り、残りを最後のチャンクにする (空のチャンクは作らない)
pub fn split_chunks<'a>(body: &'a [u8], sizes: &[usize]) -> Vec<&'a [u8]> {
    let mut chunks = Vec::new();
    let mut rest = body;
    for &size in sizes {
        if rest.is_empty() {
            break;
        }
        let (chunk, tail) = rest.split_at(size.min(rest.len()));
        chunks.push(chunk);
        rest = tail;
    }
    if !rest.is_empty() {
        chunks.push(rest);
    }
    chunks
}

/// `points` の位置でバイト列を分割する
pub fn split_at_points<'a>(data: &'a [u8], points: &[usize]) -> Vec<&'a [u8]> {
    let mut points: Vec<usize> = points.iter().map(|&p| p % (data.len() + 1)).collect();
    points.sort_unstable();
    points.dedup();

    let mut parts = Vec::new();
    let mut start = 0;
    for point in points {
        parts.push(&data[start..point]);
        start = point;
    }
    parts.push(&data[start..]);
    parts
}
