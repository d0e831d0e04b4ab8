//! バイト分類
//!
//! HTTP の構文要素を判定するための静的テーブル。
//! テーブルはコンパイル時に生成され、以降変更されない。

const CTL: u8 = 1 << 0;
const SEPARATOR: u8 = 1 << 1;
const HEX: u8 = 1 << 2;
const LWS: u8 = 1 << 3;

/// HTTP の区切り文字 (SP と HTAB は LWS として別に扱う)
const SEPARATORS: &[u8] = b"\"(),/:;<=>?@[\\]{}";

static TABLE: [u8; 256] = build_table();

const fn build_table() -> [u8; 256] {
    let mut table = [0u8; 256];

    let mut b = 0;
    while b < 0x20 {
        table[b] |= CTL;
        b += 1;
    }
    table[0x7F] |= CTL;

    let mut i = 0;
    while i < SEPARATORS.len() {
        table[SEPARATORS[i] as usize] |= SEPARATOR;
        i += 1;
    }

    let mut d = b'0';
    while d <= b'9' {
        table[d as usize] |= HEX;
        d += 1;
    }
    let mut h = 0;
    while h < 6 {
        table[(b'a' + h) as usize] |= HEX;
        table[(b'A' + h) as usize] |= HEX;
        h += 1;
    }

    table[b' ' as usize] |= LWS;
    table[b'\t' as usize] |= LWS;

    table
}

/// 16 進数字か
#[inline]
pub fn is_hex_digit(b: u8) -> bool {
    TABLE[b as usize] & HEX != 0
}

/// HTTP の制御文字か (0x00-0x1F, 0x7F)
#[inline]
pub fn is_http_control(b: u8) -> bool {
    TABLE[b as usize] & CTL != 0
}

/// HTTP の区切り文字か
///
/// `" ( ) , / : ; < = > ? @ [ ] \ { }`
#[inline]
pub fn is_http_separator(b: u8) -> bool {
    TABLE[b as usize] & SEPARATOR != 0
}

/// 線形空白 (SP / HTAB) か
#[inline]
pub fn is_linear_whitespace(b: u8) -> bool {
    TABLE[b as usize] & LWS != 0
}

/// 空白 (SP / HTAB / CR / LF) か
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    is_linear_whitespace(b) || b == b'\r' || b == b'\n'
}

/// トークン文字か
///
/// ASCII で、制御文字・区切り文字・空白のいずれでもないもの
#[inline]
pub fn is_token_char(b: u8) -> bool {
    b.is_ascii() && !is_http_control(b) && !is_http_separator(b) && !is_linear_whitespace(b)
}

/// 16 進数字の値
#[inline]
pub fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// ヘッダー値に許可されるバイトか (RFC 9110 Section 5.5)
///
/// HTAB / SP / VCHAR / obs-text
#[inline]
pub fn is_field_value_byte(b: u8) -> bool {
    b == b'\t' || !is_http_control(b)
}
