//! 単機能のデコード状態
//!
//! どの状態も `advance()` を繰り返し呼び出せる。
//! 終端条件が現在のバッファ内で満たされたときだけ `Step::Done` を返す。

use crate::classify::{is_linear_whitespace, is_whitespace};
use crate::error::Error;

use super::cursor::{Cursor, Step};

/// 長さ制限の種類
///
/// 制限超過時に返すエラーを決める
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LimitKind {
    StartLine,
    HeaderLine,
    ChunkLine,
}

impl LimitKind {
    fn error(self, size: usize, limit: usize) -> Error {
        match self {
            LimitKind::StartLine => Error::StartLineTooLong { size, limit },
            LimitKind::HeaderLine => Error::HeaderLineTooLong { size, limit },
            LimitKind::ChunkLine => Error::ChunkLineTooLong { size, limit },
        }
    }
}

/// 長さ制限
///
/// `used` は同じ行で既に消費したバイト数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Limit {
    max: usize,
    kind: LimitKind,
    used: usize,
}

impl Limit {
    pub fn new(max: usize, kind: LimitKind) -> Self {
        Self { max, kind, used: 0 }
    }

    /// さらに `used` バイト消費した後の制限
    pub fn after(self, used: usize) -> Self {
        Self {
            used: self.used.saturating_add(used),
            ..self
        }
    }

    pub fn check(&self, size: usize) -> Result<(), Error> {
        let size = size.saturating_add(self.used);
        if size > self.max {
            return Err(self.kind.error(size, self.max));
        }
        Ok(())
    }
}

/// 終端判定の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scan {
    /// トークンの一部
    Continue,
    /// 終端
    Stop,
    /// 受け付けられないバイト
    Reject,
}

/// 固定の終端バイトまで読む
///
/// 終端バイトは消費するがトークンには含まない。
/// トークンが行をまたぐ (CR / LF が現れる) 場合は 400 とする。
#[derive(Debug, Clone)]
pub(crate) struct UntilByte {
    terminator: u8,
    scanned: usize,
    limit: Limit,
}

impl UntilByte {
    pub fn new(terminator: u8, limit: Limit) -> Self {
        Self {
            terminator,
            scanned: 0,
            limit,
        }
    }

    pub fn advance<'a>(&mut self, cur: &mut Cursor<'a>) -> Result<Step<&'a [u8]>, Error> {
        let input = cur.remaining();
        for (i, &b) in input.iter().enumerate().skip(self.scanned) {
            if b == self.terminator {
                cur.advance(i + 1);
                self.scanned = 0;
                return Ok(Step::Done(&input[..i]));
            }
            if b == b'\r' || b == b'\n' {
                return Err(Error::bad_request(format!(
                    "expected {:?} before end of line",
                    self.terminator as char
                )));
            }
            self.limit.check(i + 1)?;
        }
        self.scanned = input.len();
        Ok(Step::Pending)
    }
}

/// 呼び出し側が与える判定関数で終端を決めて読む
///
/// 終端バイトは消費しない (次の状態が読む)。
/// 判定関数が `Scan::Reject` を返したバイトはプロトコル違反になる。
#[derive(Debug, Clone)]
pub(crate) struct UntilDelimiter {
    scan: fn(u8) -> Scan,
    reject: &'static str,
    scanned: usize,
    limit: Limit,
}

impl UntilDelimiter {
    /// `reject` は `Scan::Reject` 時のエラーメッセージ
    pub fn new(scan: fn(u8) -> Scan, reject: &'static str, limit: Limit) -> Self {
        Self {
            scan,
            reject,
            scanned: 0,
            limit,
        }
    }

    /// 線形空白 (SP / HTAB) まで読む
    ///
    /// 行末 (CR / LF) が先に現れた場合は 400
    pub fn linear_whitespace(limit: Limit) -> Self {
        Self::new(scan_linear_whitespace, "unexpected end of line", limit)
    }

    /// 空白 (SP / HTAB / CR / LF) まで読む
    pub fn whitespace(limit: Limit) -> Self {
        Self::new(scan_whitespace, "unexpected byte", limit)
    }

    /// 完了したら `(トークン, 終端バイト)` を返す
    pub fn advance<'a>(&mut self, cur: &mut Cursor<'a>) -> Result<Step<(&'a [u8], u8)>, Error> {
        let input = cur.remaining();
        for (i, &b) in input.iter().enumerate().skip(self.scanned) {
            match (self.scan)(b) {
                Scan::Continue => self.limit.check(i + 1)?,
                Scan::Stop => {
                    cur.advance(i);
                    self.scanned = 0;
                    return Ok(Step::Done((&input[..i], b)));
                }
                Scan::Reject => {
                    return Err(Error::bad_request(format!("{}: 0x{:02X}", self.reject, b)));
                }
            }
        }
        self.scanned = input.len();
        Ok(Step::Pending)
    }
}

fn scan_linear_whitespace(b: u8) -> Scan {
    match b {
        b' ' | b'\t' => Scan::Stop,
        b'\r' | b'\n' => Scan::Reject,
        _ => Scan::Continue,
    }
}

fn scan_whitespace(b: u8) -> Scan {
    if is_whitespace(b) {
        Scan::Stop
    } else {
        Scan::Continue
    }
}

/// CRLF まで読む
///
/// CR の直後が LF でない場合、その CR はトークンの一部として扱う。
#[derive(Debug, Clone)]
pub(crate) struct UntilCrlf {
    scanned: usize,
    limit: Limit,
}

impl UntilCrlf {
    pub fn new(limit: Limit) -> Self {
        Self { scanned: 0, limit }
    }

    /// 完了したら CR より前のバイト列を返す (CRLF は消費する)
    pub fn advance<'a>(&mut self, cur: &mut Cursor<'a>) -> Result<Step<&'a [u8]>, Error> {
        let input = cur.remaining();
        let mut i = self.scanned;
        while i < input.len() {
            if input[i] == b'\r' {
                match input.get(i + 1) {
                    Some(b'\n') => {
                        cur.advance(i + 2);
                        self.scanned = 0;
                        return Ok(Step::Done(&input[..i]));
                    }
                    Some(_) => {}
                    None => {
                        // CR の次のバイトを待つ
                        self.limit.check(i)?;
                        self.scanned = i;
                        return Ok(Step::Pending);
                    }
                }
            }
            self.limit.check(i + 1)?;
            i += 1;
        }
        self.scanned = input.len();
        Ok(Step::Pending)
    }
}

/// 判定関数が true の間スキップする
///
/// スキップしたバイトは確定的に消費する。
#[derive(Debug, Clone)]
pub(crate) struct SkipWhile {
    predicate: fn(u8) -> bool,
    skipped: usize,
    limit: Option<Limit>,
}

impl SkipWhile {
    pub fn new(predicate: fn(u8) -> bool) -> Self {
        Self {
            predicate,
            skipped: 0,
            limit: None,
        }
    }

    /// 線形空白 (SP / HTAB) をスキップする
    pub fn linear_whitespace() -> Self {
        Self::new(is_linear_whitespace)
    }

    /// スキップするバイト数を制限する
    pub fn limited(mut self, limit: Limit) -> Self {
        self.limit = Some(limit);
        self
    }

    /// 完了したらスキップしたバイト数を返す
    pub fn advance(&mut self, cur: &mut Cursor<'_>) -> Result<Step<usize>, Error> {
        let input = cur.remaining();
        let n = input
            .iter()
            .position(|&b| !(self.predicate)(b))
            .unwrap_or(input.len());
        cur.advance(n);
        self.skipped += n;
        if let Some(limit) = &self.limit {
            limit.check(self.skipped)?;
        }
        if cur.is_empty() {
            return Ok(Step::Pending);
        }
        Ok(Step::Done(std::mem::take(&mut self.skipped)))
    }
}

/// 固定長を読む
///
/// 到着したバイトはその場で消費して内部に蓄積する。
#[derive(Debug, Clone)]
pub(crate) struct FixedLength {
    remaining: usize,
    data: Vec<u8>,
}

/// 事前確保の上限
const PREALLOCATE_LIMIT: usize = 64 * 1024;

impl FixedLength {
    pub fn new(len: usize) -> Self {
        Self {
            remaining: len,
            data: Vec::with_capacity(len.min(PREALLOCATE_LIMIT)),
        }
    }

    /// 完了したらちょうど `len` バイトを返す
    pub fn advance(&mut self, cur: &mut Cursor<'_>) -> Step<Vec<u8>> {
        let chunk = cur.take(self.remaining);
        self.data.extend_from_slice(chunk);
        self.remaining -= chunk.len();
        if self.remaining > 0 {
            return Step::Pending;
        }
        Step::Done(std::mem::take(&mut self.data))
    }
}

/// 接続が閉じられるまで読む
///
/// `cap` バイトに達した時点でも完了する。
#[derive(Debug, Clone)]
pub(crate) struct UntilDisconnect {
    cap: usize,
    data: Vec<u8>,
}

impl UntilDisconnect {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            data: Vec::new(),
        }
    }

    /// 上限に達したら蓄積したバイト列を返す
    pub fn advance(&mut self, cur: &mut Cursor<'_>) -> Step<Vec<u8>> {
        let room = self.cap - self.data.len();
        let chunk = cur.take(room);
        self.data.extend_from_slice(chunk);
        if self.data.len() < self.cap {
            return Step::Pending;
        }
        Step::Done(std::mem::take(&mut self.data))
    }

    /// 接続終了による完了
    pub fn finish(self) -> Vec<u8> {
        self.data
    }
}

/// 現在位置が CRLF かどうかを判定する
///
/// CRLF なら消費して true、CR 以外のバイトなら何も消費せず false。
/// CR の後に LF 以外が続く場合は 400。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct CrlfCheck;

impl CrlfCheck {
    pub fn advance(&mut self, cur: &mut Cursor<'_>) -> Result<Step<bool>, Error> {
        let input = cur.remaining();
        match input.first() {
            None => Ok(Step::Pending),
            Some(b'\r') => match input.get(1) {
                None => Ok(Step::Pending),
                Some(b'\n') => {
                    cur.advance(2);
                    Ok(Step::Done(true))
                }
                Some(&b) => Err(Error::bad_request(format!(
                    "expected LF after CR but was 0x{:02X}",
                    b
                ))),
            },
            Some(_) => Ok(Step::Done(false)),
        }
    }
}
