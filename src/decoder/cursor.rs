//! 入力カーソルとデコード結果

/// 入力バッファ上の読み取り位置
///
/// 状態は確定的に消費したバイトの分だけ位置を進める。
/// 入力不足のときは位置を動かさない (または状態内に再開位置を保持する)。
#[derive(Debug)]
pub(crate) struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// 未消費のバイト列
    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    /// 消費済みバイト数
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    /// `n` バイト消費する
    pub fn advance(&mut self, n: usize) {
        debug_assert!(self.pos + n <= self.buf.len());
        self.pos = (self.pos + n).min(self.buf.len());
    }

    /// 最大 `n` バイトを消費して返す
    pub fn take(&mut self, n: usize) -> &'a [u8] {
        let input = self.remaining();
        let n = n.min(input.len());
        self.pos += n;
        &input[..n]
    }
}

/// 状態遷移の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step<T> {
    /// 入力不足。追加データを投入して再度呼び出す
    Pending,
    /// 完了
    Done(T),
}

/// `Step::Pending` なら呼び出し元からも `Pending` を返す
macro_rules! ready {
    ($e:expr) => {
        match $e {
            $crate::decoder::cursor::Step::Done(v) => v,
            $crate::decoder::cursor::Step::Pending => {
                return Ok($crate::decoder::cursor::Step::Pending);
            }
        }
    };
}

pub(crate) use ready;
