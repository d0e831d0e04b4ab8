//! 入力バッファとトップレベル状態機械の結合

use crate::error::Error;
use crate::limits::DecoderLimits;
use crate::log::{debug, trace};

use super::body::BodyKind;
use super::cursor::{Cursor, Step};

/// デコーダーの状態
///
/// どのデータも持たない、状態の名前だけを表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    /// 次のメッセージの開始前
    Init,
    /// メッセージ前の空行を読み飛ばしている
    SkipEmptyLines,
    /// request-line / status-line を読んでいる
    StartLine,
    /// ヘッダーを読んでいる
    Headers,
    /// ボディを読んでいる
    Body(BodyKind),
    /// メッセージを出力した直後
    Emitted,
    /// 打ち切った close-delimited レスポンスの後続データを破棄している
    Discarding,
    /// エラーで停止している
    ///
    /// `reset()` か `mark_eof()` で失敗は破棄され、初期状態に戻る
    Failed,
}

/// 接続終了時の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EofOutcome<T> {
    /// デコード途中のメッセージはない
    Clean,
    /// 接続終了で完了したメッセージ (close-delimited レスポンス)
    Complete(T),
    /// デコード途中のメッセージを破棄した
    ///
    /// プロトコル違反ではないので、エラーレスポンスは返さない
    Abandoned,
    /// デコードはエラーで停止していた
    ///
    /// 先に完成したメッセージと同じ `feed()` で検出したエラーもここで返る
    Failed(Error),
}

/// リクエスト / レスポンスのトップレベル状態機械
pub(crate) trait MessageMachine {
    type Message;

    fn advance(&mut self, cur: &mut Cursor<'_>) -> Result<Step<Self::Message>, Error>;

    fn state(&self) -> DecodeState;

    fn limits(&self) -> &DecoderLimits;

    /// 次のメッセージのために初期化する
    fn init(&mut self);

    /// 接続単位の設定も含めて初期化する
    fn reset(&mut self);

    /// 接続終了で完了するメッセージを取り出す
    fn finish(&mut self) -> Option<Self::Message>;
}

/// 受信バッファを持ち、状態機械を駆動する
#[derive(Debug)]
pub(crate) struct StreamDecoder<M> {
    buf: Vec<u8>,
    machine: M,
    failure: Option<Error>,
}

impl<M: MessageMachine> StreamDecoder<M> {
    pub fn new(machine: M) -> Self {
        Self {
            buf: Vec::new(),
            machine,
            failure: None,
        }
    }

    pub fn machine(&self) -> &M {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut M {
        &mut self.machine
    }

    /// データを追加し、完成したメッセージをすべて返す
    ///
    /// 途中でエラーになった場合、それまでのメッセージを返し、
    /// エラーは次の呼び出しで返す。
    pub fn feed(&mut self, data: &[u8]) -> Result<Vec<M::Message>, Error> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        self.buf.extend_from_slice(data);

        let mut messages = Vec::new();
        loop {
            match self.decode() {
                Ok(Some(message)) => messages.push(message),
                Ok(None) => break,
                Err(err) if messages.is_empty() => return Err(err),
                Err(_) => return Ok(messages),
            }
        }

        let limit = self.machine.limits().max_buffer_size;
        if self.buf.len() > limit {
            let err = Error::BufferOverflow {
                size: self.buf.len(),
                limit,
            };
            self.fail(err.clone());
            if messages.is_empty() {
                return Err(err);
            }
        }
        Ok(messages)
    }

    /// バッファ済みのデータから最大 1 つのメッセージをデコードする
    pub fn decode(&mut self) -> Result<Option<M::Message>, Error> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if self.machine.state() == DecodeState::Emitted {
            self.machine.init();
        }

        let mut cur = Cursor::new(&self.buf);
        let result = self.machine.advance(&mut cur);
        let consumed = cur.position();
        self.buf.drain(..consumed);

        match result {
            Ok(Step::Done(message)) => {
                trace!("message decoded: consumed={}", consumed);
                Ok(Some(message))
            }
            Ok(Step::Pending) => Ok(None),
            Err(err) => {
                debug!("decode failed: {}", err);
                self.fail(err.clone());
                Err(err)
            }
        }
    }

    /// 接続終了を通知する
    ///
    /// 結果を返した後、デコーダーは初期状態に戻る
    pub fn mark_eof(&mut self) -> EofOutcome<M::Message> {
        if let Some(err) = self.failure.take() {
            self.reset();
            return EofOutcome::Failed(err);
        }
        let state = self.machine.state();
        let outcome = match state {
            DecodeState::Failed | DecodeState::Discarding => EofOutcome::Clean,
            DecodeState::Init | DecodeState::SkipEmptyLines | DecodeState::Emitted
                if only_line_breaks(&self.buf) =>
            {
                EofOutcome::Clean
            }
            DecodeState::Body(BodyKind::CloseDelimited) => match self.machine.finish() {
                Some(message) => EofOutcome::Complete(message),
                None => EofOutcome::Abandoned,
            },
            _ => {
                debug!("decode abandoned by disconnect: state={:?}", state);
                EofOutcome::Abandoned
            }
        };
        self.reset();
        outcome
    }

    pub fn reset(&mut self) {
        self.buf.clear();
        self.failure = None;
        self.machine.reset();
    }

    pub fn remaining(&self) -> &[u8] {
        &self.buf
    }

    pub fn state(&self) -> DecodeState {
        if self.failure.is_some() {
            return DecodeState::Failed;
        }
        self.machine.state()
    }

    /// デコード途中のメッセージがないか
    pub fn is_idle(&self) -> bool {
        matches!(
            self.state(),
            DecodeState::Init | DecodeState::SkipEmptyLines | DecodeState::Emitted
        ) && only_line_breaks(&self.buf)
    }

    /// 途中まで集めたデータと未消費のバッファは破棄する
    fn fail(&mut self, err: Error) {
        self.failure = Some(err);
        self.buf.clear();
        self.machine.init();
    }
}

fn only_line_breaks(buf: &[u8]) -> bool {
    buf.iter().all(|&b| b == b'\r' || b == b'\n')
}
