//! ボディデコードと接続切断のテスト
//!
//! 不完全なボディ (接続切断シナリオ) が正しく検出されることを確認する。
//!
//! 切断は `mark_eof()` で通知する。結果は次の 4 通り。
//!
//! - `EofOutcome::Clean`: デコード途中のメッセージはない
//! - `EofOutcome::Complete`: close-delimited レスポンスが切断で完了した
//! - `EofOutcome::Abandoned`: デコード途中のメッセージを破棄した
//! - `EofOutcome::Failed`: デコードはエラーで停止していた
//!
//! `Abandoned` はプロトコル違反ではないのでエラーレスポンスは返さない。
//! 部分的なメッセージがアプリケーションに渡ることはない。

use shiguredo_http11_decoder::{
    BodyKind, DecodeState, DecoderLimits, EofOutcome, HttpMessage, RequestDecoder,
    ResponseDecoder,
};

/// Content-Length より少ないデータで切断されたリクエスト
#[test]
fn incomplete_content_length_body() {
    let mut decoder = RequestDecoder::new();
    let requests = decoder
        .feed(b"POST / HTTP/1.1\r\nHost: example.com\r\nContent-Length: 100\r\n\r\n")
        .unwrap();
    assert!(requests.is_empty());
    // 100 バイト中 50 バイトのみ
    assert!(decoder.feed(&[0u8; 50]).unwrap().is_empty());
    assert_eq!(
        decoder.state(),
        DecodeState::Body(BodyKind::ContentLength(100))
    );

    assert_eq!(decoder.mark_eof(), EofOutcome::Abandoned);
    assert!(decoder.is_idle());
}

/// 終端チャンクの前に切断されたリクエスト
#[test]
fn incomplete_chunked_body() {
    let mut decoder = RequestDecoder::new();
    let requests = decoder
        .feed(b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n")
        .unwrap();
    assert!(requests.is_empty());
    assert_eq!(decoder.state(), DecodeState::Body(BodyKind::Chunked));
    assert_eq!(decoder.mark_eof(), EofOutcome::Abandoned);
}

/// トレーラーの途中で切断されたレスポンス
#[test]
fn incomplete_chunked_trailer() {
    let mut decoder = ResponseDecoder::new();
    decoder
        .feed(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n0\r\nX-Trailer: 1\r\n")
        .unwrap();
    assert_eq!(decoder.mark_eof(), EofOutcome::Abandoned);
}

/// 長さの指定がないレスポンスは切断で完了する
#[test]
fn close_delimited_response_completes_on_disconnect() {
    let mut decoder = ResponseDecoder::new();
    decoder.feed(b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\n").unwrap();
    assert!(decoder.is_close_delimited());
    for part in [&b"hello "[..], b"world"] {
        assert!(decoder.feed(part).unwrap().is_empty());
    }

    match decoder.mark_eof() {
        EofOutcome::Complete(response) => {
            assert_eq!(response.status_code(), 200);
            assert_eq!(response.body(), b"hello world");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

/// ボディが空のまま切断されても完了する
#[test]
fn close_delimited_empty_body() {
    let mut decoder = ResponseDecoder::new();
    decoder.feed(b"HTTP/1.0 200 OK\r\n\r\n").unwrap();
    let EofOutcome::Complete(response) = decoder.mark_eof() else {
        panic!("expected complete response");
    };
    assert!(response.body().is_empty());
}

/// ステータスラインの途中の切断は破棄
#[test]
fn disconnect_in_status_line() {
    let mut decoder = ResponseDecoder::new();
    decoder.feed(b"HTTP/1.1 20").unwrap();
    assert_eq!(decoder.mark_eof(), EofOutcome::Abandoned);
}

/// メッセージ間の空行だけが残っている切断は正常
#[test]
fn disconnect_between_messages() {
    let mut decoder = RequestDecoder::new();
    let requests = decoder.feed(b"GET / HTTP/1.1\r\n\r\n\r\n").unwrap();
    assert_eq!(requests.len(), 1);
    assert!(decoder.is_idle());
    assert_eq!(decoder.mark_eof(), EofOutcome::Clean);
}

/// 切断後のデコーダーは新しい接続に再利用できる
#[test]
fn decoder_is_reusable_after_disconnect() {
    let limits = DecoderLimits {
        max_body_size: 1024,
        ..DecoderLimits::default()
    };
    let mut decoder = RequestDecoder::with_limits(limits.clone());
    decoder
        .feed(b"POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc")
        .unwrap();
    assert_eq!(decoder.mark_eof(), EofOutcome::Abandoned);

    assert_eq!(decoder.limits(), &limits);
    let requests = decoder
        .feed(b"POST / HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc")
        .unwrap();
    assert_eq!(requests[0].body(), b"abc");
}

/// 完成したレスポンスの後に不正なステータス行が続いたまま切断された
#[test]
fn violation_after_message_is_reported_at_eof() {
    let mut decoder = ResponseDecoder::new();
    let responses = decoder
        .feed(b"HTTP/1.1 204 No Content\r\n\r\nHTTP/9.9 200 OK\r\n\r\n")
        .unwrap();
    assert_eq!(responses.len(), 1);

    let EofOutcome::Failed(err) = decoder.mark_eof() else {
        panic!("expected failure");
    };
    assert_eq!(err.suggested_status(), 505);
    assert!(decoder.is_idle());
}
