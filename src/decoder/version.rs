//! プロトコルバージョンのデコード

use crate::error::Error;
use crate::version::Version;

use super::cursor::{Cursor, Step, ready};
use super::primitive::{Limit, UntilDelimiter};

/// 空白 (SP / HTAB / CR / LF) までをバージョントークンとして読む
///
/// 終端の空白は消費しない。
#[derive(Debug, Clone)]
pub(crate) struct VersionDecoder {
    token: UntilDelimiter,
}

impl VersionDecoder {
    pub fn new(limit: Limit) -> Self {
        Self {
            token: UntilDelimiter::whitespace(limit),
        }
    }

    pub fn advance(&mut self, cur: &mut Cursor<'_>) -> Result<Step<Version>, Error> {
        let (token, _) = ready!(self.token.advance(cur)?);
        match Version::from_bytes(token) {
            Some(version) => Ok(Step::Done(version)),
            None => Err(Error::version_not_supported(format!(
                "unsupported HTTP version: {:?}",
                String::from_utf8_lossy(token)
            ))),
        }
    }
}
