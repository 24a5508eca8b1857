//! Probe responder: answers device queries (DSR, CPR, DA) with bytes
//! pushed to an outbound sink.
//!
//! The sink is supplied at construction and must never block: it returns
//! `false` to refuse a response, in which case the bytes are dropped and
//! the caller counts the loss. Responses are emitted in request order.

use tracing::trace;

/// Outbound response sink.
///
/// Invoked with the exact bytes to write back to the PTY master, verbatim
/// and in order. Returns `false` if the response cannot be accepted (e.g.
/// a bounded queue is full); the response is then dropped.
pub type ResponseSink = Box<dyn FnMut(&[u8]) -> bool + Send>;

/// Default primary DA reply: a VT102-class terminal.
pub const DEFAULT_DA_PRIMARY: &[u8] = b"\x1b[?6c";

/// Default secondary DA reply: VT100-family, firmware 95.
pub const DEFAULT_DA_SECONDARY: &[u8] = b"\x1b[>0;95;0c";

/// A device query that requires a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalQuery {
    /// DSR 5: operating status.
    DeviceStatus,
    /// DSR 6: cursor position report.
    CursorPosition,
    /// DA1 (`CSI c`) and DECID (`ESC Z`).
    PrimaryAttributes,
    /// DA2 (`CSI > c`).
    SecondaryAttributes,
}

/// Cursor coordinates captured at query time, 0-indexed.
///
/// With origin mode active the row is already region-relative; the report
/// below only converts to the wire's 1-indexed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplyContext {
    pub row: u16,
    pub col: u16,
}

/// Build the response bytes for a query.
pub fn reply_for_query(
    query: TerminalQuery,
    ctx: ReplyContext,
    da_primary: &[u8],
    da_secondary: &[u8],
) -> Vec<u8> {
    match query {
        TerminalQuery::DeviceStatus => b"\x1b[0n".to_vec(),
        TerminalQuery::CursorPosition => {
            format!("\x1b[{};{}R", ctx.row + 1, ctx.col + 1).into_bytes()
        }
        TerminalQuery::PrimaryAttributes => da_primary.to_vec(),
        TerminalQuery::SecondaryAttributes => da_secondary.to_vec(),
    }
}

/// Owns the sink and the configured identification strings.
pub struct ReplyEngine {
    sink: Option<ResponseSink>,
    da_primary: Vec<u8>,
    da_secondary: Vec<u8>,
}

impl std::fmt::Debug for ReplyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyEngine")
            .field("sink", &self.sink.is_some())
            .field("da_primary", &self.da_primary)
            .field("da_secondary", &self.da_secondary)
            .finish()
    }
}

impl ReplyEngine {
    /// Create an engine. `sink: None` means every response is dropped.
    pub fn new(sink: Option<ResponseSink>, da_primary: Vec<u8>) -> Self {
        Self {
            sink,
            da_primary,
            da_secondary: DEFAULT_DA_SECONDARY.to_vec(),
        }
    }

    /// Answer a query. Returns `false` if the response was dropped
    /// (no sink, or the sink refused the bytes).
    pub fn respond(&mut self, query: TerminalQuery, ctx: ReplyContext) -> bool {
        let bytes = reply_for_query(query, ctx, &self.da_primary, &self.da_secondary);
        trace!(?query, len = bytes.len(), "terminal query response");
        match &mut self.sink {
            Some(sink) => sink(&bytes),
            None => false,
        }
    }
}
