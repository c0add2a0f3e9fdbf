// Pooled response wrapper and its native-writer adapter

use super::Header;
use crate::engine::native::{NativeHeaders, NativeResponse, ResponseWriter};
use http::StatusCode;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, Ordering};
use tracing::warn;

/// Commit bookkeeping shared by a `Response` and its adapter.
#[derive(Debug)]
pub(crate) struct WriteState {
    committed: AtomicBool,
    status: AtomicU16,
    size: AtomicU64,
}

impl Default for WriteState {
    fn default() -> Self {
        Self {
            committed: AtomicBool::new(false),
            status: AtomicU16::new(StatusCode::OK.as_u16()),
            size: AtomicU64::new(0),
        }
    }
}

impl WriteState {
    fn clear(&self) {
        self.committed.store(false, Ordering::Release);
        self.status.store(StatusCode::OK.as_u16(), Ordering::Relaxed);
        self.size.store(0, Ordering::Relaxed);
    }

    fn write_header(&self, writer: &NativeResponse, status: StatusCode) {
        if self.committed.swap(true, Ordering::AcqRel) {
            warn!(status = %status, "response already committed");
            return;
        }
        self.status.store(status.as_u16(), Ordering::Relaxed);
        writer.write_header(status);
    }

    fn write(&self, writer: &NativeResponse, buf: &[u8]) -> io::Result<usize> {
        if self
            .committed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.status.store(StatusCode::OK.as_u16(), Ordering::Relaxed);
            writer.write_header(StatusCode::OK);
        }
        let n = writer.write(buf)?;
        self.size.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}

fn not_bound() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "response is not bound")
}

/// The response currently being written.
///
/// Wraps the transport writer together with a pooled [`ResponseAdapter`] and
/// a pooled [`Header`] bound to the writer's header collection.
#[derive(Debug, Default)]
pub struct Response {
    writer: Option<NativeResponse>,
    adapter: Option<Box<ResponseAdapter>>,
    header: Option<Box<Header>>,
    state: Arc<WriteState>,
}

static UNBOUND_HEADER: Header = Header::unbound();

impl Response {
    /// Bind to a transport writer and zero the bookkeeping. `header` must
    /// already be bound to the writer's header collection; `adapter` is
    /// rebound here.
    pub(crate) fn reset(
        &mut self,
        writer: NativeResponse,
        mut adapter: Box<ResponseAdapter>,
        header: Box<Header>,
    ) {
        self.state.clear();
        self.writer = Some(writer);
        adapter.reset(self);
        self.adapter = Some(adapter);
        self.header = Some(header);
    }

    /// Drop the transport binding and hand back the sub-wrappers.
    pub(crate) fn unbind(&mut self) -> (Option<Box<ResponseAdapter>>, Option<Box<Header>>) {
        self.writer = None;
        let mut adapter = self.adapter.take();
        let mut header = self.header.take();
        if let Some(adapter) = adapter.as_mut() {
            adapter.clear();
        }
        if let Some(header) = header.as_mut() {
            header.clear();
        }
        (adapter, header)
    }

    pub fn header(&self) -> &Header {
        self.header.as_deref().unwrap_or(&UNBOUND_HEADER)
    }

    /// Send the status line. A second call is ignored.
    pub fn write_header(&self, status: StatusCode) {
        if let Some(writer) = &self.writer {
            self.state.write_header(writer, status);
        }
    }

    /// Append to the body, committing `200 OK` first if nothing was sent yet.
    pub fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let writer = self.writer.as_ref().ok_or_else(not_bound)?;
        self.state.write(writer, buf)
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.state.status.load(Ordering::Relaxed)).unwrap_or(StatusCode::OK)
    }

    /// Body bytes written so far.
    pub fn size(&self) -> u64 {
        self.state.size.load(Ordering::Relaxed)
    }

    pub fn committed(&self) -> bool {
        self.state.committed.load(Ordering::Acquire)
    }

    /// The raw transport writer, bypassing the bookkeeping.
    pub fn writer(&self) -> Option<&NativeResponse> {
        self.writer.as_ref()
    }

    /// This response presented as a native writer.
    pub fn adapter(&self) -> Option<&ResponseAdapter> {
        self.adapter.as_deref()
    }
}

/// A [`Response`] seen through the native writer contract.
///
/// Writes made by native handlers through the adapter update the owning
/// response's commit state and byte count.
#[derive(Debug, Default)]
pub struct ResponseAdapter {
    writer: Option<NativeResponse>,
    state: Option<Arc<WriteState>>,
}

impl ResponseAdapter {
    pub(crate) fn reset(&mut self, response: &Response) {
        self.writer = response.writer.clone();
        self.state = Some(Arc::clone(&response.state));
    }

    pub(crate) fn clear(&mut self) {
        self.writer = None;
        self.state = None;
    }

    pub fn is_bound(&self) -> bool {
        self.writer.is_some()
    }

    /// Whether this adapter proxies to `response`.
    pub fn proxies(&self, response: &Response) -> bool {
        self.state
            .as_ref()
            .is_some_and(|s| Arc::ptr_eq(s, &response.state))
    }
}

impl ResponseWriter for ResponseAdapter {
    fn headers(&self) -> NativeHeaders {
        self.writer
            .as_ref()
            .map(|w| w.headers())
            .unwrap_or_default()
    }

    fn write_header(&self, status: StatusCode) {
        if let (Some(writer), Some(state)) = (&self.writer, &self.state) {
            state.write_header(writer, status);
        }
    }

    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        match (&self.writer, &self.state) {
            (Some(writer), Some(state)) => state.write(writer, buf),
            _ => Err(not_bound()),
        }
    }
}
