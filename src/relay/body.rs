//! Streamed upstream bodies with a run-once release hook.
//!
//! The upstream connection lives inside the wrapped stream. It is released,
//! and the release hook fires, exactly once: when the stream is exhausted,
//! when the origin read fails, or when the stream is dropped before either
//! (the client went away and hyper dropped the response body).

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::BoxError;
use bytes::Bytes;
use futures_util::stream::{BoxStream, Stream, StreamExt};

use crate::observability::metrics;

/// Why an upstream stream let go of its connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// The origin body was forwarded to the end.
    Completed,
    /// Reading from the origin failed mid-body.
    Failed,
    /// The consumer stopped pulling before the end.
    Abandoned,
}

impl Release {
    pub fn as_str(&self) -> &'static str {
        match self {
            Release::Completed => "completed",
            Release::Failed => "failed",
            Release::Abandoned => "abandoned",
        }
    }
}

type ReleaseHook = Box<dyn FnOnce(Release, u64) + Send>;

/// Forward-only body read straight from the upstream connection.
pub struct UpstreamStream {
    inner: Option<BoxStream<'static, Result<Bytes, BoxError>>>,
    on_release: Option<ReleaseHook>,
    forwarded: u64,
}

impl UpstreamStream {
    /// Wrap a live origin response. Logs and records metrics on release.
    pub fn from_response(response: reqwest::Response) -> Self {
        let target = response.url().to_string();
        let opened = Instant::now();
        metrics::stream_opened();

        let stream = response.bytes_stream().map(|chunk| chunk.map_err(BoxError::from));
        Self::with_hook(stream, move |reason, bytes| {
            metrics::stream_released(reason.as_str(), bytes);
            tracing::debug!(
                target_url = %target,
                reason = reason.as_str(),
                bytes,
                elapsed_ms = opened.elapsed().as_millis() as u64,
                "Released upstream connection"
            );
        })
    }

    /// Wrap any chunk stream, running `on_release` exactly once.
    pub fn with_hook<S, F>(stream: S, on_release: F) -> Self
    where
        S: Stream<Item = Result<Bytes, BoxError>> + Send + 'static,
        F: FnOnce(Release, u64) + Send + 'static,
    {
        Self {
            inner: Some(stream.boxed()),
            on_release: Some(Box::new(on_release)),
            forwarded: 0,
        }
    }

    /// Bytes handed to the consumer so far.
    pub fn forwarded(&self) -> u64 {
        self.forwarded
    }

    fn release(&mut self, reason: Release) {
        // Dropping the inner stream closes the upstream connection.
        self.inner = None;
        if let Some(hook) = self.on_release.take() {
            hook(reason, self.forwarded);
        }
    }
}

impl Stream for UpstreamStream {
    type Item = Result<Bytes, BoxError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        match inner.as_mut().poll_next(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(chunk))) => {
                this.forwarded += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(err))) => {
                tracing::warn!(error = %err, forwarded = this.forwarded, "Upstream body read failed");
                this.release(Release::Failed);
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.release(Release::Completed);
                Poll::Ready(None)
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            Some(inner) => inner.size_hint(),
            None => (0, Some(0)),
        }
    }
}

impl Drop for UpstreamStream {
    fn drop(&mut self) {
        self.release(Release::Abandoned);
    }
}

impl fmt::Debug for UpstreamStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamStream")
            .field("open", &self.inner.is_some())
            .field("forwarded", &self.forwarded)
            .finish()
    }
}
