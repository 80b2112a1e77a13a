//! Response body decorator that reports the size of every write.
//!
//! In the hyper/tower model a response is "written" when the transport polls
//! the body for frames. [`CountingBody`] relays each frame unchanged and hands
//! the size of every data frame to its callback before the frame is returned,
//! so the callback for write N has completed before write N+1 is polled.
//! Status and headers live in the response head and are never touched.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Buf;
use http_body::{Body, Frame, SizeHint};
use pin_project::pin_project;

/// Callback receiving the byte count of each write.
pub type OnWrite = Box<dyn FnMut(usize) + Send>;

/// A 1:1 relay over an inner body. No buffering.
///
/// The callback is released (dropped) as soon as the inner body reports
/// end-of-stream, or when the body itself is dropped, whichever comes first.
#[pin_project]
pub struct CountingBody<B> {
    #[pin]
    inner: B,
    on_write: Option<OnWrite>,
}

impl<B> CountingBody<B> {
    /// Wrap `inner`, reporting each write to `on_write`.
    pub fn new<F>(inner: B, on_write: F) -> Self
    where
        F: FnMut(usize) + Send + 'static,
    {
        Self {
            inner,
            on_write: Some(Box::new(on_write)),
        }
    }

    /// Wrap `inner` without accounting (unmetered requests).
    pub fn passthrough(inner: B) -> Self {
        Self {
            inner,
            on_write: None,
        }
    }

    /// Whether writes are still being reported.
    pub fn is_metered(&self) -> bool {
        self.on_write.is_some()
    }

    pub fn get_ref(&self) -> &B {
        &self.inner
    }
}

impl<B> std::fmt::Debug for CountingBody<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountingBody")
            .field("metered", &self.is_metered())
            .finish_non_exhaustive()
    }
}

impl<B> Body for CountingBody<B>
where
    B: Body,
{
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.project();

        match this.inner.poll_frame(cx) {
            Poll::Ready(Some(Ok(frame))) => {
                // trailers carry no payload
                if let (Some(on_write), Some(data)) = (this.on_write.as_mut(), frame.data_ref()) {
                    on_write(data.remaining());
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Poll::Ready(Some(Err(e))) => {
                // A failed write still reports what it claims to have written.
                if let Some(on_write) = this.on_write.as_mut() {
                    on_write(0);
                }
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.on_write.take();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
