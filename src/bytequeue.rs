//! An append-only queue of byte chunks supporting O(1) enqueue and O(k)
//! prefix splitting without copying payloads.
//!
//! Chunks are [`bytes::Bytes`] rather than owned buffers: slicing a `Bytes`
//! is a refcount bump, not a copy, which is what lets
//! [`ByteQueue::split_prefix`] hand back a view that spans multiple source
//! chunks without flattening them. New chunks can be appended after
//! construction, which is what lets an incremental parser get fed bytes as
//! they arrive off the wire.

use std::collections::VecDeque;
use std::fmt;

use bytes::Bytes;

/// A FIFO of byte chunks.
///
/// `ByteQueue` is the substrate [`Parser`](crate::parser::Parser) consumes:
/// callers [`append`](Self::append) chunks as they arrive and the parser
/// calls [`split_prefix`](Self::split_prefix) to take however many bytes it
/// currently needs, getting back a deficit instead of blocking when there
/// aren't enough.
#[derive(Clone, Default)]
pub struct ByteQueue {
    chunks: VecDeque<Bytes>,
    len: usize,
}

impl ByteQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of bytes to the back of the queue. O(1).
    pub fn append(&mut self, chunk: impl Into<Bytes>) {
        let chunk = chunk.into();
        if chunk.is_empty() {
            return;
        }

        self.len += chunk.len();
        self.chunks.push_back(chunk);
    }

    /// The number of bytes currently queued.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Split the first `n` bytes off the front of the queue and return them
    /// as a [`ByteView`], leaving the queue's next view starting exactly at
    /// byte `n`.
    ///
    /// `split_prefix(0)` is a no-op that returns an empty view. If fewer
    /// than `n` bytes are queued, the queue is left untouched and
    /// `Err(deficit)` is returned with `deficit = n - len()`.
    pub fn split_prefix(&mut self, n: usize) -> Result<ByteView, usize> {
        if n == 0 {
            return Ok(ByteView::default());
        }

        if self.len < n {
            return Err(n - self.len);
        }

        let mut taken = Vec::with_capacity(2);
        let mut remaining = n;

        while remaining > 0 {
            // `split_prefix` only removes what it needs, so this will never
            // run past a queue that was just checked to hold >= n bytes.
            let front = self.chunks.front_mut().expect("queue underflow");

            if front.len() <= remaining {
                remaining -= front.len();
                taken.push(self.chunks.pop_front().unwrap());
            } else {
                let rest = front.split_off(remaining);
                taken.push(std::mem::replace(front, rest));
                remaining = 0;
            }
        }

        self.len -= n;
        Ok(ByteView { chunks: taken })
    }

    /// Like [`split_prefix`](Self::split_prefix) but does not remove the
    /// bytes from the queue; the returned view still avoids allocating a
    /// contiguous buffer when the prefix spans more than one chunk.
    pub fn clone_prefix_as_view(&self, n: usize) -> Result<ByteView, usize> {
        if n == 0 {
            return Ok(ByteView::default());
        }

        if self.len < n {
            return Err(n - self.len);
        }

        let mut taken = Vec::with_capacity(2);
        let mut remaining = n;

        for chunk in &self.chunks {
            if remaining == 0 {
                break;
            }

            if chunk.len() <= remaining {
                remaining -= chunk.len();
                taken.push(chunk.clone());
            } else {
                taken.push(chunk.slice(0..remaining));
                remaining = 0;
            }
        }

        Ok(ByteView { chunks: taken })
    }
}

impl fmt::Debug for ByteQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteQueue")
            .field("len", &self.len)
            .field("chunks", &self.chunks.len())
            .finish()
    }
}

impl PartialEq for ByteQueue {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && chunk_iter_eq(self.chunks.iter(), other.chunks.iter())
    }
}

impl Eq for ByteQueue {}

/// A contiguous-looking view over part of a [`ByteQueue`], possibly backed
/// by more than one underlying chunk.
///
/// Equality compares logical content, not chunk boundaries: a view built
/// from `[[1, 2, 3], [4, 5]]` equals one built from `[[1, 2], [3, 4, 5]]`.
#[derive(Clone, Default)]
pub struct ByteView {
    chunks: Vec<Bytes>,
}

impl From<Bytes> for ByteView {
    fn from(bytes: Bytes) -> Self {
        if bytes.is_empty() {
            Self::default()
        } else {
            Self { chunks: vec![bytes] }
        }
    }
}

impl ByteView {
    /// The number of bytes in this view.
    pub fn len(&self) -> usize {
        self.chunks.iter().map(Bytes::len).sum()
    }

    /// Whether this view is empty.
    pub fn is_empty(&self) -> bool {
        self.chunks.iter().all(|c| c.is_empty())
    }

    /// Flatten this view into a single contiguous buffer.
    ///
    /// This is the only copying path in `ByteQueue`/`ByteView`; it is only
    /// exercised when a view spans more than one chunk, which in steady
    /// state is bounded by the widest integer field (8 bytes).
    pub fn to_bytes(&self) -> Bytes {
        match self.chunks.as_slice() {
            [] => Bytes::new(),
            [one] => one.clone(),
            many => {
                let mut buf = Vec::with_capacity(self.len());
                for chunk in many {
                    buf.extend_from_slice(chunk);
                }
                Bytes::from(buf)
            }
        }
    }

    /// Flatten this view into exactly `N` bytes.
    ///
    /// # Panics
    /// Panics if the view does not contain exactly `N` bytes. Callers
    /// within this crate only ever request this for an [`IntSpec`]'s width,
    /// which is always known to match.
    ///
    /// [`IntSpec`]: crate::intcodec::IntSpec
    pub(crate) fn to_array<const N: usize>(&self) -> [u8; N] {
        assert_eq!(self.len(), N, "view length did not match requested array size");

        let mut out = [0u8; N];
        let mut offset = 0;
        for chunk in &self.chunks {
            out[offset..offset + chunk.len()].copy_from_slice(chunk);
            offset += chunk.len();
        }
        out
    }

    /// Iterate over the bytes in this view, without flattening.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.chunks.iter().flat_map(|c| c.iter().copied())
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::util::fmt::HexStr(&self.to_bytes()).fmt(f)
    }
}

impl PartialEq for ByteView {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl Eq for ByteView {}

impl PartialEq<[u8]> for ByteView {
    fn eq(&self, other: &[u8]) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter().copied())
    }
}

fn chunk_iter_eq<'a>(
    a: impl Iterator<Item = &'a Bytes>,
    b: impl Iterator<Item = &'a Bytes>,
) -> bool {
    a.flat_map(|c| c.iter().copied()).eq(b.flat_map(|c| c.iter().copied()))
}
