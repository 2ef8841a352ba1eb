use std::{
    io::{self, Write},
    ops::{Deref, DerefMut},
    pin::Pin,
    task::{Context, Poll},
};

use tokio::io::AsyncWrite;

/// A `Vec<u8>` with reservable front space.
///
/// Meant for packet serialization: the body is written first, and once its
/// length is known the length-prefix varint is written into the reserved
/// front space without reallocating or shifting the body. Calling
/// `set_in_front` more than once fills the reserved space back-to-front.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FrontVec {
    buf: Vec<u8>,
    front_space: usize,
}

impl FrontVec {
    /// Creates a new `FrontVec` with the given reserved front space and extra capacity.
    #[must_use]
    pub fn capacity(reserve: usize, capacity: usize) -> Self {
        let total = reserve + capacity;
        let mut buf = Vec::with_capacity(total);

        #[allow(clippy::uninit_vec, reason = "immediately filled by set_in_front before any read")]
        unsafe {
            buf.set_len(reserve);
        }

        Self {
            buf,
            front_space: reserve,
        }
    }

    /// Creates a new `FrontVec` with the given reserved front space.
    #[must_use]
    pub fn new(reserve: usize) -> Self {
        Self::capacity(reserve, 0)
    }

    /// Returns the length of the written body, excluding unused reserved space.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.buf.len() - self.front_space
    }

    /// Returns whether the body is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pushes a byte to the back.
    pub fn push(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Extends the back with a slice.
    pub fn extend_from_slice(&mut self, other: &[u8]) {
        self.buf.extend_from_slice(other);
    }

    /// Writes `other` into the reserved front space, nearest-to-body first.
    ///
    /// # Panics
    /// Panics if there is not enough reserved space left.
    #[track_caller]
    pub fn set_in_front(&mut self, other: &[u8]) {
        assert!(self.front_space >= other.len(), "not enough reserved space");

        let new_start = self.front_space - other.len();
        self.buf[new_start..self.front_space].copy_from_slice(other);
        self.front_space = new_start;
    }

    /// Returns the written portion as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[self.front_space..]
    }

    /// Returns the written portion as a mutable slice.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        let len = self.buf.len();
        &mut self.buf[self.front_space..len]
    }
}

impl Write for FrontVec {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AsyncWrite for FrontVec {
    fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        this.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl Deref for FrontVec {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl DerefMut for FrontVec {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn front_space_reservation_and_write_safe() {
        let mut fv = FrontVec::capacity(4, 8);

        assert_eq!(fv.front_space, 4);
        assert_eq!(fv.len(), 0);
        assert_eq!(fv.as_slice(), &[] as &[u8]);

        fv.extend_from_slice(&[1, 2, 3]);
        assert_eq!(fv.as_slice(), &[1, 2, 3]);

        fv.set_in_front(&[0xAA, 0xBB]);
        assert_eq!(fv.as_slice(), &[0xAA, 0xBB, 1, 2, 3]);

        fv.set_in_front(&[0xCC]);
        assert_eq!(fv.as_slice(), &[0xCC, 0xAA, 0xBB, 1, 2, 3]);

        assert_eq!(fv.front_space, 1);
    }

    #[test]
    #[should_panic(expected = "not enough reserved space")]
    fn set_in_front_panics_if_no_space() {
        let mut fv = FrontVec::capacity(2, 4);
        fv.set_in_front(&[1, 2, 3]);
    }
}
