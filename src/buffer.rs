//! Component A — typed, growable byte buffers with overlay support.
//!
//! Mirrors genozip's `Buffer` (`buffer.c`): a named, typed, growable region of
//! memory that can either own its storage or overlay a read-only base (used
//! for a VBlock's `ol_dict`/`ol_nodes`, which alias the z_file-wide dictionary
//! up to the point the VBlock was opened). Growth doubles capacity, matching
//! the C `buf_alloc` strategy.

use std::ops::{Deref, DerefMut};

/// What a [`Buffer`] is permitted to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// Owns its storage; may grow and be written.
    Owned,
    /// Aliases another buffer's storage up to a fixed length; read-only.
    Overlay,
}

/// A named, growable, typed byte buffer.
///
/// `T` is typically `u8` (raw bytes) or a fixed-size record type (e.g. a b250
/// word index `u32`, or a `RAEntry`). Overlay buffers share the `Owned`
/// buffer's allocation read-only: `of_len` bytes are visible, and writes are
/// rejected.
#[derive(Debug, Clone)]
pub struct Buffer<T> {
    pub name: &'static str,
    data: Vec<T>,
    kind: BufferKind,
    /// For overlay buffers: the number of elements visible from the base.
    overlay_len: usize,
}

impl<T: Clone + Default> Buffer<T> {
    pub fn new(name: &'static str) -> Self {
        Buffer {
            name,
            data: Vec::new(),
            kind: BufferKind::Owned,
            overlay_len: 0,
        }
    }

    pub fn with_capacity(name: &'static str, cap: usize) -> Self {
        Buffer {
            name,
            data: Vec::with_capacity(cap),
            kind: BufferKind::Owned,
            overlay_len: 0,
        }
    }

    /// Creates a read-only overlay exposing the first `len` elements of `base`.
    pub fn overlay(name: &'static str, base: &Buffer<T>, len: usize) -> Self {
        let len = len.min(base.data.len());
        Buffer {
            name,
            data: base.data[..len].to_vec(),
            kind: BufferKind::Overlay,
            overlay_len: len,
        }
    }

    pub fn is_overlay(&self) -> bool {
        self.kind == BufferKind::Overlay
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn overlay_len(&self) -> usize {
        self.overlay_len
    }

    /// Appends `item`, doubling capacity on overflow like `buf_alloc`.
    ///
    /// Panics (a programmer-error bug, not a runtime condition) if called on
    /// an overlay buffer — overlays are read-only by construction.
    pub fn push(&mut self, item: T) {
        assert!(
            self.kind == BufferKind::Owned,
            "cannot push to overlay buffer {}",
            self.name
        );
        if self.data.len() == self.data.capacity() {
            let new_cap = (self.data.capacity() * 2).max(16);
            self.data.reserve(new_cap - self.data.capacity());
        }
        self.data.push(item);
    }

    pub fn extend_from_slice(&mut self, items: &[T]) {
        assert!(
            self.kind == BufferKind::Owned,
            "cannot extend overlay buffer {}",
            self.name
        );
        self.data.extend_from_slice(items);
    }

    pub fn clear(&mut self) {
        assert!(self.kind == BufferKind::Owned, "cannot clear overlay buffer {}", self.name);
        self.data.clear();
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        assert!(self.kind == BufferKind::Owned, "cannot mutate overlay buffer {}", self.name);
        &mut self.data
    }
}

impl<T: Clone + Default> Deref for Buffer<T> {
    type Target = [T];
    fn deref(&self) -> &[T] {
        &self.data
    }
}

impl<T: Clone + Default> DerefMut for Buffer<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        assert!(self.kind == BufferKind::Owned, "cannot mutate overlay buffer {}", self.name);
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_grow() {
        let mut b: Buffer<u8> = Buffer::new("test");
        for i in 0..100u8 {
            b.push(i);
        }
        assert_eq!(b.len(), 100);
        assert_eq!(b[50], 50);
    }

    #[test]
    fn overlay_sees_prefix_of_base() {
        let mut base: Buffer<u32> = Buffer::new("base");
        base.extend_from_slice(&[1, 2, 3, 4, 5]);
        let ov = Buffer::overlay("ov", &base, 3);
        assert!(ov.is_overlay());
        assert_eq!(ov.as_slice(), &[1, 2, 3]);
    }

    #[test]
    #[should_panic]
    fn overlay_push_panics() {
        let mut base: Buffer<u32> = Buffer::new("base");
        base.push(1);
        let mut ov = Buffer::overlay("ov", &base, 1);
        ov.push(2);
    }
}
