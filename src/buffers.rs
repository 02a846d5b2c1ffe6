//! Double-buffered state storage.
//!
//! Compute-from-storage pipelines produce undefined results when the same
//! buffer is bound as both input and output of one pass, so each state grid
//! is held as a pair of storages that alternate roles every frame. The pair
//! is constructed from two distinct values, which makes read/write aliasing
//! within a step impossible by construction rather than something that has
//! to be detected at runtime.

/// A pair of same-shaped storages with a read/write role flag.
///
/// `read()` is the state the current frame samples from; `write()` is the
/// target the current frame commits into. `swap()` flips the roles and must
/// only be called after all passes of a frame have been issued.
#[derive(Debug)]
pub struct DoubleBuffer<T> {
    a: T,
    b: T,
    read_is_a: bool,
}

impl<T> DoubleBuffer<T> {
    /// Create a double buffer; `a` starts as the read side.
    pub fn new(a: T, b: T) -> Self {
        Self {
            a,
            b,
            read_is_a: true,
        }
    }

    /// The storage readable this frame.
    #[inline]
    pub fn read(&self) -> &T {
        if self.read_is_a {
            &self.a
        } else {
            &self.b
        }
    }

    /// The storage being written this frame. Never the same as `read()`.
    #[inline]
    pub fn write(&self) -> &T {
        if self.read_is_a {
            &self.b
        } else {
            &self.a
        }
    }

    /// Flip read/write roles. Call once per frame, after both passes.
    #[inline]
    pub fn swap(&mut self) {
        self.read_is_a = !self.read_is_a;
    }

    /// Whether storage `a` is currently the read side.
    #[inline]
    pub fn read_is_a(&self) -> bool {
        self.read_is_a
    }

    /// Both storages, for teardown.
    pub fn both(&self) -> (&T, &T) {
        (&self.a, &self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_starts_at_a() {
        let db = DoubleBuffer::new('a', 'b');
        assert_eq!(*db.read(), 'a');
        assert_eq!(*db.write(), 'b');
    }

    #[test]
    fn swap_flips_roles() {
        let mut db = DoubleBuffer::new(1, 2);
        db.swap();
        assert_eq!(*db.read(), 2);
        assert_eq!(*db.write(), 1);
    }

    // After N swaps, read() is A when N is even and B when N is odd.
    #[test]
    fn swap_parity_over_many_frames() {
        let mut db = DoubleBuffer::new("A", "B");
        for n in 1..=64 {
            db.swap();
            if n % 2 == 0 {
                assert_eq!(*db.read(), "A", "read should be A after {} swaps", n);
            } else {
                assert_eq!(*db.read(), "B", "read should be B after {} swaps", n);
            }
        }
    }

    #[test]
    fn read_and_write_never_alias() {
        let mut db = DoubleBuffer::new(0u32, 1u32);
        for _ in 0..8 {
            assert_ne!(db.read() as *const u32, db.write() as *const u32);
            db.swap();
        }
    }
}
