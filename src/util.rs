pub trait ByteSliceExt {
    fn trim_ascii_start_mut(&mut self) -> &mut Self;
    fn trim_ascii_end_mut(&mut self) -> &mut Self;
    fn trim_ascii_mut(&mut self) -> &mut Self;
}

impl ByteSliceExt for [u8] {
    fn trim_ascii_start_mut(&mut self) -> &mut Self {
        let len = self.trim_ascii_start().len();
        let start = self.len() - len;
        &mut self[start..]
    }

    fn trim_ascii_end_mut(&mut self) -> &mut Self {
        let len = self.trim_ascii_end().len();
        &mut self[..len]
    }

    fn trim_ascii_mut(&mut self) -> &mut Self {
        self.trim_ascii_start_mut().trim_ascii_end_mut()
    }
}

/// Busy-wait (yielding cooperatively) until `p` reports true.
///
/// Used to observe the cross-context flags described in the concurrency model:
/// `frameReady` and the LED serializer's `busy` flag are plain atomics, not
/// waker-backed futures, so the foreground loop polls them between yields.
pub async fn until(mut p: impl FnMut() -> bool) {
    while !p() {
        embassy_futures::yield_now().await;
    }
}

/// An integer Bresenham-style accumulator distributing `src` source units across
/// `dst` destination units, used throughout the pipeline to step a cursor forward
/// in one axis whenever enough credit has accumulated from the other.
///
/// The step rule is fixed as `acc += dst; while acc >= src { acc -= src; emit() }`,
/// using `>=` rather than `>` so that credit never straddles more than one pending
/// emission before being drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bresenham {
    src: u32,
    dst: u32,
    acc: u32,
}

impl Bresenham {
    pub const fn new(src: u32, dst: u32) -> Self {
        Self { src, dst, acc: 0 }
    }

    /// Advance by one source unit, returning the number of destination units
    /// (0 or more) that became due.
    pub fn advance(&mut self) -> u32 {
        self.acc += self.dst;
        let mut emitted = 0;
        while self.acc >= self.src {
            self.acc -= self.src;
            emitted += 1;
        }
        emitted
    }

    pub const fn reset(&mut self) {
        self.acc = 0;
    }
}

/// Clamp `value` into `[lo, hi]`.
pub fn clamp_i32(value: i32, lo: i32, hi: i32) -> i32 {
    if value < lo {
        lo
    } else if value > hi {
        hi
    } else {
        value
    }
}

/// Clamp a signed value down into a `u8`, saturating at both ends.
pub fn clamp_u8(value: i32) -> u8 {
    clamp_i32(value, 0, u8::MAX as i32) as u8
}
