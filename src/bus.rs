//! The bus adapter seam. `rixgl` depends only on this trait, never on a
//! concrete transport (USB FIFO, simulator, memory-mapped window) — those
//! live outside this crate.

/// An opaque sink for a finished display list's bytes.
pub trait BusAdapter {
    /// Hand `buffer` to the hardware. Returns `false` if the transport
    /// rejected or could not complete the write.
    fn write(&mut self, buffer: &[u8]) -> bool;
}
