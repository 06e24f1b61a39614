//! The display-list assembler: formats commands, manages stream sections,
//! alignment, texture-load dedup, and OOM rollback.
//!
//! Grounded line-for-line on `DisplayListAssembler.hpp` (see `DESIGN.md`):
//! lazy section open/close, the texture-binding dedup (overwrite in place
//! rather than append when no triangle was drawn since the last
//! `use_texture`), and unwinding partial allocations in reverse order on
//! OOM all come from there.

use bytemuck::Pod;

use crate::bus::BusAdapter;
use crate::display_list::{DisplayList, Slot};
use crate::protocol;
use crate::raster::RasterizedTriangle;
use crate::renderer::IRenderer;

fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) / align * align
}

#[derive(Clone, Copy)]
struct PendingTexture {
    op: Slot<u32>,
    load: Slot<u32>,
    addr: Slot<u32>,
}

/// `N` is the backing display list's byte capacity; `ALIGN` is its
/// alignment (see [`DisplayList`]).
pub struct DisplayListAssembler<const N: usize, const ALIGN: usize> {
    list: DisplayList<N, ALIGN>,
    open_section: Option<Slot<u32>>,
    section_body_start: usize,
    last_was_texture: bool,
    pending_texture: Option<PendingTexture>,
}

impl<const N: usize, const ALIGN: usize> DisplayListAssembler<N, ALIGN> {
    pub fn new() -> Self {
        Self {
            list: DisplayList::new(),
            open_section: None,
            section_body_start: 0,
            last_was_texture: false,
            pending_texture: None,
        }
    }

    pub fn size(&self) -> usize {
        self.list.size()
    }

    pub fn bytes(&self) -> &[u8] {
        self.list.bytes()
    }

    /// Discard all state — the backing list and any in-progress section.
    /// Idempotent.
    pub fn clear_assembler(&mut self) {
        self.list.clear();
        self.open_section = None;
        self.section_body_start = 0;
        self.last_was_texture = false;
        self.pending_texture = None;
    }

    fn open_section(&mut self) -> bool {
        if self.open_section.is_some() {
            return true;
        }
        match self.list.create::<u32>(0) {
            Some(slot) => {
                self.section_body_start = self.list.size();
                self.open_section = Some(slot);
                true
            }
            None => false,
        }
    }

    fn close_section(&mut self) {
        if let Some(slot) = self.open_section.take() {
            let body_len = (self.list.size() - self.section_body_start) as u32;
            self.list.write(slot, protocol::OP_STREAM | (body_len & protocol::STREAM_COMMAND_IMM_MASK));
        }
    }

    /// Appends a single `FRAMEBUFFER_OP | MEMSET | (COLOR?|DEPTH?)` word, or
    /// `NOP` if neither flag is set.
    pub fn clear(&mut self, color: bool, depth: bool) -> bool {
        if !self.open_section() {
            return false;
        }
        let word = if !color && !depth {
            protocol::OP_NOP
        } else {
            let mut word = protocol::FRAMEBUFFER_MEMSET;
            if color {
                word |= protocol::FRAMEBUFFER_COLOR;
            }
            if depth {
                word |= protocol::FRAMEBUFFER_DEPTH;
            }
            word
        };
        if self.list.create(word).is_none() {
            return false;
        }
        true
    }

    /// Appends `FRAMEBUFFER_OP | COMMIT | COLOR` and closes the section —
    /// this is what triggers the accelerator to scan out.
    pub fn commit(&mut self) -> bool {
        if !self.open_section() {
            return false;
        }
        if self.list.create(protocol::FRAMEBUFFER_COMMIT | protocol::FRAMEBUFFER_COLOR).is_none() {
            return false;
        }
        self.close_section();
        true
    }

    /// Appends `SET_REG | index` followed by `value`.
    pub fn write_register<T: Pod>(&mut self, index: u32, value: T) -> bool {
        if !self.open_section() {
            return false;
        }
        let Some(op_slot) = self.list.create(protocol::OP_SET_REG | (index & protocol::STREAM_COMMAND_IMM_MASK))
        else {
            return false;
        };
        if self.list.create(value).is_none() {
            self.list.remove(op_slot);
            return false;
        }
        true
    }

    /// Emits `TEXTURE_STREAM_{WxH}` as the last word of its own section,
    /// then `LOAD | size` + `addr` as two free-standing words after it. If
    /// the previous command was also `use_texture` with no intervening
    /// triangle, overwrites the pending triple in place instead of
    /// appending — the old binding was never consumed by the hardware.
    pub fn use_texture(&mut self, addr: u32, size: u32, edge: u32) -> bool {
        let Some(size_op) = protocol::texture_stream_op(edge) else {
            log::warn!("use_texture: unsupported texture edge length {edge}");
            return false;
        };
        let load_op = protocol::OP_LOAD | (size & protocol::STREAM_COMMAND_IMM_MASK);

        if self.last_was_texture {
            if let Some(pending) = self.pending_texture {
                self.list.write(pending.op, size_op);
                self.list.write(pending.load, load_op);
                self.list.write(pending.addr, addr);
                return true;
            }
        }

        if !self.open_section() {
            return false;
        }
        let Some(op_slot) = self.list.create(size_op) else { return false };
        self.close_section();

        let Some(load_slot) = self.list.create(load_op) else {
            // op_slot is sealed inside an already-closed section; turning it
            // into a NOP in place keeps that section's byte count honest
            // rather than rolling the cursor back through it.
            self.list.write(op_slot, protocol::OP_NOP);
            return false;
        };
        let Some(addr_slot) = self.list.create(addr) else {
            self.list.remove(load_slot);
            self.list.write(op_slot, protocol::OP_NOP);
            return false;
        };

        self.pending_texture = Some(PendingTexture { op: op_slot, load: load_slot, addr: addr_slot });
        self.last_was_texture = true;
        true
    }

    /// Closes the section and emits `STORE | size`, `addr`, then the pixel
    /// bytes themselves via a raw `alloc`.
    pub fn update_texture(&mut self, addr: u32, pixels: &[u8]) -> bool {
        self.close_section();
        let size = pixels.len() as u32;
        let Some(op_slot) = self.list.create(protocol::OP_STORE | (size & protocol::STREAM_COMMAND_IMM_MASK))
        else {
            return false;
        };
        let Some(addr_slot) = self.list.create(addr) else {
            self.list.remove(op_slot);
            return false;
        };
        let Some(data_offset) = self.list.alloc(pixels.len()) else {
            self.list.remove(addr_slot);
            self.list.remove(op_slot);
            return false;
        };
        self.list.write_bytes(data_offset, pixels);
        true
    }

    /// Closes any open section and hands the finished bytes to `bus`.
    /// Returns whatever the bus adapter returns; the list is left intact
    /// (callers `clear_assembler()` once the transfer is confirmed).
    pub fn flush(&mut self, bus: &mut dyn BusAdapter) -> bool {
        self.close_section();
        bus.write(self.list.bytes())
    }
}

impl<const N: usize, const ALIGN: usize> IRenderer for DisplayListAssembler<N, ALIGN> {
    fn draw_triangle(&mut self, triangle: &RasterizedTriangle) -> bool {
        if !self.open_section() {
            return false;
        }
        let aligned_size = align_up(std::mem::size_of::<RasterizedTriangle>(), ALIGN) as u32;
        let Some(op_slot) = self.list.create(protocol::OP_TRIANGLE_STREAM | aligned_size) else {
            return false;
        };
        if self.list.create(*triangle).is_none() {
            self.list.remove(op_slot);
            return false;
        }
        self.last_was_texture = false;
        self.pending_texture = None;
        true
    }
}

impl<const N: usize, const ALIGN: usize> Default for DisplayListAssembler<N, ALIGN> {
    fn default() -> Self {
        Self::new()
    }
}
