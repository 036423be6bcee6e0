//! Memory-mapped I/O for the PRU register windows.
//!
//! Register access goes through the [`MmioRegion`] trait so that the driver
//! core can run against an in-memory register block ([`FakeRegs`]) in tests
//! and simulation, or against a real hardware window mapped through UIO or
//! `/dev/mem` ([`MappedRegion`], rustix mmap with volatile access).

// MMIO registers are naturally aligned by hardware, so pointer casts are safe
#![allow(clippy::cast_ptr_alignment)]
#![allow(clippy::ptr_as_ptr)]

use crate::error::{PrussError, Result};
use rustix::mm::{mmap, munmap, MapFlags, ProtFlags};
use std::fmt::Debug;
use std::fs::File;
use std::os::unix::io::AsFd;
use std::sync::Mutex;

/// A 32-bit register window.
///
/// Reads and writes fail only when the register bus itself is unreachable
/// ([`PrussError::Fatal`]); out-of-range offsets are a caller bug and panic.
pub trait MmioRegion: Debug + Send + Sync {
    /// Read a 32-bit register.
    ///
    /// # Errors
    ///
    /// Returns [`PrussError::Fatal`] if the bus is unreachable.
    ///
    /// # Panics
    ///
    /// Panics if `offset + 4` exceeds the window size.
    fn read32(&self, offset: usize) -> Result<u32>;

    /// Write a 32-bit register.
    ///
    /// # Errors
    ///
    /// Returns [`PrussError::Fatal`] if the bus is unreachable.
    ///
    /// # Panics
    ///
    /// Panics if `offset + 4` exceeds the window size.
    fn write32(&self, offset: usize, value: u32) -> Result<()>;

    /// Window size in bytes.
    fn size(&self) -> usize;
}

// ── In-memory register block ─────────────────────────────────────────────────

/// In-memory register block for tests and hardware-free simulation.
#[derive(Debug)]
pub struct FakeRegs {
    words: Mutex<Vec<u32>>,
    unreachable: std::sync::atomic::AtomicBool,
}

impl FakeRegs {
    /// Create a zero-initialized block of `size` bytes (rounded down to words).
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            words: Mutex::new(vec![0; size / 4]),
            unreachable: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Make every subsequent access fail with [`PrussError::Fatal`].
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable
            .store(unreachable, std::sync::atomic::Ordering::SeqCst);
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(PrussError::fatal("simulated bus failure"));
        }
        Ok(())
    }
}

impl MmioRegion for FakeRegs {
    fn read32(&self, offset: usize) -> Result<u32> {
        self.check_reachable()?;
        let words = crate::core::lock(&self.words);
        assert!(offset + 4 <= words.len() * 4, "register offset out of range");
        Ok(words[offset / 4])
    }

    fn write32(&self, offset: usize, value: u32) -> Result<()> {
        self.check_reachable()?;
        let mut words = crate::core::lock(&self.words);
        assert!(offset + 4 <= words.len() * 4, "register offset out of range");
        words[offset / 4] = value;
        Ok(())
    }

    fn size(&self) -> usize {
        crate::core::lock(&self.words).len() * 4
    }
}

// ── Hardware-mapped window ───────────────────────────────────────────────────

/// A hardware register window mapped into the process address space.
///
/// Used with a UIO device file or `/dev/mem`. Unmapped on drop.
pub struct MappedRegion {
    ptr: *mut u8,
    size: usize,
}

impl Debug for MappedRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedRegion")
            .field("ptr", &format_args!("{:p}", self.ptr))
            .field("size", &self.size)
            .finish()
    }
}

// SAFETY: Send - MappedRegion owns the mapping exclusively; mmap'd memory is
// process-wide and moving the owner between threads does not invalidate it.
unsafe impl Send for MappedRegion {}

// SAFETY: Sync - all access is volatile and bounds-checked; concurrent 32-bit
// volatile accesses to device memory do not tear on the platforms we target.
unsafe impl Sync for MappedRegion {}

impl MappedRegion {
    /// Map `size` bytes of a device file at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`PrussError::Fatal`] if the mapping fails.
    pub fn map(file: &File, offset: u64, size: usize) -> Result<Self> {
        // SAFETY: mmap over a device fd; the kernel validates offset/size
        // against the underlying region and we never outlive the mapping.
        let ptr = unsafe {
            mmap(
                std::ptr::null_mut(),
                size,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                file.as_fd(),
                offset,
            )
            .map_err(|e| PrussError::fatal(format!("mmap failed: {e}")))?
        };

        tracing::debug!("mapped register window at {ptr:p}, size {size:#x}");

        Ok(Self {
            ptr: ptr.cast(),
            size,
        })
    }
}

impl MmioRegion for MappedRegion {
    fn read32(&self, offset: usize) -> Result<u32> {
        assert!(offset + 4 <= self.size, "register offset out of range");
        // SAFETY: ptr is valid for self.size bytes (checked above); volatile
        // read because hardware can change the value behind our back.
        Ok(unsafe { std::ptr::read_volatile(self.ptr.add(offset).cast::<u32>()) })
    }

    fn write32(&self, offset: usize, value: u32) -> Result<()> {
        assert!(offset + 4 <= self.size, "register offset out of range");
        // SAFETY: ptr is valid for self.size bytes (checked above); volatile
        // write because register writes have hardware side effects.
        unsafe {
            std::ptr::write_volatile(self.ptr.add(offset).cast::<u32>(), value);
        }
        Ok(())
    }

    fn size(&self) -> usize {
        self.size
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        // SAFETY: ptr/size come from the successful mmap in map(); Drop runs
        // at most once and no references outlive self.
        unsafe {
            let _ = munmap(self.ptr.cast(), self.size);
        }
        tracing::debug!("unmapped register window ({:#x} bytes)", self.size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_regs_read_back() {
        let regs = FakeRegs::new(0x100);
        regs.write32(0x20, 0xDEAD_BEEF).unwrap();
        assert_eq!(regs.read32(0x20).unwrap(), 0xDEAD_BEEF);
        assert_eq!(regs.read32(0x24).unwrap(), 0);
    }

    #[test]
    fn fake_regs_unreachable_is_fatal() {
        let regs = FakeRegs::new(0x100);
        regs.set_unreachable(true);
        assert!(matches!(
            regs.read32(0),
            Err(PrussError::Fatal { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "register offset out of range")]
    fn fake_regs_bounds() {
        let regs = FakeRegs::new(0x10);
        let _ = regs.read32(0x10);
    }
}
