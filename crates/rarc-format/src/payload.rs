//! Payload section builder
//!
//! Two padding rules apply and are kept as separate code paths:
//! - before each file, zeros bring the write position to a 32-byte boundary
//!   and the file's recorded offset is taken after that padding
//! - after the last file, the whole section is padded to 32 bytes
//!
//! Slots are recorded in push order, which callers keep identical to the
//! archive-wide file ordinal.

use crate::error::{RarcError, Result};
use crate::utils::{ALIGNMENT, padding_for};

/// Location of one file's bytes inside the payload section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadSlot {
    /// Offset from the start of the payload section
    pub offset: u32,
    /// Length of the embedded bytes (without padding)
    pub length: u32,
}

/// Accumulates file payloads in emission order
#[derive(Debug, Clone, Default)]
pub struct PayloadBuilder {
    data: Vec<u8>,
    slots: Vec<PayloadSlot>,
}

impl PayloadBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one file's bytes and return where they landed
    pub fn push(&mut self, bytes: &[u8]) -> Result<PayloadSlot> {
        let pad = padding_for(self.data.len(), ALIGNMENT);
        self.data.resize(self.data.len() + pad, 0);

        let offset = u32::try_from(self.data.len()).map_err(|_| RarcError::PayloadTooLarge)?;
        let length = u32::try_from(bytes.len()).map_err(|_| RarcError::PayloadTooLarge)?;
        debug_assert_eq!(offset as usize % ALIGNMENT, 0);

        self.data.extend_from_slice(bytes);
        let slot = PayloadSlot { offset, length };
        self.slots.push(slot);
        Ok(slot)
    }

    /// Number of files pushed so far
    pub fn file_count(&self) -> usize {
        self.slots.len()
    }

    /// Current write position
    pub fn position(&self) -> usize {
        self.data.len()
    }

    /// Apply the trailing padding and freeze the section
    pub fn finish(mut self) -> Result<PayloadSection> {
        let tail = self.data.len() % ALIGNMENT;
        if tail != 0 {
            self.data.resize(self.data.len() + (ALIGNMENT - tail), 0);
        }
        u32::try_from(self.data.len()).map_err(|_| RarcError::PayloadTooLarge)?;
        Ok(PayloadSection {
            data: self.data,
            slots: self.slots,
        })
    }
}

/// Finalized payload bytes plus per-file slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadSection {
    data: Vec<u8>,
    slots: Vec<PayloadSlot>,
}

impl PayloadSection {
    /// Slot for the file with the given archive-wide ordinal
    pub fn slot(&self, ordinal: usize) -> Result<PayloadSlot> {
        self.slots
            .get(ordinal)
            .copied()
            .ok_or(RarcError::MissingPayload(ordinal))
    }

    /// All slots in ordinal order
    pub fn slots(&self) -> &[PayloadSlot] {
        &self.slots
    }

    /// Padded section bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Padded section length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the section holds no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_file_at_zero() {
        let mut builder = PayloadBuilder::new();
        let slot = builder.push(&[1, 2, 3, 4]).unwrap();
        assert_eq!(slot, PayloadSlot { offset: 0, length: 4 });
    }

    #[test]
    fn test_per_file_start_alignment() {
        let mut builder = PayloadBuilder::new();
        builder.push(&[0xAA; 5]).unwrap();
        let second = builder.push(&[0xBB; 40]).unwrap();
        let third = builder.push(&[0xCC; 1]).unwrap();
        assert_eq!(second.offset, 32);
        assert_eq!(third.offset, 96);
        // Padding before a file is zero-filled
        let section = builder.finish().unwrap();
        assert!(section.as_bytes()[5..32].iter().all(|&b| b == 0));
        assert_eq!(&section.as_bytes()[32..72], &[0xBB; 40][..]);
    }

    #[test]
    fn test_trailing_padding() {
        let mut builder = PayloadBuilder::new();
        builder.push(&[7; 4]).unwrap();
        assert_eq!(builder.position(), 4);
        let section = builder.finish().unwrap();
        assert_eq!(section.len(), 32);
        assert_eq!(section.slot(0).unwrap().length, 4);
    }

    #[test]
    fn test_trailing_padding_skipped_when_aligned() {
        let mut builder = PayloadBuilder::new();
        builder.push(&[7; 64]).unwrap();
        assert_eq!(builder.finish().unwrap().len(), 64);
    }

    #[test]
    fn test_empty_file_keeps_alignment() {
        let mut builder = PayloadBuilder::new();
        builder.push(&[1]).unwrap();
        let empty = builder.push(&[]).unwrap();
        let next = builder.push(&[2]).unwrap();
        assert_eq!(empty, PayloadSlot { offset: 32, length: 0 });
        assert_eq!(next.offset, 32);
        assert_eq!(builder.file_count(), 3);
    }

    #[test]
    fn test_empty_section() {
        let section = PayloadBuilder::new().finish().unwrap();
        assert!(section.is_empty());
        assert!(matches!(section.slot(0), Err(RarcError::MissingPayload(0))));
    }
}
