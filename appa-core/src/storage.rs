//! MEM/LOG storage layout and paged reads
//!
//! The 200 and 500 series keep saved readings in EEPROM banks reachable
//! through the read-memory command. Each entry is a bare display record.
//! A storage kind spans one or more banks ("slots"); entry `n` lives in
//! slot `n / entries_per_slot`.

use appa_protocol::{
    DisplayReading, ModelFamily, ModelId, ReadMemoryRequest, MAX_PAYLOAD_SIZE,
};
use heapless::Vec;

/// Most entries a single read-memory answer can carry
pub const MAX_ENTRIES_PER_READ: usize = MAX_PAYLOAD_SIZE / DisplayReading::SIZE;

/// Read-memory request for the block describing both storages
pub const STORAGE_INFO_REQUEST: ReadMemoryRequest = ReadMemoryRequest {
    device: 0,
    address: 0x000a,
    length: 6,
};

const ENTRY_SIZE: u8 = 5;
const MEM_ENTRIES_PER_SLOT: u16 = 500;
const MEM_BASE_ADDRESS: u16 = 0x0500;
const MEM_SLOT_COUNT: u8 = 2;
const LOG_ENTRIES_PER_SLOT: u16 = 10_000;
const LOG_BASE_ADDRESS: u16 = 0x1000;
const LOG_SLOT_COUNT: u8 = 4;

/// Which storage to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageKind {
    /// Manually saved readings
    Mem,
    /// Interval logged readings
    Log,
}

impl StorageKind {
    pub const ALL: [StorageKind; 2] = [StorageKind::Mem, StorageKind::Log];

    pub fn index(self) -> usize {
        match self {
            StorageKind::Mem => 0,
            StorageKind::Log => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StorageKind::Mem => "MEM",
            StorageKind::Log => "LOG",
        }
    }
}

/// Storage paging errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Nothing left to read at the requested position
    EmptyRange,
    /// Entry index beyond the last slot
    OutOfRange,
    /// Storage layout of this model is not known
    Unsupported,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StorageError::EmptyRange => write!(f, "empty storage range"),
            StorageError::OutOfRange => write!(f, "storage entry out of range"),
            StorageError::Unsupported => write!(f, "storage not supported on this model"),
        }
    }
}

/// Layout and fill level of one storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StorageInfo {
    pub kind: StorageKind,
    /// Logging interval in seconds; always 0 for MEM
    pub sample_rate: u16,
    /// Number of stored entries
    pub sample_amount: u16,
    /// Bytes per entry
    pub entry_size: u8,
    /// Entries held by one slot
    pub entries_per_slot: u16,
    /// Number of slots
    pub slot_count: u8,
    /// Address of the first entry in each slot
    pub base_address: u16,
    /// Device number of slot 0
    pub first_device: u8,
}

/// One planned read-memory request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemoryWindow {
    pub slot: u8,
    /// Entry offset inside the slot
    pub offset: u16,
    /// Entries covered by `request`
    pub count: u16,
    pub request: ReadMemoryRequest,
}

impl StorageInfo {
    /// Decode the 6-byte storage info block for `model`
    ///
    /// Returns the MEM and LOG descriptions, in [`StorageKind::index`] order.
    pub fn decode(model: ModelId, block: &[u8]) -> Result<[StorageInfo; 2], StorageError> {
        if model.family() != ModelFamily::Series200 && model.family() != ModelFamily::Series500 {
            return Err(StorageError::Unsupported);
        }
        let &[r0, r1, l0, l1, m0, m1] = block else {
            return Err(StorageError::Unsupported);
        };

        let mem = StorageInfo {
            kind: StorageKind::Mem,
            sample_rate: 0,
            sample_amount: u16::from_be_bytes([m0, m1]),
            entry_size: ENTRY_SIZE,
            entries_per_slot: MEM_ENTRIES_PER_SLOT,
            slot_count: MEM_SLOT_COUNT,
            base_address: MEM_BASE_ADDRESS,
            first_device: 0,
        };
        let log = StorageInfo {
            kind: StorageKind::Log,
            sample_rate: u16::from_be_bytes([r0, r1]),
            sample_amount: u16::from_be_bytes([l0, l1]),
            entry_size: ENTRY_SIZE,
            entries_per_slot: LOG_ENTRIES_PER_SLOT,
            slot_count: LOG_SLOT_COUNT,
            base_address: LOG_BASE_ADDRESS,
            first_device: 0,
        };
        Ok([mem, log])
    }

    /// Total entries addressable across all slots
    pub fn capacity(&self) -> u32 {
        self.entries_per_slot as u32 * self.slot_count as u32
    }

    /// Plan the read of up to `count` entries starting at entry `start`
    ///
    /// The window never crosses a slot boundary and never exceeds one
    /// payload, so it may cover fewer entries than asked for.
    pub fn plan_read(&self, start: u32, count: u16) -> Result<MemoryWindow, StorageError> {
        if self.entry_size == 0 || self.entries_per_slot == 0 {
            return Err(StorageError::Unsupported);
        }
        let per_slot = self.entries_per_slot as u32;
        let slot = start / per_slot;
        if slot >= self.slot_count as u32 {
            return Err(StorageError::OutOfRange);
        }
        let offset = (start % per_slot) as u16;

        let per_read = (MAX_PAYLOAD_SIZE / self.entry_size as usize) as u16;
        let count = count.min(per_read).min(self.entries_per_slot - offset);
        if count == 0 {
            return Err(StorageError::EmptyRange);
        }

        let address = self
            .base_address
            .checked_add(offset.checked_mul(self.entry_size as u16).ok_or(StorageError::OutOfRange)?)
            .ok_or(StorageError::OutOfRange)?;

        Ok(MemoryWindow {
            slot: slot as u8,
            offset,
            count,
            request: ReadMemoryRequest {
                device: self.first_device.wrapping_add(slot as u8),
                address,
                length: (count * self.entry_size as u16) as u8,
            },
        })
    }

    /// Split a read-memory answer into display records
    ///
    /// A trailing partial entry is ignored.
    pub fn decode_entries(&self, block: &[u8]) -> Vec<DisplayReading, MAX_ENTRIES_PER_READ> {
        let mut entries = Vec::new();
        if self.entry_size == 0 {
            return entries;
        }
        for chunk in block.chunks_exact(self.entry_size as usize) {
            if let Some(reading) = DisplayReading::decode(chunk) {
                if entries.push(reading).is_err() {
                    break;
                }
            }
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appa_protocol::{DataContent, Dot, Unit};
    use proptest::prelude::*;

    const BLOCK: [u8; 6] = [0x00, 0x05, 0x00, 0x20, 0x01, 0xf4];

    fn infos() -> [StorageInfo; 2] {
        StorageInfo::decode(ModelId::Appa506, &BLOCK).unwrap()
    }

    #[test]
    fn test_decode_storage_info() {
        let [mem, log] = infos();
        assert_eq!(mem.kind, StorageKind::Mem);
        assert_eq!(mem.sample_rate, 0);
        assert_eq!(mem.sample_amount, 500);
        assert_eq!(mem.base_address, 0x0500);
        assert_eq!(mem.capacity(), 1000);
        assert_eq!(log.kind, StorageKind::Log);
        assert_eq!(log.sample_rate, 5);
        assert_eq!(log.sample_amount, 32);
        assert_eq!(log.base_address, 0x1000);
        assert_eq!(log.capacity(), 40_000);
    }

    #[test]
    fn test_decode_unsupported_families() {
        for model in [ModelId::Appa150B, ModelId::Appa173, ModelId::S2, ModelId::Unknown(0x99)] {
            assert_eq!(StorageInfo::decode(model, &BLOCK), Err(StorageError::Unsupported));
        }
        assert!(StorageInfo::decode(ModelId::Appa208B, &BLOCK).is_ok());
        assert_eq!(
            StorageInfo::decode(ModelId::Appa208, &BLOCK[..4]),
            Err(StorageError::Unsupported)
        );
    }

    #[test]
    fn test_plan_read_first_page() {
        let [mem, _] = infos();
        let window = mem.plan_read(0, 100).unwrap();
        assert_eq!(window.count, 12);
        assert_eq!(window.slot, 0);
        assert_eq!(
            window.request,
            ReadMemoryRequest {
                device: 0,
                address: 0x0500,
                length: 60,
            }
        );
    }

    #[test]
    fn test_plan_read_clamps_at_slot_end() {
        let [mem, _] = infos();
        let window = mem.plan_read(499, 10).unwrap();
        assert_eq!(window.count, 1);
        assert_eq!(window.slot, 0);
        assert_eq!(window.offset, 499);
        assert_eq!(window.request.address, 0x0500 + 499 * 5);
        assert_eq!(window.request.length, 5);
    }

    #[test]
    fn test_plan_read_second_slot() {
        let [_, log] = infos();
        let window = log.plan_read(10_003, 2).unwrap();
        assert_eq!(window.slot, 1);
        assert_eq!(window.offset, 3);
        assert_eq!(window.request.device, 1);
        assert_eq!(window.request.address, 0x1000 + 15);
        assert_eq!(window.request.length, 10);
    }

    #[test]
    fn test_plan_read_errors() {
        let [mem, log] = infos();
        assert_eq!(mem.plan_read(0, 0), Err(StorageError::EmptyRange));
        assert_eq!(mem.plan_read(1000, 1), Err(StorageError::OutOfRange));
        assert_eq!(log.plan_read(40_000, 1), Err(StorageError::OutOfRange));
    }

    #[test]
    fn test_decode_entries_ignores_partial_tail() {
        let [mem, _] = infos();
        let entry = DisplayReading {
            reading: 12345,
            dot: Dot::Two,
            unit: Unit::Volt,
            data_content: DataContent::MeasuringData,
            overload: false,
        };
        let mut block = [0u8; 13];
        block[..5].copy_from_slice(&entry.encode());
        block[5..10].copy_from_slice(&entry.encode());
        let entries = mem.decode_entries(&block);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1], entry);
    }

    proptest! {
        #[test]
        fn test_plan_read_stays_inside_slot(start in 0u32..40_000, count in 1u16..200) {
            let [_, log] = infos();
            let window = log.plan_read(start, count).unwrap();
            prop_assert!(window.count >= 1);
            prop_assert!(window.count <= count);
            prop_assert!(window.request.length as usize <= MAX_PAYLOAD_SIZE);
            prop_assert!(window.offset + window.count <= log.entries_per_slot);
            prop_assert_eq!(
                window.slot as u32 * log.entries_per_slot as u32 + window.offset as u32,
                start
            );
        }
    }
}
