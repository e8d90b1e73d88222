//! Flash adapters for the reserved configuration page.
//!
//! - [`SimFlashPage`]: in-memory NOR page for host tests and simulation,
//!   with fault injection.
//! - `PartitionFlash` (`target_os = "espidf"`): a raw data partition
//!   reached through the ESP-IDF `esp_partition_*` API.

use log::debug;

use crate::app::ports::FlashPort;
use crate::config::FLASH_WORD_SIZE;
use crate::error::FlashError;

/// Size of the simulated page.
pub const SIM_PAGE_SIZE: usize = 2048;
const SIM_PAGE_WORDS: usize = SIM_PAGE_SIZE / FLASH_WORD_SIZE;
const ERASED_WORD: u64 = u64::MAX;

fn word_index(offset: usize, page_size: usize) -> Result<usize, FlashError> {
    if offset % FLASH_WORD_SIZE != 0 || offset + FLASH_WORD_SIZE > page_size {
        return Err(FlashError::OutOfBounds);
    }
    Ok(offset / FLASH_WORD_SIZE)
}

/// In-memory flash page.
///
/// Behaves like NOR flash: erase sets every bit, program can only clear
/// bits.  A failed program leaves the target word untouched.
#[derive(Debug, Clone)]
pub struct SimFlashPage {
    words: [u64; SIM_PAGE_WORDS],
    locked: bool,
    erase_count: u32,
    fail_next_erase: bool,
    fail_next_program: bool,
}

impl Default for SimFlashPage {
    fn default() -> Self {
        Self::new()
    }
}

impl SimFlashPage {
    /// A freshly erased, locked page.
    pub fn new() -> Self {
        Self {
            words: [ERASED_WORD; SIM_PAGE_WORDS],
            locked: true,
            erase_count: 0,
            fail_next_erase: false,
            fail_next_program: false,
        }
    }

    /// A page whose first words hold `words`, as left by an earlier firmware.
    pub fn with_words(words: &[u64]) -> Self {
        let mut page = Self::new();
        for (slot, word) in page.words.iter_mut().zip(words) {
            *slot = *word;
        }
        page
    }

    pub fn fail_next_erase(&mut self) {
        self.fail_next_erase = true;
    }

    pub fn fail_next_program(&mut self) {
        self.fail_next_program = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn erase_count(&self) -> u32 {
        self.erase_count
    }
}

impl FlashPort for SimFlashPage {
    fn unlock(&mut self) {
        self.locked = false;
    }

    fn lock(&mut self) {
        self.locked = true;
    }

    fn erase_page(&mut self) -> Result<(), FlashError> {
        if self.locked || core::mem::take(&mut self.fail_next_erase) {
            return Err(FlashError::EraseFailed);
        }
        self.words = [ERASED_WORD; SIM_PAGE_WORDS];
        self.erase_count += 1;
        debug!("SimFlash: page erased ({} cycles)", self.erase_count);
        Ok(())
    }

    fn program_word(&mut self, offset: usize, word: u64) -> Result<(), FlashError> {
        let index = word_index(offset, SIM_PAGE_SIZE)?;
        if self.locked || core::mem::take(&mut self.fail_next_program) {
            return Err(FlashError::ProgramFailed);
        }
        self.words[index] &= word;
        Ok(())
    }

    fn read_word(&self, offset: usize) -> u64 {
        word_index(offset, SIM_PAGE_SIZE).map_or(ERASED_WORD, |i| self.words[i])
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF data partition
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use partition::PartitionFlash;

#[cfg(target_os = "espidf")]
mod partition {
    use core::ffi::{CStr, c_void};

    use esp_idf_svc::sys::{
        ESP_OK, esp_partition_erase_range, esp_partition_find_first, esp_partition_read,
        esp_partition_subtype_t_ESP_PARTITION_SUBTYPE_ANY, esp_partition_t,
        esp_partition_type_t_ESP_PARTITION_TYPE_DATA, esp_partition_write,
    };
    use log::warn;

    use super::{ERASED_WORD, word_index};
    use crate::app::ports::FlashPort;
    use crate::config::FLASH_WORD_SIZE;
    use crate::error::FlashError;

    /// SPI flash erase granularity.
    const SECTOR_SIZE: usize = 4096;

    /// First sector of a raw data partition used as the config page.
    ///
    /// The ESP-IDF partition API has no controller lock; `unlock`/`lock`
    /// gate writes in software so a stray program outside a store sequence
    /// is refused the same way the hardware would.
    pub struct PartitionFlash {
        partition: *const esp_partition_t,
        unlocked: bool,
    }

    // SAFETY: the partition table entry is static and never mutated.
    unsafe impl Send for PartitionFlash {}

    impl PartitionFlash {
        /// Look up a data partition by label.
        pub fn find(label: &CStr) -> Option<Self> {
            let partition = unsafe {
                esp_partition_find_first(
                    esp_partition_type_t_ESP_PARTITION_TYPE_DATA,
                    esp_partition_subtype_t_ESP_PARTITION_SUBTYPE_ANY,
                    label.as_ptr(),
                )
            };
            if partition.is_null() {
                warn!("Flash: partition {:?} not found", label);
                return None;
            }
            Some(Self {
                partition,
                unlocked: false,
            })
        }
    }

    impl FlashPort for PartitionFlash {
        fn unlock(&mut self) {
            self.unlocked = true;
        }

        fn lock(&mut self) {
            self.unlocked = false;
        }

        fn erase_page(&mut self) -> Result<(), FlashError> {
            if !self.unlocked {
                return Err(FlashError::EraseFailed);
            }
            let ret = unsafe { esp_partition_erase_range(self.partition, 0, SECTOR_SIZE) };
            if ret != ESP_OK {
                warn!("Flash: erase returned {}", ret);
                return Err(FlashError::EraseFailed);
            }
            Ok(())
        }

        fn program_word(&mut self, offset: usize, word: u64) -> Result<(), FlashError> {
            word_index(offset, SECTOR_SIZE)?;
            if !self.unlocked {
                return Err(FlashError::ProgramFailed);
            }
            let bytes = word.to_le_bytes();
            let ret = unsafe {
                esp_partition_write(
                    self.partition,
                    offset,
                    bytes.as_ptr().cast::<c_void>(),
                    FLASH_WORD_SIZE,
                )
            };
            if ret != ESP_OK {
                warn!("Flash: write at +{:#x} returned {}", offset, ret);
                return Err(FlashError::ProgramFailed);
            }
            Ok(())
        }

        fn read_word(&self, offset: usize) -> u64 {
            if word_index(offset, SECTOR_SIZE).is_err() {
                return ERASED_WORD;
            }
            let mut bytes = [0xFFu8; FLASH_WORD_SIZE];
            let ret = unsafe {
                esp_partition_read(
                    self.partition,
                    offset,
                    bytes.as_mut_ptr().cast::<c_void>(),
                    FLASH_WORD_SIZE,
                )
            };
            if ret != ESP_OK {
                warn!("Flash: read at +{:#x} returned {}", offset, ret);
                return ERASED_WORD;
            }
            u64::from_le_bytes(bytes)
        }
    }
}
