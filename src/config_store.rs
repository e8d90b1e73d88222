//! Flash-backed persistence of [`NodeConfig`].
//!
//! The record lives at the start of a reserved flash page.  A page that
//! fails validation (erased, half-written, corrupt) is replaced by the
//! factory default, which is written back straight away.

use log::{error, info, warn};

use crate::app::ports::FlashPort;
use crate::config::{CONFIG_WORDS, ConfigRecord, FLASH_WORD_SIZE, NodeConfig};
use crate::error::{StoreError, ValidationError};

/// What [`ConfigStore::load_report`] found in flash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadReport {
    Stored(NodeConfig),
    /// The page held no valid record.  The factory default is in use and
    /// `healed` tells whether writing it back succeeded.
    Defaulted {
        cause: ValidationError,
        healed: Result<(), StoreError>,
    },
}

impl LoadReport {
    pub fn config(&self) -> NodeConfig {
        match self {
            Self::Stored(cfg) => *cfg,
            Self::Defaulted { .. } => NodeConfig::FACTORY_DEFAULT,
        }
    }

    /// The page now holds the returned configuration.
    pub fn in_sync(&self) -> bool {
        match self {
            Self::Stored(_) => true,
            Self::Defaulted { healed, .. } => healed.is_ok(),
        }
    }
}

pub struct ConfigStore<F> {
    flash: F,
}

impl<F: FlashPort> ConfigStore<F> {
    pub fn new(flash: F) -> Self {
        Self { flash }
    }

    /// Read the configuration, self-healing an invalid page.
    pub fn load(&mut self) -> NodeConfig {
        self.load_report().config()
    }

    pub fn load_report(&mut self) -> LoadReport {
        match self.read_record().and_then(|record| record.validate()) {
            Ok(cfg) => {
                info!(
                    "Config: loaded node id {} buzzer={} led={}",
                    cfg.bus_address, cfg.buzzer, cfg.led
                );
                LoadReport::Stored(cfg)
            }
            Err(cause) => {
                warn!("Config: invalid record ({}), restoring defaults", cause);
                let healed = self.store(&NodeConfig::FACTORY_DEFAULT);
                LoadReport::Defaulted { cause, healed }
            }
        }
    }

    /// Erase the page and program `cfg` into it.
    ///
    /// Stops at the first failing word.  The page is left relocked whatever
    /// happens.
    pub fn store(&mut self, cfg: &NodeConfig) -> Result<(), StoreError> {
        let result = ConfigRecord::from(*cfg)
            .to_words()
            .map_err(|_| StoreError::Encode)
            .and_then(|words| self.with_unlocked(|flash| program_record(flash, &words)));

        match &result {
            Ok(()) => info!("Config: stored node id {}", cfg.bus_address),
            Err(e) => error!("Config: store failed: {}", e),
        }
        result
    }

    /// Pure range check of a raw record.
    pub fn validate(record: &ConfigRecord) -> bool {
        record.validate().is_ok()
    }

    /// Raw record currently in flash, undecoded fields included.
    pub fn read_record(&self) -> Result<ConfigRecord, ValidationError> {
        let mut words = [0u64; CONFIG_WORDS];
        for (i, word) in words.iter_mut().enumerate() {
            *word = self.flash.read_word(i * FLASH_WORD_SIZE);
        }
        ConfigRecord::from_words(&words).map_err(|_| ValidationError::Undecodable)
    }

    pub fn flash(&self) -> &F {
        &self.flash
    }

    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    fn with_unlocked<T>(&mut self, f: impl FnOnce(&mut F) -> T) -> T {
        let mut guard = Unlocked::new(&mut self.flash);
        f(&mut *guard.flash)
    }
}

fn program_record<F: FlashPort>(
    flash: &mut F,
    words: &[u64; CONFIG_WORDS],
) -> Result<(), StoreError> {
    flash.erase_page().map_err(StoreError::Erase)?;
    for (i, &word) in words.iter().enumerate() {
        let offset = i * FLASH_WORD_SIZE;
        flash
            .program_word(offset, word)
            .map_err(|cause| StoreError::Program { offset, cause })?;
    }
    Ok(())
}

/// Holds the flash controller unlocked; relocks on drop.
struct Unlocked<'a, F: FlashPort> {
    flash: &'a mut F,
}

impl<'a, F: FlashPort> Unlocked<'a, F> {
    fn new(flash: &'a mut F) -> Self {
        flash.unlock();
        Self { flash }
    }
}

impl<F: FlashPort> Drop for Unlocked<'_, F> {
    fn drop(&mut self) {
        self.flash.lock();
    }
}
