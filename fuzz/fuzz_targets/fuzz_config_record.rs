//! Fuzz target: `ConfigStore::load`
//!
//! Seeds the config page with an arbitrary word and asserts that loading
//! never panics, always yields a valid configuration, and leaves the page
//! holding exactly what was returned.
//!
//! cargo fuzz run fuzz_config_record

#![no_main]

use canopen_sensor::adapters::flash::SimFlashPage;
use canopen_sensor::config_store::ConfigStore;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: [u8; 8]| {
    let page = SimFlashPage::with_words(&[u64::from_le_bytes(data)]);
    let mut store = ConfigStore::new(page);

    let cfg = store.load();
    assert!(cfg.is_valid(), "load returned an invalid node id");

    let persisted = store
        .read_record()
        .and_then(|record| record.validate())
        .expect("page must hold a valid record after load");
    assert_eq!(persisted, cfg);
});
