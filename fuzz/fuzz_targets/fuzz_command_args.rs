//! Fuzz target: `commands::execute`
//!
//! Splits arbitrary text into a console line and runs it against a fresh
//! runtime.  Failing commands must leave the configuration untouched.
//!
//! cargo fuzz run fuzz_command_args

#![no_main]

use canopen_sensor::adapters::flash::SimFlashPage;
use canopen_sensor::adapters::log_sink::LogEventSink;
use canopen_sensor::adapters::object_dictionary::LocalObjectDictionary;
use canopen_sensor::app::commands;
use canopen_sensor::app::runtime::NodeRuntime;
use canopen_sensor::config_store::ConfigStore;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|line: &str| {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((name, args)) = words.split_first() else {
        return;
    };

    let mut runtime = NodeRuntime::new(ConfigStore::new(SimFlashPage::new()));
    let od = LocalObjectDictionary::new();
    let mut sink = LogEventSink::new();
    let before = *runtime.config();

    let mut out = String::new();
    let result = commands::execute(&mut runtime, &od, &mut sink, name, args, &mut out);

    assert!(runtime.config().is_valid());
    if result.is_err() {
        assert_eq!(*runtime.config(), before, "failed command mutated config");
    }
});
