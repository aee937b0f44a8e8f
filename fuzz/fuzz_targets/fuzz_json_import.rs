#![no_main]

use latticedb::{Config, StoreCore};
use libfuzzer_sys::fuzz_target;

const DIM: usize = 8;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else { return };

    let dir = tempfile::tempdir().unwrap();
    let config = Config { dimension: DIM, ..Config::default() };
    let store = StoreCore::open(dir.path().join("lattice.db"), None, config).unwrap();

    let import_path = dir.path().join("import.json");
    if std::fs::write(&import_path, text).is_err() {
        return;
    }

    // Arbitrary JSON bytes must never panic the importer — either they
    // parse into zero or more valid entries, or `import_json` returns a
    // typed error.
    let _ = store.import_json(&import_path);
});
