#![no_main]

use libfuzzer_sys::fuzz_target;
use pinscope::PreloadedDatabase;

fuzz_target!(|data: &[u8]| {
    if let Ok(db) = PreloadedDatabase::from_bytes(data) {
        for host in ["www.google.com", "example.com", "a.b.c.d.e", ""] {
            let _ = db.lookup(host);
        }
    }
    let _ = PreloadedDatabase::builtin().lookup(&String::from_utf8_lossy(data));
});
