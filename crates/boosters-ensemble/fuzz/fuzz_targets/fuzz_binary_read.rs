//! Fuzz target for the native ensemble reader.
//!
//! Feeds arbitrary bytes to the slice reader, the stream reader, and the
//! header-only inspector. Each must return an error or a model, never panic.
//!
//! Run with:
//! ```sh
//! cargo +nightly fuzz run fuzz_binary_read
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

use boosters_ensemble::io::{self, BinaryReadOptions};
use boosters_ensemble::{BoostingModel, LearnerDecoders};

fuzz_target!(|data: &[u8]| {
    let _ = BoostingModel::deserialize(data);

    let decoders = LearnerDecoders::builtin();
    let options = BinaryReadOptions::default();
    let mut cursor = Cursor::new(data);
    let _ = BoostingModel::read_from(&mut cursor, &decoders, &options);

    let _ = io::inspect(data);
});
