//! Scratch directories for the unit tests, laid out like the integration test helpers.

use rand::{Rng, distributions::Alphanumeric};
use std::path::PathBuf;

pub const TEST_TMP_DIR: &str = "tests/tmp";

/// Creates an empty, uniquely named directory under [`TEST_TMP_DIR`].
pub fn scratch_dir(sub_path: &str) -> PathBuf {
    let rand_string: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let dir = PathBuf::from(TEST_TMP_DIR).join(format!("{}-{}", sub_path, rand_string));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
