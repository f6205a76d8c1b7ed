//! djb2 string hash.
//!
//! `h = h * 33 + byte`, starting from 5381, wrapping on overflow. Cheap and
//! good enough for short ASCII keys; not collision resistant.

use core::hash::{BuildHasher, Hasher};

const DJB2_SEED: u64 = 5381;

/// Hash a byte string with djb2.
#[inline]
pub fn string_hash(bytes: &[u8]) -> u64 {
    let mut h = Djb2Hasher::default();
    h.write(bytes);
    h.finish()
}

/// Streaming djb2 state. Successive `write` calls fold as if the bytes were
/// concatenated.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Djb2Hasher {
    state: u64,
}

impl Default for Djb2Hasher {
    fn default() -> Self {
        Self { state: DJB2_SEED }
    }
}

impl Hasher for Djb2Hasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state = self.state.wrapping_mul(33).wrapping_add(u64::from(b));
        }
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.state
    }
}

/// `BuildHasher` for [`Djb2Hasher`]; the default hasher of `LogHashTable`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct BuildDjb2;

impl BuildHasher for BuildDjb2 {
    type Hasher = Djb2Hasher;

    fn build_hasher(&self) -> Self::Hasher {
        Djb2Hasher::default()
    }
}
