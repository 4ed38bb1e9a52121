use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng, RngCore};

/// Random byte/string generation for nonces, salts, and session keys.
///
/// A constructed service object rather than a global; it draws from the
/// thread-local generator, so cloning one per component is free.
#[derive(Debug, Default, Clone)]
pub struct Randomizer;

impl Randomizer {
    pub fn new() -> Randomizer {
        Randomizer
    }

    pub fn bytes(&self, length: usize) -> Vec<u8> {
        let mut buffer = vec![0u8; length];
        thread_rng().fill_bytes(&mut buffer);
        buffer
    }

    pub fn byte(&self) -> u8 {
        thread_rng().gen()
    }

    pub fn uint32(&self) -> u32 {
        thread_rng().gen()
    }

    pub fn uint64(&self) -> u64 {
        thread_rng().gen()
    }

    /// Random alphanumeric string, e.g. for session identifiers.
    pub fn string(&self, length: usize) -> String {
        thread_rng()
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect()
    }
}
