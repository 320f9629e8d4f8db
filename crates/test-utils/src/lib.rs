//! Test helpers shared across the tunnel crates.

use std::{fmt, sync::Once};

use arbitrary::{Arbitrary, Unstructured};
use rand::{RngCore, SeedableRng, rngs::OsRng, rngs::StdRng};
use tunnel_common::logging::{self, LoggerConfig};

/// The default buffer size for the `ArbitraryGenerator`.
const ARB_GEN_LEN: usize = 16_384;

/// Produces arbitrary values from a byte buffer refilled by an RNG on every call.
pub struct ArbitraryGenerator {
    buf: Vec<u8>,
    rng: Box<dyn RngCore + Send>,
}

impl fmt::Debug for ArbitraryGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArbitraryGenerator")
            .field("buf_len", &self.buf.len())
            .finish_non_exhaustive()
    }
}

impl Default for ArbitraryGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ArbitraryGenerator {
    /// Creates a generator backed by [`OsRng`].
    pub fn new() -> Self {
        Self {
            buf: vec![0u8; ARB_GEN_LEN],
            rng: Box::new(OsRng),
        }
    }

    /// Creates a generator whose output is fully determined by `seed`.
    pub fn new_with_seed(seed: u64) -> Self {
        Self {
            buf: vec![0u8; ARB_GEN_LEN],
            rng: Box::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Generates an arbitrary instance of type `T`.
    ///
    /// # Panics
    ///
    /// If no instance could be built after a few refills of the buffer.
    pub fn generate<T>(&mut self) -> T
    where
        T: for<'a> Arbitrary<'a>,
    {
        const MAX_ATTEMPTS: usize = 16;
        let mut last_error = None;

        for _ in 0..MAX_ATTEMPTS {
            self.rng.fill_bytes(&mut self.buf);
            let mut u = Unstructured::new(&self.buf);
            match T::arbitrary(&mut u) {
                Ok(value) => return value,
                Err(err) => last_error = Some(err),
            }
        }

        let error_msg = last_error
            .map(|err| err.to_string())
            .unwrap_or_else(|| "unknown error".to_string());
        panic!("failed to generate arbitrary instance: {error_msg}");
    }
}

static INIT_LOGGING: Once = Once::new();

/// Installs a compact subscriber at `debug` level for the test binary, once.
///
/// Safe to call from every test; `RUST_LOG` still overrides the level.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let config = LoggerConfig::new("debug").with_test_writer(true);
        // Another harness may already own the global subscriber.
        let _ = logging::try_init(&config);
    });
}
