//! Time-biased unique keys for appended records
//!
//! Keys are 20 characters: 8 encode the append time in milliseconds, 12 are random.
//! The alphabet is in ASCII order, so keys sort lexically in roughly chronological
//! order. Two keys generated in the same millisecond by the same generator reuse the
//! random tail incremented by one, which keeps them strictly increasing.

use parking_lot::Mutex;

use crate::error::StoreError;
use crate::ids::RecordKey;
use crate::timestamp::Timestamp;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";
const TIME_CHARS: usize = 8;
const RANDOM_CHARS: usize = 12;

#[derive(Debug, Default)]
struct PushIdState {
    last_millis: Option<i64>,
    last_random: [u8; RANDOM_CHARS],
}

/// Generator for store-assigned record keys.
#[derive(Debug, Default)]
pub struct PushIdGenerator {
    state: Mutex<PushIdState>,
}

impl PushIdGenerator {
    /// Creates a new generator
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a key for the current time.
    pub fn next_key(&self) -> Result<RecordKey, StoreError> {
        self.next_key_at(Timestamp::now().as_millis())
    }

    /// Generates a key for the given time in milliseconds since the Unix epoch.
    pub fn next_key_at(&self, millis: i64) -> Result<RecordKey, StoreError> {
        if millis < 0 {
            return Err(StoreError::Other(format!(
                "cannot generate a key before the epoch: {millis}"
            )));
        }

        let mut state = self.state.lock();
        if state.last_millis == Some(millis) {
            increment(&mut state.last_random);
        } else {
            let mut bytes = [0u8; RANDOM_CHARS];
            getrandom::fill(&mut bytes)
                .map_err(|e| StoreError::Other(format!("random source failed: {e}")))?;
            for (slot, byte) in state.last_random.iter_mut().zip(bytes) {
                *slot = byte % 64;
            }
            state.last_millis = Some(millis);
        }

        let mut key = String::with_capacity(TIME_CHARS + RANDOM_CHARS);
        let mut time_chars = [0u8; TIME_CHARS];
        let mut remaining = millis as u64;
        for slot in time_chars.iter_mut().rev() {
            *slot = PUSH_CHARS[(remaining % 64) as usize];
            remaining /= 64;
        }
        key.extend(time_chars.iter().map(|&c| c as char));
        key.extend(
            state
                .last_random
                .iter()
                .map(|&i| PUSH_CHARS[i as usize] as char),
        );

        RecordKey::new(key)
    }
}

/// Adds one to the base-64 number held in `digits`, most significant first.
fn increment(digits: &mut [u8; RANDOM_CHARS]) {
    for digit in digits.iter_mut().rev() {
        if *digit == 63 {
            *digit = 0;
        } else {
            *digit += 1;
            return;
        }
    }
}
