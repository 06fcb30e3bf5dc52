//! Submission gate: the only place records reach the OS input queue.
//!
//! A zero accepted count is total failure for that record, never partial
//! success.  The gate reports it with the platform error code and the caller
//! abandons the rest of its sequence: a dropped key event can leave modifier
//! latches inconsistent for all later input, and resubmitting could
//! duplicate side effects such as clicks.

use crate::errors::InjectionError;
use crate::platform::InputPlatform;
use crate::record::HardwareInput;

/// Borrowing wrapper over an [`InputPlatform`] that checks every submission.
pub struct SubmissionGate<'a, P: ?Sized> {
    platform: &'a P,
}

impl<'a, P: InputPlatform + ?Sized> SubmissionGate<'a, P> {
    pub fn new(platform: &'a P) -> Self {
        Self { platform }
    }

    /// Inject one record.
    pub fn submit(&self, record: &HardwareInput) -> Result<(), InjectionError> {
        let accepted = self.platform.send_input(std::slice::from_ref(record));
        if accepted == 0 {
            let code = self.platform.last_error();
            log::warn!("SendInput rejected {record:?} (error {code})");
            return Err(InjectionError::PlatformSubmissionError { code });
        }
        log::trace!("submitted {record:?}");
        Ok(())
    }

    /// Inject records one at a time, stopping at the first rejection.
    ///
    /// Returns how many were submitted.
    pub fn submit_all(&self, records: &[HardwareInput]) -> Result<usize, InjectionError> {
        for record in records {
            self.submit(record)?;
        }
        Ok(records.len())
    }

    /// Whether `vk` is currently held down.
    ///
    /// A neutral (zero) response means the query was not serviced; a live
    /// system always reports something for a valid key.
    pub fn query_key_state(&self, vk: u16) -> Result<bool, InjectionError> {
        let response = self.platform.async_key_state(vk);
        if response == 0 {
            return Err(InjectionError::StateQueryError { vk });
        }
        Ok(response < 0)
    }

    /// Lenient form of [`query_key_state`](Self::query_key_state) for
    /// sweeps over many keys: a neutral response counts as "not held".
    ///
    /// A live `GetAsyncKeyState` also answers 0 for a key that is up and
    /// untouched since the previous query, so one such key must not stop
    /// the sweep.
    pub fn is_held(&self, vk: u16) -> bool {
        let response = self.platform.async_key_state(vk);
        if response == 0 {
            log::trace!("neutral key state for 0x{vk:02X}, treating as up");
        }
        response < 0
    }
}
