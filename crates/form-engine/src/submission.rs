//! Payloads handed to the forms backend

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Create-form request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormSubmission {
    pub form_type: String,
    pub form_json: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<i64>,
}

/// Update-form request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormUpdate {
    pub form_json: Value,
}

/// "Already submitting" flag of one form. A second submit is refused while a
/// [`SubmitTicket`] is alive; dropping the ticket clears the flag.
#[derive(Debug, Default)]
pub struct SubmitGuard {
    submitting: AtomicBool,
}

impl SubmitGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_begin(&self) -> Option<SubmitTicket<'_>> {
        self.submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SubmitTicket { guard: self })
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct SubmitTicket<'a> {
    guard: &'a SubmitGuard,
}

impl Drop for SubmitTicket<'_> {
    fn drop(&mut self) {
        self.guard.submitting.store(false, Ordering::Release);
    }
}
