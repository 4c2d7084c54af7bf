// Panic isolation for user-supplied callbacks
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::error;

/// Run one callback, catching a panic so the tracker loop keeps going and
/// still reaches `on_stop`.
///
/// Returns false if the callback panicked. Has no effect when the binary is
/// built with `panic = "abort"`.
pub(crate) fn invoke_guarded(tracker_id: &str, callback: &'static str, f: impl FnOnce()) -> bool {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(()) => true,
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };

            error!(tracker_id, callback, panic_msg = %panic_msg, "Tracker callback panicked");
            false
        }
    }
}
