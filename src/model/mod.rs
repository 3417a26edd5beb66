//! Types that represent the core data model, such as `Session` and `Receipt`.
mod category;
mod cost;
mod receipt;
mod session;

pub use category::{catalog, find_by_name, Category};
pub use cost::Cost;
pub use receipt::Receipt;
pub use receipt::ReceiptPatch;
pub(crate) use receipt::{clean_date_input, today_date_input};
pub use session::{Location, Session, SessionStatus, SessionUserInfo};

use chrono::Local;
use std::sync::atomic::{AtomicI64, Ordering};

/// The most recent identifier issued by `next_id`.
static LAST_ID: AtomicI64 = AtomicI64::new(0);

/// Generates a time-based identifier from the millisecond clock. Values are strictly increasing
/// within the process, so identifiers remain unique even when two are requested in the same
/// millisecond.
pub(crate) fn next_id() -> String {
    let now = Local::now().timestamp_millis();
    let mut last = LAST_ID.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_ID.compare_exchange(last, candidate, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return candidate.to_string(),
            Err(observed) => last = observed,
        }
    }
}
