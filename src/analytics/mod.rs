//! Click-recording and read-side analytics
//!
//! The write path (recorder + guard) turns a redirect hit into at most one
//! stored click and one visit increment; the read path (aggregator) reduces
//! the stored links and clicks into UI-ready summaries.

pub mod aggregator;
pub mod guard;
pub mod recorder;
pub mod referrer;

pub use aggregator::{referrer_breakdown, summarize, visit_trends};
pub use guard::{ClickGuard, Clock, InMemoryClickGuard, SystemClock};
pub use recorder::{ClickContext, ClickRecorder, RecordError};
pub use referrer::{classify, Classified, ReferrerCategory};
