pub mod page;
pub mod record;
pub mod timestamp;

pub use page::{PAGE_SIZE, PageCursor, RecordPage};
pub use record::{HeaderMap, WebhookRecord};

#[cfg(any(test, feature = "testing"))]
pub mod testing;
