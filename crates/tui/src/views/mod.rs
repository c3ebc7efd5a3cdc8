pub mod setup;
pub mod webhook_detail;
pub mod webhook_list;
