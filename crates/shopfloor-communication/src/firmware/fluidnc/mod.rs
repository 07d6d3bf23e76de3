//! FluidNC protocol codec
//!
//! Pure functions that format outbound controller commands and parse inbound
//! status reports. No state, no I/O.

pub mod command_creator;
pub mod status_parser;

pub use command_creator::{
    format_feed_hold, format_file_select, format_home, format_jog, format_soft_reset,
    format_status_query, format_upload_request, UPLOAD_REQUEST_MAX,
};
pub use status_parser::parse_mpos;
