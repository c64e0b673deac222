//! Independent rewrite passes, each touching only its own substructure

mod dimensions;
mod map;
mod text;
mod time_window;

pub(crate) use dimensions::{check_mirror, rewrite_dimensions};
pub(crate) use map::rewrite_map;
pub(crate) use text::scan_text_fields;
pub(crate) use time_window::rewrite_time_window;
