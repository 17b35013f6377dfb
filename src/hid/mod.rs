//! HID report types and the static HID attribute table.

pub mod keyboard;
pub mod report_map;


pub use keyboard::{KeyboardReport, KEYBOARD_REPORT_SIZE};
pub use report_map::{ReportType, HID_INFORMATION, REPORT_MAP, REPORT_REFERENCE};
