//! Static HID attribute values served by the HID service.
//!
//! These byte sequences are a wire contract: a central's HID driver parses
//! the Report Map to learn the layout of every report we send, so they
//! must be reproduced exactly.

/// Report types carried in a Report Reference descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ReportType {
    Input = 0x01,
    Output = 0x02,
    Feature = 0x03,
}

/// Report ID used by the keyboard input report.
pub const KEYBOARD_REPORT_ID: u8 = 0x00;

/// HID Information characteristic value.
///
/// ```text
/// Byte 0: bcdHID (low byte only, 0x12)
/// Byte 1: bCountryCode (0 = not localized)
/// Byte 2: Flags (0 = no remote wake, not normally connectable)
/// ```
pub const HID_INFORMATION: [u8; 3] = [0x12, 0x00, 0x00];

/// Report Reference descriptor value for the keyboard input report.
pub const REPORT_REFERENCE: [u8; 2] = [KEYBOARD_REPORT_ID, ReportType::Input as u8];

/// HID Report Map (Report Descriptor) for a boot-style keyboard.
///
/// Describes a single application collection with:
///   - 8 modifier key bits (input)
///   - 1 reserved byte (input, constant)
///   - 5 LED indicators + 3 padding bits (output)
///   - 6 key code bytes, keys 0-101 (input, array)
#[rustfmt::skip]
pub const REPORT_MAP: [u8; 65] = [
    0x05, 0x01,       // Usage Page (Generic Desktop)
    0x09, 0x06,       // Usage (Keyboard)
    0xA1, 0x01,       // Collection (Application)
    0x85, 0x00,       //   Report ID (0)
    //
    //   - Modifier keys (8 bits) -
    0x05, 0x07,       //   Usage Page (Keyboard/Keypad)
    0x19, 0xE0,       //   Usage Minimum (Left Control)
    0x29, 0xE7,       //   Usage Maximum (Right GUI)
    0x15, 0x00,       //   Logical Minimum (0)
    0x25, 0x01,       //   Logical Maximum (1)
    0x75, 0x01,       //   Report Size (1)
    0x95, 0x08,       //   Report Count (8)
    0x81, 0x02,       //   Input (Data, Variable, Absolute)
    //
    //   - Reserved byte -
    0x95, 0x01,       //   Report Count (1)
    0x75, 0x08,       //   Report Size (8)
    0x81, 0x01,       //   Input (Constant)
    //
    //   - LED output (5 bits + 3 padding) -
    0x95, 0x05,       //   Report Count (5)
    0x75, 0x01,       //   Report Size (1)
    0x05, 0x08,       //   Usage Page (LEDs)
    0x19, 0x01,       //   Usage Minimum (Num Lock)
    0x29, 0x05,       //   Usage Maximum (Kana)
    0x91, 0x02,       //   Output (Data, Variable, Absolute)
    0x95, 0x01,       //   Report Count (1)
    0x75, 0x03,       //   Report Size (3)
    0x91, 0x01,       //   Output (Constant)
    //
    //   - Key codes (6 bytes) -
    0x95, 0x06,       //   Report Count (6)
    0x75, 0x08,       //   Report Size (8)
    0x15, 0x00,       //   Logical Minimum (0)
    0x25, 0x65,       //   Logical Maximum (101)
    0x05, 0x07,       //   Usage Page (Keyboard/Keypad)
    0x19, 0x00,       //   Usage Minimum (0)
    0x29, 0x65,       //   Usage Maximum (101)
    0x81, 0x00,       //   Input (Data, Array)
    //
    0xC0,             // End Collection
];
