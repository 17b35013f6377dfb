//! Legacy advertising payload (Core Spec Vol 3, Part C, §11).
//!
//! Each AD structure is `[len, type, data...]` where `len` counts the type
//! byte plus data. The whole payload must fit the 31-byte legacy PDU.

use heapless::Vec;

use crate::config::ADV_PAYLOAD_MAX;
use crate::error::AdvertiseError;

pub const AD_TYPE_FLAGS: u8 = 0x01;
pub const AD_TYPE_INCOMPLETE_16BIT_UUIDS: u8 = 0x02;
pub const AD_TYPE_COMPLETE_16BIT_UUIDS: u8 = 0x03;
pub const AD_TYPE_SHORTENED_LOCAL_NAME: u8 = 0x08;
pub const AD_TYPE_COMPLETE_LOCAL_NAME: u8 = 0x09;

/// LE General Discoverable Mode | BR/EDR Not Supported.
pub const FLAGS_GENERAL_DISCOVERABLE: u8 = 0x06;

/// An encoded advertising payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdvertisementData {
    payload: Vec<u8, ADV_PAYLOAD_MAX>,
}

impl AdvertisementData {
    /// Build the payload for a connectable keyboard: flags, a complete
    /// 16-bit service UUID list holding `service_uuid`, then the local
    /// name. A name that does not fit is cut on a character boundary and
    /// sent as a shortened name.
    pub fn encode(service_uuid: u16, device_name: &str) -> Result<Self, AdvertiseError> {
        let mut payload = Vec::new();

        push_structure(&mut payload, AD_TYPE_FLAGS, &[FLAGS_GENERAL_DISCOVERABLE])?;
        push_structure(
            &mut payload,
            AD_TYPE_COMPLETE_16BIT_UUIDS,
            &service_uuid.to_le_bytes(),
        )?;

        if !device_name.is_empty() {
            // len + type bytes
            let room = ADV_PAYLOAD_MAX.saturating_sub(payload.len() + 2);
            if room == 0 {
                return Err(AdvertiseError::DataTooLarge);
            }

            let (name, ad_type) = if device_name.len() <= room {
                (device_name, AD_TYPE_COMPLETE_LOCAL_NAME)
            } else {
                let mut end = room;
                while !device_name.is_char_boundary(end) {
                    end -= 1;
                }
                (&device_name[..end], AD_TYPE_SHORTENED_LOCAL_NAME)
            };
            push_structure(&mut payload, ad_type, name.as_bytes())?;
        }

        Ok(Self { payload })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

fn push_structure(
    payload: &mut Vec<u8, ADV_PAYLOAD_MAX>,
    ad_type: u8,
    data: &[u8],
) -> Result<(), AdvertiseError> {
    let len = u8::try_from(data.len() + 1).map_err(|_| AdvertiseError::DataTooLarge)?;
    payload
        .push(len)
        .map_err(|_| AdvertiseError::DataTooLarge)?;
    payload
        .push(ad_type)
        .map_err(|_| AdvertiseError::DataTooLarge)?;
    payload
        .extend_from_slice(data)
        .map_err(|_| AdvertiseError::DataTooLarge)
}

/// Iterate `(type, data)` pairs. Stops at a zero length or a structure
/// running past the end.
fn structures(data: &[u8]) -> impl Iterator<Item = (u8, &[u8])> {
    let mut i = 0;
    core::iter::from_fn(move || {
        let len = *data.get(i)? as usize;
        if len == 0 || i + len >= data.len() {
            return None;
        }
        let item = (data[i + 1], &data[i + 2..i + 1 + len]);
        i += len + 1;
        Some(item)
    })
}

/// Check if raw advertisement data lists the 16-bit service `uuid`.
pub fn contains_service_uuid(data: &[u8], uuid: u16) -> bool {
    let needle = uuid.to_le_bytes();
    structures(data)
        .filter(|(ad_type, _)| {
            *ad_type == AD_TYPE_INCOMPLETE_16BIT_UUIDS || *ad_type == AD_TYPE_COMPLETE_16BIT_UUIDS
        })
        .any(|(_, uuids)| uuids.chunks_exact(2).any(|chunk| chunk == needle))
}

/// Extract the complete or shortened local name from advertisement data.
pub fn extract_device_name(data: &[u8]) -> Option<&str> {
    structures(data)
        .find(|(ad_type, _)| {
            *ad_type == AD_TYPE_SHORTENED_LOCAL_NAME || *ad_type == AD_TYPE_COMPLETE_LOCAL_NAME
        })
        .and_then(|(_, name)| core::str::from_utf8(name).ok())
}
