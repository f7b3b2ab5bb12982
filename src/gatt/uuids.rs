//! Bluetooth SIG assigned numbers used by the Health Thermometer service.

use uuid::Uuid;

/// Health Thermometer service
pub const HEALTH_THERMOMETER_SERVICE: u16 = 0x1809;

/// Temperature Measurement characteristic
pub const TEMPERATURE_MEASUREMENT: u16 = 0x2A1C;

/// Client Characteristic Configuration descriptor
pub const CLIENT_CHARACTERISTIC_CONFIGURATION: u16 = 0x2902;

/// Bluetooth Base UUID `00000000-0000-1000-8000-00805F9B34FB`
const BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_0080_5F9B_34FB;
const SHORT_MASK: u128 = 0xFFFF_FFFF << 96;

/// Expand a 16-bit assigned number onto the Base UUID.
pub const fn uuid16(short: u16) -> Uuid {
    Uuid::from_u128(BASE_UUID | ((short as u128) << 96))
}

/// Recover the 16-bit form if `uuid` lies on the Base UUID.
pub fn as_uuid16(uuid: &Uuid) -> Option<u16> {
    let value = uuid.as_u128();
    if value & !SHORT_MASK != BASE_UUID {
        return None;
    }
    u16::try_from(value >> 96).ok()
}

/// Short display form, `0x1809` for SIG UUIDs and the full form otherwise.
pub fn display(uuid: &Uuid) -> String {
    match as_uuid16(uuid) {
        Some(short) => format!("0x{:04X}", short),
        None => uuid.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid16_expansion() {
        assert_eq!(
            uuid16(HEALTH_THERMOMETER_SERVICE).to_string(),
            "00001809-0000-1000-8000-00805f9b34fb"
        );
        assert_eq!(
            uuid16(TEMPERATURE_MEASUREMENT).to_string(),
            "00002a1c-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_as_uuid16() {
        assert_eq!(as_uuid16(&uuid16(0x2902)), Some(0x2902));
        let vendor = Uuid::parse_str("6e400001-b5a3-f393-e0a9-e50e24dcca9e").unwrap();
        assert_eq!(as_uuid16(&vendor), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(display(&uuid16(TEMPERATURE_MEASUREMENT)), "0x2A1C");
    }
}
