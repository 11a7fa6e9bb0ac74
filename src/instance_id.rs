//! Canonical device instance ids.

use std::sync::OnceLock;

use regex::Regex;

/// Monitor device-interface class GUID carried by raw device ids.
const MONITOR_INTERFACE_CLASS: &str = "e6f07b5f-ee97-4a90-b076-33f57bf4eaa7";

static DEVICE_ID_PATTERN: OnceLock<Regex> = OnceLock::new();

fn device_id_pattern() -> &'static Regex {
    DEVICE_ID_PATTERN.get_or_init(|| {
        Regex::new(&format!(
            r"\\\\\?\\DISPLAY#(?P<hardware>\w+)#(?P<instance>[\w&]+)#\{{{MONITOR_INTERFACE_CLASS}\}}"
        ))
        .expect("device id pattern compiles")
    })
}

/// Derives the canonical `DISPLAY\<hardware>\<instance>` instance id from a
/// raw monitor device id of the form
/// `\\?\DISPLAY#<hardware>#<instance>#{<interface class>}`.
///
/// Returns the empty string when the input is empty or does not carry an
/// instance id. The empty value means "unavailable", never an error;
/// callers treat the instance id as an optional attribute.
pub fn device_instance_id(device_id: &str) -> String {
    if device_id.is_empty() {
        return String::new();
    }
    match device_id_pattern().captures(device_id) {
        Some(caps) => format!(r"DISPLAY\{}\{}", &caps["hardware"], &caps["instance"]),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::device_instance_id;

    #[test]
    fn derives_instance_id_from_well_formed_device_id() {
        let device_id =
            r"\\?\DISPLAY#ABC123#4&1a2b3c4d&0&UID0#{e6f07b5f-ee97-4a90-b076-33f57bf4eaa7}";
        assert_eq!(
            device_instance_id(device_id),
            r"DISPLAY\ABC123\4&1a2b3c4d&0&UID0"
        );
    }

    #[test]
    fn malformed_device_id_yields_empty() {
        assert_eq!(device_instance_id("garbage-string"), "");
    }

    #[test]
    fn empty_device_id_yields_empty() {
        assert_eq!(device_instance_id(""), "");
    }

    #[test]
    fn foreign_interface_class_yields_empty() {
        let device_id = r"\\?\DISPLAY#ABC123#4&1a2b3c4d&0&UID0#{00000000-0000-0000-0000-000000000000}";
        assert_eq!(device_instance_id(device_id), "");
    }

    proptest! {
        #[test]
        fn derivation_is_deterministic_across_reformatting(
            hardware in "[A-Za-z0-9]{3,12}",
            instance in "[A-Za-z0-9&]{1,24}",
        ) {
            let device_id = format!(
                r"\\?\DISPLAY#{hardware}#{instance}#{{e6f07b5f-ee97-4a90-b076-33f57bf4eaa7}}"
            );
            let canonical = device_instance_id(&device_id);
            prop_assert_eq!(&canonical, &format!(r"DISPLAY\{hardware}\{instance}"));

            // Reformatting the canonical id back into the raw shape and
            // deriving again must land on the same instance id.
            let reformatted = format!(
                r"\\?\DISPLAY#{hardware}#{instance}#{{e6f07b5f-ee97-4a90-b076-33f57bf4eaa7}}",
                hardware = canonical.split('\\').nth(1).unwrap(),
                instance = canonical.split('\\').nth(2).unwrap(),
            );
            prop_assert_eq!(device_instance_id(&reformatted), canonical);
        }
    }
}
