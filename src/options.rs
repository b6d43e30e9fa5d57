//! Per-call request modifiers for tag operations.

use std::fmt::Write as _;

// Bits of the `o=` bitmask parameter.
const OPT_FORCE_SINGLE_BLOCK: u32 = 0x01;
const OPT_FORCE_MULTI_BLOCK: u32 = 0x02;
const OPT_RAW_ACCESS: u32 = 0x04;
const OPT_NO_BOUNDARY_CHECKS: u32 = 0x08;
const OPT_DRY_RUN: u32 = 0x10;

/// Security key type for authenticated (MIFARE Classic) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyType {
    /// No authentication key.
    #[default]
    None,
    /// MIFARE key A (device code 0x60).
    MifareKeyA,
    /// MIFARE key B (device code 0x61).
    MifareKeyB,
}

impl KeyType {
    fn device_code(self) -> Option<u8> {
        match self {
            KeyType::None => None,
            KeyType::MifareKeyA => Some(0x60),
            KeyType::MifareKeyB => Some(0x61),
        }
    }
}

/// Optional parameters attached to a tag command.
///
/// Defaults: no key, no forced block mode, raw access disabled, boundary
/// checks enabled, dry run disabled. The reader only reads these; a single
/// instance can be reused across calls.
///
/// `force_single_block_access` and `force_multi_block_access` are independent
/// flags sharing one bitmask; setting both at once is a caller error whose
/// device-side interpretation is unspecified. The encoding transmits both
/// bits verbatim rather than silently picking one.
#[derive(Debug, Clone, Default)]
pub struct RfidOptions {
    /// Key type to authenticate with, when the target blocks require it.
    pub key_type: KeyType,
    /// Authentication key, as a hex string matching `key_type`.
    pub hex_key: String,
    /// Force one device round-trip per block.
    pub force_single_block_access: bool,
    /// Force multi-block transfers even for short requests.
    pub force_multi_block_access: bool,
    /// Allow addressing special (configuration) blocks. Off by default:
    /// overwriting such blocks can irreversibly alter tag behavior.
    pub enable_raw_access: bool,
    /// Disable the device-side memory boundary checks.
    pub disable_boundary_checks: bool,
    /// Compute and verify the request without touching the tag memory.
    pub enable_dry_run: bool,
}

impl RfidOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes the active option set as the URL query fragment appended to
    /// every tag command: `&o=<bitmask>`, plus `&k=<type>:<hexkey>` when a
    /// key is configured.
    pub fn to_query(&self) -> String {
        let mut opts = 0u32;
        if self.force_single_block_access {
            opts |= OPT_FORCE_SINGLE_BLOCK;
        }
        if self.force_multi_block_access {
            opts |= OPT_FORCE_MULTI_BLOCK;
        }
        if self.enable_raw_access {
            opts |= OPT_RAW_ACCESS;
        }
        if self.disable_boundary_checks {
            opts |= OPT_NO_BOUNDARY_CHECKS;
        }
        if self.enable_dry_run {
            opts |= OPT_DRY_RUN;
        }
        let mut res = format!("&o={}", opts);
        if let Some(code) = self.key_type.device_code() {
            let _ = write!(res, "&k={:02x}:{}", code, self.hex_key);
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_encode_zero_bitmask() {
        assert_eq!(RfidOptions::new().to_query(), "&o=0");
    }

    #[test]
    fn each_flag_sets_exactly_its_bit() {
        let cases: [(fn(&mut RfidOptions), u32); 5] = [
            (|o| o.force_single_block_access = true, 1),
            (|o| o.force_multi_block_access = true, 2),
            (|o| o.enable_raw_access = true, 4),
            (|o| o.disable_boundary_checks = true, 8),
            (|o| o.enable_dry_run = true, 16),
        ];
        for (set, bit) in cases {
            let mut opts = RfidOptions::new();
            set(&mut opts);
            assert_eq!(opts.to_query(), format!("&o={}", bit));
        }
    }

    #[test]
    fn both_force_flags_encode_verbatim() {
        let mut opts = RfidOptions::new();
        opts.force_single_block_access = true;
        opts.force_multi_block_access = true;
        assert_eq!(opts.to_query(), "&o=3");
    }

    #[test]
    fn key_suffix_present_only_with_key_type() {
        let mut opts = RfidOptions::new();
        opts.hex_key = "ffffffffffff".to_string();
        // A key string without a key type is not transmitted.
        assert_eq!(opts.to_query(), "&o=0");

        opts.key_type = KeyType::MifareKeyA;
        assert_eq!(opts.to_query(), "&o=0&k=60:ffffffffffff");

        opts.key_type = KeyType::MifareKeyB;
        opts.enable_dry_run = true;
        assert_eq!(opts.to_query(), "&o=16&k=61:ffffffffffff");
    }
}
