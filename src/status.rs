//! Structured outcome reporting for tag operations.
//! Every tag transaction resolves to either a typed success value or an
//! [`OperationStatus`] describing the precise failure, its classification and
//! the memory block involved.

use crate::error::{self, RfidError};

// RFID result codes as reported by the reader firmware, plus the protocol
// codes defined by the ISO 15693 / ISO 14443 standards. Codes above 1000 are
// transient reader-side conditions; everything else is final for the request
// that triggered it.
define_tag_codes! {
    SUCCESS = 0 => "Success (no error)",

    // ISO standard protocol-level codes (positive, final)
    COMMAND_NOT_SUPPORTED = 1 => "Command is not supported",
    COMMAND_NOT_RECOGNIZED = 2 => "Command is not recognized",
    COMMAND_OPTION_NOT_RECOGNIZED = 3 => "Command option is not recognized",
    COMMAND_CANNOT_BE_PROCESSED_IN_TIME = 4 => "Command cannot be processed in time",
    UNDOCUMENTED_ERROR = 15 => "Undocumented error",
    BLOCK_NOT_AVAILABLE = 16 => "Block is not available",
    BLOCK_ALREADY_LOCKED = 17 => "Block is already locked and thus cannot be locked again",
    BLOCK_LOCKED = 18 => "Block is locked and its content cannot be changed",
    BLOCK_NOT_SUCCESSFULLY_PROGRAMMED = 19 => "Block was not successfully programmed",
    BLOCK_NOT_SUCCESSFULLY_LOCKED = 20 => "Block was not successfully locked",
    BLOCK_IS_PROTECTED = 21 => "Block is protected",
    CRYPTOGRAPHIC_ERROR = 64 => "Generic cryptographic error",

    // Reader firmware codes (negative, final)
    INVALID_CMD_ARGUMENTS = -66 => "Invalid command arguments",
    UNKNOWN_CAPABILITIES = -67 => "Unknown capabilities",
    MEMORY_NOT_SUPPORTED = -68 => "Memory no present",
    INVALID_BLOCK_INDEX = -69 => "Invalid block index",
    MEM_SPACE_UNVERRIFIABLE = -70 => "Memory space not verifiable",
    SIZE_DATA_INVALID = -71 => "Memory size data invalid",
    END_OF_MESSAGE_MISSING = -72 => "End of message missing",
    DIGEST_MISMATCH = -73 => "Digest mismatch",
    WRONG_KEY_VALUE = -74 => "Wrong key value",
    TRANSFER_CLOSED = -75 => "Transfer closed",
    COULD_NOT_BUILD_REQUEST = -76 => "Could not build request",
    INVALID_OPTIONS = -77 => "Invalid transfer options",
    UNEXPECTED_RESPONSE = -78 => "Unexpected tag response",
    AFI_NOT_AVAILABLE = -79 => "AFI byte is not available",
    DSFID_NOT_AVAILABLE = -80 => "DSFID byte is not available",
    TAG_RESPONSE_TOO_SHORT = -81 => "Tag's response is too short",
    DEC_EXPECTED = -82 => "Error, decimal value expected",
    DEC_INVALID = -83 => "Decimal value is not valid",
    HEX_EXPECTED = -84 => "Error, hexadecimal value expected",
    HEX_INVALID = -85 => "Hexadecimal value is not valid",
    NOT_SAME_SECTOR = -86 => "Blocks are not in the same sector",
    MIFARE_AUTHENTICATED = -87 => "Tag is already authenticated",
    NO_DATABLOCK = -88 => "No data block",
    KEYB_IS_READABLE = -89 => "Key B is readable",
    OPERATION_NOT_EXECUTED = -90 => "Operation was not executed",
    BLOCK_MODE_ERROR = -91 => "Block mode error",
    BLOCK_NOT_WRITABLE = -92 => "Block is not writable",
    BLOCK_ACCESS_ERROR = -93 => "Block access error",
    BLOCK_NOT_AUTHENTICATED = -94 => "Block is not authenticated",
    ACCESS_KEY_BIT_NOT_WRITABLE = -95 => "Access key bit is not writable",
    USE_KEYA_FOR_AUTH = -96 => "Use Key A for authentication",
    USE_KEYB_FOR_AUTH = -97 => "Use Key B for authentication",
    KEY_NOT_CHANGEABLE = -98 => "Key is not changeable",
    BLOCK_TOO_HIGH = -99 => "Block index is too high",
    AUTH_ERR = -100 => "Authentication Error (i.e. wrong key)",
    NOKEY_SELECT = -101 => "No key selected, select a temporary or a static key",
    CARD_NOT_SELECTED = -102 => "Card is not selected",
    BLOCK_TO_READ_NONE = -103 => "Number of blocks to read is 0",
    NO_TAG = -104 => "No tag detected",
    TOO_MUCH_DATA = -105 => "Too much data (too many blocks requested)",
    CON_NOT_SATISFIED = -106 => "Conditions not satisfied",
    BLOCK_IS_SPECIAL = -107 => "Bad parameter: block is special, use Raw Access",
    READ_BEYOND_ANNOUNCED_SIZE = -108 => "Attempt to read more than announced size",
    BLOCK_ZERO_IS_RESERVED = -109 => "Block 0 is reserved and cannot be used",
    VALUE_BLOCK_BAD_FORMAT = -110 => "One value block is not properly initialized",
    ISO15693_ONLY_FEATURE = -111 => "Feature available on ISO 15693 only",
    ISO14443_ONLY_FEATURE = -112 => "Feature available on ISO 14443 only",
    MIFARE_CLASSIC_ONLY_FEATURE = -113 => "Feature available on ISO 14443 MIFARE Classic only",
    BLOCK_MIGHT_BE_PROTECTED = -114 => "Block might be protected",
    NO_SUCH_BLOCK = -115 => "No such block",
    COUNT_TOO_BIG = -116 => "Count parameter is too large",
    UNKNOWN_MEM_SIZE = -117 => "Tag memory size is unknown",
    MORE_THAN_2BLOCKS_MIGHT_NOT_WORK = -118 => "Writing more than two blocks at once might not be supported by this tag",
    READWRITE_NOT_SUPPORTED = -119 => "Read/write operation is not supported for this tag",
    UNEXPECTED_VICC_ID_IN_RESPONSE = -120 => "Unexpected VICC ID in response",
    LOCKBLOCK_NOT_SUPPORTED = -121 => "This tag does not support the lock block function",
    INTERNAL_ERROR_SHOULD_NEVER_HAPPEN = -122 => "Internal error that should never happen",
    INVALID_BLOCK_MODE_COMBINATION = -123 => "Invalid combination of block mode options",
    INVALID_ACCESS_MODE_COMBINATION = -124 => "Invalid combination of access mode options",
    INVALID_SIZE = -125 => "Invalid data size parameter",
    BAD_PASSWORD_FORMAT = -126 => "Bad password format or type",
    RADIO_IS_OFF = -127 => "Radio is OFF (refreshRate=0)",

    // Reader-side transient conditions (recoverable, a retry may succeed)
    READER_BUSY = 1001 => "Reader is busy",
    TAG_NOTFOUND = 1002 => "Tag not found",
    TAG_LEFT = 1003 => "Tag left during operation",
    TAG_JUSTLEFT = 1004 => "Tag left the reader field",
    TAG_COMMUNICATION_ERROR = 1005 => "Tag communication error",
    TAG_NOT_RESPONDING = 1006 => "Tag is not responding",
    TIMEOUT_ERROR = 1007 => "Timeout while waiting for the tag",
    COLLISION_DETECTED = 1008 => "Tag collision detected",
}

/// Messages for the local library-side codes defined in [`crate::error`].
fn local_message(code: i32) -> Option<&'static str> {
    match code {
        error::ERR_NOT_INITIALIZED => Some("API not initialized"),
        error::ERR_INVALID_ARGUMENT => Some("Invalid argument"),
        error::ERR_NOT_SUPPORTED => Some("Operation not supported"),
        error::ERR_DEVICE_NOT_FOUND => Some("Device not found"),
        error::ERR_DEVICE_BUSY => Some("Device busy"),
        error::ERR_TIMEOUT => Some("Operation timed out"),
        error::ERR_IO_ERROR => Some("I/O error"),
        error::ERR_NO_MORE_DATA => Some("No more data"),
        error::ERR_UNAUTHORIZED => Some("Unauthorized access"),
        _ => None,
    }
}

/// Broad outcome category of a tag operation, derived purely from the
/// numeric result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Code 0: the operation completed.
    Success,
    /// Codes above 1000: a reader-side transient condition (tag not found,
    /// tag left, reader busy). Retrying after a short delay may succeed.
    Recoverable,
    /// Everything else: device, protocol or library failure that a plain
    /// retry will not fix.
    NonRecoverable,
}

/// Classifies a raw result code. Total over all integers.
pub fn classify(code: i32) -> Classification {
    if code == 0 {
        Classification::Success
    } else if code > 1000 {
        Classification::Recoverable
    } else {
        Classification::NonRecoverable
    }
}

/// Fallback message when the code is not in the specific tables.
fn generic_message(code: i32) -> String {
    if code == 0 {
        "Success (no error)".to_string()
    } else if code < 0 {
        if code > -50 {
            format!("Unknown library error ({})", code)
        } else {
            format!("Non-recoverable RFID error ({})", code)
        }
    } else if code > 1000 {
        format!("Recoverable RFID error ({})", code)
    } else {
        format!("Non-recoverable RFID error ({})", code)
    }
}

/// Resolves the human-readable message for a result code, with the failing
/// block appended when known. Specific table entries always win over the
/// generic range-derived message; the classification is unaffected either way.
pub fn resolve_message(code: i32, error_block: i32) -> String {
    let base = specific_message(code)
        .or_else(|| local_message(code))
        .map(str::to_string)
        .unwrap_or_else(|| generic_message(code));
    if error_block >= 0 {
        format!("{} (block {})", base, error_block)
    } else {
        base
    }
}

/// Inclusive range of memory blocks actually affected by an operation.
/// `first == -1` means the device did not report a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub first: i32,
    pub last: i32,
}

impl BlockRange {
    pub const NONE: BlockRange = BlockRange { first: -1, last: -1 };

    pub fn new(first: i32, last: i32) -> Self {
        Self { first, last }
    }
}

/// Detailed outcome of one failed tag transaction.
///
/// Block indices are stored 0-based; `-1` means not applicable. The device
/// reports them 1-based, the conversion happens at construction.
#[derive(Debug, Clone)]
pub struct OperationStatus {
    tag_id: String,
    error_code: i32,
    error_block: i32,
    message: String,
    affected: BlockRange,
}

/// Result type of tag transactions: a typed success value, or the full
/// failure detail. Never a bare boolean.
pub type TagResult<T> = std::result::Result<T, OperationStatus>;

impl OperationStatus {
    /// Builds a status from a device response. `error_block`, `fab` and
    /// `lab` are the raw 1-based indices from the response envelope.
    pub fn from_device(
        tag_id: &str,
        error_code: i32,
        error_block: Option<i32>,
        fab: Option<i32>,
        lab: Option<i32>,
    ) -> Self {
        let error_block = error_block.map_or(-1, |b| b - 1);
        let affected = BlockRange::new(fab.map_or(-1, |b| b - 1), lab.map_or(-1, |b| b - 1));
        Self {
            tag_id: tag_id.to_string(),
            error_code,
            error_block,
            message: resolve_message(error_code, error_block),
            affected,
        }
    }

    /// Builds a status for a local failure (transport error, missing or
    /// undecodable response). The local code range (-50, 0) classifies as
    /// non-recoverable.
    pub fn local(tag_id: &str, err: &RfidError) -> Self {
        let code = err.local_code();
        Self {
            tag_id: tag_id.to_string(),
            error_code: code,
            error_block: -1,
            message: resolve_message(code, -1),
            affected: BlockRange::NONE,
        }
    }

    pub fn tag_id(&self) -> &str {
        &self.tag_id
    }

    /// Raw numeric result code (device, protocol or local).
    pub fn error_code(&self) -> i32 {
        self.error_code
    }

    /// 0-based index of the block where the failure occurred, or -1.
    pub fn error_block(&self) -> i32 {
        self.error_block
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Blocks actually touched before the failure, when reported.
    pub fn affected_blocks(&self) -> BlockRange {
        self.affected
    }

    pub fn classification(&self) -> Classification {
        classify(self.error_code)
    }

    /// True when a retry after a short delay may reasonably succeed.
    pub fn is_recoverable(&self) -> bool {
        self.classification() == Classification::Recoverable
    }
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tag {}: {} [{}]", self.tag_id, self.message, self.error_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ERR_IO_ERROR, ERR_TIMEOUT};

    #[test]
    fn classify_boundaries() {
        assert_eq!(classify(0), Classification::Success);
        assert_eq!(classify(1), Classification::NonRecoverable);
        assert_eq!(classify(1000), Classification::NonRecoverable);
        assert_eq!(classify(1001), Classification::Recoverable);
        assert_eq!(classify(-49), Classification::NonRecoverable);
        assert_eq!(classify(-50), Classification::NonRecoverable);
        assert_eq!(classify(i32::MAX), Classification::Recoverable);
        assert_eq!(classify(i32::MIN), Classification::NonRecoverable);
    }

    #[test]
    fn classify_sweep_matches_ranges() {
        for code in -2000..=2000 {
            let expect = if code == 0 {
                Classification::Success
            } else if code > 1000 {
                Classification::Recoverable
            } else {
                Classification::NonRecoverable
            };
            assert_eq!(classify(code), expect, "code {}", code);
        }
    }

    #[test]
    fn specific_messages_win_over_generic() {
        assert_eq!(resolve_message(TAG_NOTFOUND, -1), "Tag not found");
        assert_eq!(
            resolve_message(BLOCK_LOCKED, -1),
            "Block is locked and its content cannot be changed"
        );
        assert_eq!(
            resolve_message(AUTH_ERR, -1),
            "Authentication Error (i.e. wrong key)"
        );
        assert_eq!(resolve_message(ERR_TIMEOUT, -1), "Operation timed out");
    }

    #[test]
    fn generic_messages_per_range() {
        // Codes absent from every table fall back to range-derived text.
        assert_eq!(resolve_message(-33, -1), "Unknown library error (-33)");
        assert_eq!(resolve_message(-500, -1), "Non-recoverable RFID error (-500)");
        assert_eq!(resolve_message(999, -1), "Non-recoverable RFID error (999)");
        assert_eq!(resolve_message(2000, -1), "Recoverable RFID error (2000)");
    }

    #[test]
    fn block_suffix_rule() {
        assert_eq!(resolve_message(BLOCK_LOCKED, 7).ends_with("(block 7)"), true);
        assert!(!resolve_message(BLOCK_LOCKED, -1).contains("block"));
        // Block 0 still gets the suffix.
        assert!(resolve_message(BLOCK_LOCKED, 0).ends_with("(block 0)"));
    }

    #[test]
    fn device_status_converts_one_based_blocks() {
        let st = OperationStatus::from_device("04AABBCC", BLOCK_LOCKED, Some(5), Some(3), Some(6));
        assert_eq!(st.error_block(), 4);
        assert_eq!(st.affected_blocks(), BlockRange::new(2, 5));
        assert!(st.message().ends_with("(block 4)"));
        assert_eq!(st.classification(), Classification::NonRecoverable);
    }

    #[test]
    fn local_status_is_non_recoverable() {
        let st = OperationStatus::local("04AABBCC", &RfidError::Timeout);
        assert_eq!(st.error_code(), ERR_TIMEOUT);
        assert_eq!(st.classification(), Classification::NonRecoverable);
        assert_eq!(st.error_block(), -1);

        let st = OperationStatus::local("04AABBCC", &RfidError::Io("reset".into()));
        assert_eq!(st.error_code(), ERR_IO_ERROR);
        assert_eq!(st.message(), "I/O error");
    }
}
