//! Tag type and memory geometry description.

/// Tag technology, as reported by the reader's numeric type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagType {
    Iso15693,
    Iso14443,
    MifareUltralight,
    MifareClassic1K,
    MifareClassic4K,
    MifareDesfire,
    Ntag213,
    Ntag215,
    Ntag216,
    Ntag424Dna,
    Unknown,
}

impl TagType {
    /// Maps the device-reported type code. Unrecognized codes map to
    /// `Unknown` rather than failing.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => TagType::Iso15693,
            2 => TagType::Iso14443,
            3 => TagType::MifareUltralight,
            4 => TagType::MifareClassic1K,
            5 => TagType::MifareClassic4K,
            6 => TagType::MifareDesfire,
            7 => TagType::Ntag213,
            8 => TagType::Ntag215,
            9 => TagType::Ntag216,
            10 => TagType::Ntag424Dna,
            _ => TagType::Unknown,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            TagType::Iso15693 => "ISO 15693",
            TagType::Iso14443 => "ISO 14443",
            TagType::MifareUltralight => "ISO 14443 MIFARE Ultralight",
            TagType::MifareClassic1K => "ISO 14443 MIFARE Classic 1K",
            TagType::MifareClassic4K => "ISO 14443 MIFARE Classic 4K",
            TagType::MifareDesfire => "ISO 14443 MIFARE DESFire",
            TagType::Ntag213 => "ISO 14443 NTAG 213",
            TagType::Ntag215 => "ISO 14443 NTAG 215",
            TagType::Ntag216 => "ISO 14443 NTAG 216",
            TagType::Ntag424Dna => "ISO 14443 NTAG 424 DNA",
            TagType::Unknown => "unknown RFID tag type",
        }
    }
}

/// Immutable description of one tag, built from the reader's `info` response.
///
/// `first_usable_block..=last_usable_block` is the block range available for
/// application data; locked or special blocks may still appear inside it.
#[derive(Debug, Clone)]
pub struct RfidTagInfo {
    tag_id: String,
    tag_type: TagType,
    type_code: i32,
    total_size: u32,
    usable_size: u32,
    block_size: u32,
    first_usable_block: u32,
    last_usable_block: u32,
}

impl RfidTagInfo {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        tag_id: &str,
        type_code: i32,
        total_size: u32,
        usable_size: u32,
        block_size: u32,
        first_usable_block: u32,
        last_usable_block: u32,
    ) -> Self {
        Self {
            tag_id: tag_id.to_string(),
            tag_type: TagType::from_code(type_code),
            type_code,
            total_size,
            usable_size,
            block_size,
            first_usable_block,
            last_usable_block,
        }
    }

    /// Unique hardware identifier of the tag.
    pub fn tag_id(&self) -> &str {
        &self.tag_id
    }

    pub fn tag_type(&self) -> TagType {
        self.tag_type
    }

    /// Raw numeric type code, useful when `tag_type()` is `Unknown`.
    pub fn type_code(&self) -> i32 {
        self.type_code
    }

    /// Total tag memory in bytes, including special blocks.
    pub fn memory_size(&self) -> u32 {
        self.total_size
    }

    /// Bytes available for application data.
    pub fn usable_size(&self) -> u32 {
        self.usable_size
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn first_usable_block(&self) -> u32 {
        self.first_usable_block
    }

    pub fn last_usable_block(&self) -> u32 {
        self.last_usable_block
    }

    /// Inclusive block range spanned by `byte_count` bytes starting at the
    /// beginning of `first_block`. Returns `(first_block, first_block)` for
    /// an empty request.
    pub fn blocks_for(&self, first_block: u32, byte_count: u32) -> (u32, u32) {
        if byte_count == 0 || self.block_size == 0 {
            return (first_block, first_block);
        }
        let spanned = byte_count.div_ceil(self.block_size);
        (first_block, first_block + spanned - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_codes_map_to_known_types() {
        assert_eq!(TagType::from_code(1), TagType::Iso15693);
        assert_eq!(TagType::from_code(4), TagType::MifareClassic1K);
        assert_eq!(TagType::from_code(10), TagType::Ntag424Dna);
        assert_eq!(TagType::from_code(0), TagType::Unknown);
        assert_eq!(TagType::from_code(99), TagType::Unknown);
        assert_eq!(TagType::from_code(-3), TagType::Unknown);
    }

    #[test]
    fn block_span_arithmetic() {
        // NTAG-style geometry: 4-byte blocks.
        let info = RfidTagInfo::new("04AABBCC", 7, 180, 144, 4, 4, 39);
        assert_eq!(info.blocks_for(4, 0), (4, 4));
        assert_eq!(info.blocks_for(4, 1), (4, 4));
        assert_eq!(info.blocks_for(4, 4), (4, 4));
        assert_eq!(info.blocks_for(4, 5), (4, 5));
        assert_eq!(info.blocks_for(4, 20), (4, 8));
    }
}
