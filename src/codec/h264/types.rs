use std::fmt;

/// NAL unit types the frame parser distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NALUnitType {
    CodedSliceNonIDR,
    CodedSliceIDR,
    SEI,
    SPS,
    PPS,
    /// Any type code the parser does not act on
    Other(u8),
}

impl From<u8> for NALUnitType {
    fn from(value: u8) -> Self {
        match value {
            1 => NALUnitType::CodedSliceNonIDR,
            5 => NALUnitType::CodedSliceIDR,
            6 => NALUnitType::SEI,
            7 => NALUnitType::SPS,
            8 => NALUnitType::PPS,
            other => NALUnitType::Other(other),
        }
    }
}

/// The three leading bytes of a sequence parameter set.
///
/// They are all a decoder needs to pick a codec profile; nothing else in the SPS is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpsParams {
    pub profile_idc: u8,
    pub constraint_flags: u8,
    pub level_idc: u8,
}

impl SpsParams {
    /// RFC 6381 codec string, e.g. `avc1.640028`
    pub fn codec_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SpsParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "avc1.{:02x}{:02x}{:02x}",
            self.profile_idc, self.constraint_flags, self.level_idc
        )
    }
}

/// Outcome of classifying one NAL unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NalUnitInfo {
    pub nal_type: NALUnitType,
    pub nal_ref_idc: u8,
    /// Present when the unit was an SPS
    pub sps: Option<SpsParams>,
}

impl NalUnitInfo {
    pub fn is_slice(&self) -> bool {
        matches!(
            self.nal_type,
            NALUnitType::CodedSliceNonIDR | NALUnitType::CodedSliceIDR
        )
    }

    pub fn is_key(&self) -> bool {
        self.nal_type == NALUnitType::CodedSliceIDR
    }
}
