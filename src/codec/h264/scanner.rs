//! Annex-B start code detection.

/// Length of the start code beginning exactly at `offset`: 4 for `00 00 00 01`,
/// 3 for `00 00 01`, otherwise 0.
pub fn start_code_length(data: &[u8], offset: usize) -> usize {
    match data.get(offset..) {
        Some([0x00, 0x00, 0x00, 0x01, ..]) => 4,
        Some([0x00, 0x00, 0x01, ..]) => 3,
        _ => 0,
    }
}

/// Index of the first start code at or after `offset`.
pub fn find_start_code(data: &[u8], offset: usize) -> Option<usize> {
    (offset..data.len()).find(|&i| start_code_length(data, i) != 0)
}
