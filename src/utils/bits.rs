use crate::error::{Result, RfbError};

/// A bit-level reader over a byte slice, most significant bit first.
///
/// Used for the fixed-width fields of NAL unit headers and parameter sets.
///
/// Example:
/// ```
/// use rfbdecode::utils::BitReader;
///
/// let data = [0b0110_0111];
/// let mut reader = BitReader::new(&data);
///
/// assert_eq!(reader.read_bit().unwrap(), false);   // forbidden_zero_bit
/// assert_eq!(reader.read_bits(2).unwrap(), 0b11);  // nal_ref_idc
/// assert_eq!(reader.read_bits(5).unwrap(), 7);     // nal_unit_type
/// ```
pub struct BitReader<'a> {
    data: &'a [u8],
    byte_offset: usize,
    bit_offset: u8,
}

impl<'a> BitReader<'a> {
    /// Creates a new BitReader from a byte slice
    pub fn new(data: &'a [u8]) -> Self {
        BitReader {
            data,
            byte_offset: 0,
            bit_offset: 0,
        }
    }

    /// Reads a single bit from the stream.
    /// Returns true for 1, false for 0.
    ///
    /// Returns error if end of data is reached.
    pub fn read_bit(&mut self) -> Result<bool> {
        if self.byte_offset >= self.data.len() {
            return Err(RfbError::Parser("reached end of data".into()));
        }

        let bit = (self.data[self.byte_offset] >> (7 - self.bit_offset)) & 1;
        self.bit_offset += 1;

        if self.bit_offset == 8 {
            self.bit_offset = 0;
            self.byte_offset += 1;
        }

        Ok(bit == 1)
    }

    /// Reads n bits and returns them as a big-endian number.
    ///
    /// Returns error if n > 32 or end of data is reached.
    pub fn read_bits(&mut self, n: u32) -> Result<u32> {
        if n > 32 {
            return Err(RfbError::Parser("too many bits requested".into()));
        }
        if (n as usize) > self.available_bits() {
            return Err(RfbError::Parser(format!(
                "need {} bits, {} available",
                n,
                self.available_bits()
            )));
        }

        let mut value = 0u32;
        let n = n as usize;

        for i in 0..n {
            if self.read_bit()? {
                value |= 1 << (n - 1 - i);
            }
        }

        Ok(value)
    }

    /// Reads eight bits as a byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Skips n bits in the stream.
    pub fn skip_bits(&mut self, n: u32) -> Result<()> {
        for _ in 0..n {
            self.read_bit()?;
        }
        Ok(())
    }

    /// Returns number of bits available to read.
    pub fn available_bits(&self) -> usize {
        (self.data.len().saturating_sub(self.byte_offset)) * 8 - self.bit_offset as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_read_bits() {
        let data = [0b10110011];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
        assert_eq!(reader.read_bits(5).unwrap(), 0b10011);

        // Cross-byte boundary
        let data = [0b10110011, 0b01011010];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
        assert_eq!(reader.read_bits(8).unwrap(), 0b10011010);

        let data = [0b10101010];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read_bits(0).unwrap(), 0);

        let data = [0xFF];
        let mut reader = BitReader::new(&data);
        assert!(reader.read_bits(33).is_err());
    }

    #[test]
    fn test_nal_header_fields() {
        // 0x65: forbidden=0, ref_idc=3, type=5
        let data = [0x65];
        let mut reader = BitReader::new(&data);
        assert!(!reader.read_bit().unwrap());
        assert_eq!(reader.read_bits(2).unwrap(), 3);
        assert_eq!(reader.read_bits(5).unwrap(), 5);
        assert_eq!(reader.available_bits(), 0);
    }

    #[test]
    fn test_short_read_consumes_nothing() {
        let data = [0x64, 0x00];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read_u8().unwrap(), 0x64);
        assert!(reader.read_bits(12).is_err());
        assert_eq!(reader.available_bits(), 8);
        assert_eq!(reader.read_u8().unwrap(), 0x00);
    }

    #[test]
    fn test_skip_bits() {
        let data = [0b10110011, 0b01011010];
        let mut reader = BitReader::new(&data);
        reader.skip_bits(3).unwrap();
        assert_eq!(reader.read_bits(5).unwrap(), 0b10011);
        assert!(reader.skip_bits(9).is_err());
    }

    #[quickcheck]
    fn prop_read_u8_matches_bytes(data: Vec<u8>) -> bool {
        let mut reader = BitReader::new(&data);
        data.iter().all(|&b| reader.read_u8().ok() == Some(b)) && reader.read_u8().is_err()
    }
}
