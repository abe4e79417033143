//! Frame checksum.
//!
//! Every frame carries a trailing CRC-8 over header and payload. The bus uses
//! the MAXIM-DOW polynomial (reflected 0x31, init 0x00).

use crc::{Crc, CRC_8_MAXIM_DOW};

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_MAXIM_DOW);

/// Compute the checksum over a byte range.
pub fn crc8(bytes: &[u8]) -> u8 {
    CRC8.checksum(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_check_value() {
        // CRC-8/MAXIM-DOW catalog check value.
        assert_eq!(crc8(b"123456789"), 0xA1);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(crc8(&[]), 0x00);
    }

    #[test]
    fn test_single_bit_flip_changes_checksum() {
        let data = [0x65, 0x6F, 0xDE, 0x02, 0x14, b'r'];
        let mut flipped = data;
        flipped[4] ^= 0x01;
        assert_ne!(crc8(&data), crc8(&flipped));
    }
}
