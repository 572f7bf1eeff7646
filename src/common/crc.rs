// src/common/crc.rs

use super::error::CrcMismatch;

/// Generator polynomial used by both sensor families (x^8 + x^5 + x^4 + 1).
pub const CRC8_POLYNOMIAL: u8 = 0x31;
/// Initial value of the CRC register for every word.
pub const CRC8_INIT: u8 = 0xFF;

/// Calculates the Sensirion CRC-8 over the given bytes.
///
/// Shift-and-XOR, MSB first, no reflection and no final XOR. The sensors
/// checksum every 2-byte data word with it, but the function accepts any
/// slice and never panics.
///
/// # Arguments
///
/// * `data`: The bytes to checksum (normally the two data bytes of a word).
///
/// # Returns
///
/// The 8-bit checksum.
#[inline]
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = CRC8_INIT;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ CRC8_POLYNOMIAL
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Verifies one `[data, data, crc]` word from a sensor response.
///
/// # Returns
///
/// * `Ok([d0, d1])` with the two data bytes if the checksum matches.
/// * `Err(CrcMismatch)` describing the data, received and calculated CRC otherwise.
pub fn verify_word(word: &[u8; 3]) -> Result<[u8; 2], CrcMismatch> {
    let data = [word[0], word[1]];
    let calculated = crc8(&data);
    if calculated == word[2] {
        Ok(data)
    } else {
        Err(CrcMismatch {
            data,
            received: word[2],
            calculated,
        })
    }
}

/// Appends a data word and its checksum, producing the 3 bytes sent after an opcode.
pub fn encode_word(value: u16) -> [u8; 3] {
    let [hi, lo] = value.to_be_bytes();
    [hi, lo, crc8(&[hi, lo])]
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datasheet_example() {
        // Sensirion interface description: 0xBEEF -> 0x92
        assert_eq!(crc8(&[0xBE, 0xEF]), 0x92);
    }

    #[test]
    fn test_known_words() {
        // Data-ready response "ready" and the SPS30 float start argument.
        assert_eq!(crc8(&[0x00, 0x01]), 0xB0);
        assert_eq!(crc8(&[0x03, 0x00]), 0xAC);
        assert_eq!(crc8(&[0x00, 0x00]), 0x81);
    }

    #[test]
    fn test_matches_catalog_crc8_over_all_words() {
        // CRC-8/NRSC-5 is the catalogued name of poly 0x31, init 0xFF, no reflection.
        let reference = ::crc::Crc::<u8>::new(&::crc::CRC_8_NRSC_5);
        for hi in 0..=u8::MAX {
            for lo in 0..=u8::MAX {
                let ours = crc8(&[hi, lo]);
                assert_eq!(ours, reference.checksum(&[hi, lo]), "Mismatch for {:#04x}{:02x}", hi, lo);
                assert_eq!(ours, crc8(&[hi, lo]), "Not deterministic for {:#04x}{:02x}", hi, lo);
            }
        }
    }

    #[test]
    fn test_odd_lengths_do_not_panic() {
        assert_eq!(crc8(&[]), CRC8_INIT);
        let _ = crc8(&[0xFF; 7]);
    }

    #[test]
    fn test_verify_word() {
        assert_eq!(verify_word(&[0xBE, 0xEF, 0x92]), Ok([0xBE, 0xEF]));

        let err = verify_word(&[0xBE, 0xEF, 0x93]).unwrap_err();
        assert_eq!(err.data, [0xBE, 0xEF]);
        assert_eq!(err.received, 0x93);
        assert_eq!(err.calculated, 0x92);
    }

    #[test]
    fn test_encode_word() {
        assert_eq!(encode_word(0xBEEF), [0xBE, 0xEF, 0x92]);
        assert_eq!(encode_word(0x0300), [0x03, 0x00, 0xAC]);
    }
}
