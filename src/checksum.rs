//! The log's 8-bit sum checksum.
//!
//! Every framed message ends in the sum (mod 256) of all preceding bytes,
//! header included.

pub fn sum8(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
}

/// Checks a complete frame, header through checksum byte.
pub fn frame_valid(frame: &[u8]) -> bool {
    match frame.split_last() {
        Some((check, body)) => sum8(body) == *check,
        None => false,
    }
}

/// Writes the checksum into the last byte of a frame under construction.
pub fn seal(frame: &mut [u8]) {
    let (check, body) = frame.split_last_mut().expect("frame must not be empty");
    *check = sum8(body);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_wraps() {
        assert_eq!(sum8(&[0xff, 0x02]), 0x01);
    }

    #[test]
    fn valid_timestamp_frame() {
        assert!(frame_valid(&[0x09, 0x00, 0x00, 0x0a, 0x13]));
        assert!(!frame_valid(&[0x09, 0x00, 0x00, 0x0a, 0x14]));
    }

    #[test]
    fn seal_produces_valid_frame() {
        let mut frame = [0x09, 0x00, 0x00, 0x0a, 0x00];
        seal(&mut frame);
        assert_eq!(frame[4], 0x13);
        assert!(frame_valid(&frame));
    }
}
