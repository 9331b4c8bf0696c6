//! Logging helpers for rendering raw link bytes on a single line.

/// Lowercase hex of at most `max` bytes, with an ellipsis when cut short.
pub fn hex_snippet(data: &[u8], max: usize) -> String {
    use std::fmt::Write;
    let shown = data.len().min(max);
    let mut out = String::with_capacity(shown * 2 + 3);
    for b in &data[..shown] {
        let _ = write!(&mut out, "{:02x}", b);
    }
    if data.len() > shown {
        out.push('…');
    }
    out
}

/// `0xAABBCCDD`, or `none` for a disabled header/terminator.
pub fn delimiter_label(value: u32) -> String {
    if value == 0 {
        "none".to_string()
    } else {
        format!("0x{:08X}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_payloads() {
        assert_eq!(hex_snippet(&[0x12, 0x34], 8), "1234");
        assert_eq!(hex_snippet(&[0xde, 0xad, 0xbe, 0xef], 2), "dead…");
        assert_eq!(hex_snippet(&[], 4), "");
    }

    #[test]
    fn zero_delimiter_reads_as_none() {
        assert_eq!(delimiter_label(0), "none");
        assert_eq!(delimiter_label(0xAABB_CCDD), "0xAABBCCDD");
    }
}
