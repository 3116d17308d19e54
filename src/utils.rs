use crate::error::{FishbowlError, Result};

// --- Helper Functions ---

/// Parses `#RRGGBB` into opaque RGBA bytes.
pub fn parse_hex_color(hex: &str) -> Result<[u8; 4]> {
    let digits = hex
        .strip_prefix('#')
        .filter(|d| d.len() == 6 && d.is_ascii())
        .ok_or_else(|| FishbowlError::InvalidColor(hex.to_string()))?;
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map_err(|_| FishbowlError::InvalidColor(hex.to_string()))
    };
    Ok([channel(0..2)?, channel(2..4)?, channel(4..6)?, 255])
}

/// Sum of squared channel differences over R, G, B and A.
#[inline]
pub fn color_distance_sq(a: [u8; 4], b: [u8; 4]) -> i32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x as i32 - y as i32;
            d * d
        })
        .sum()
}

pub fn premultiply_rgba_in_place(bytes: &mut [u8]) {
    for pixel in bytes.chunks_exact_mut(4) {
        let alpha = pixel[3] as u16;
        pixel[0] = ((pixel[0] as u16 * alpha + 127) / 255) as u8;
        pixel[1] = ((pixel[1] as u16 * alpha + 127) / 255) as u8;
        pixel[2] = ((pixel[2] as u16 * alpha + 127) / 255) as u8;
    }
}

pub fn demultiply_rgba_in_place(bytes: &mut [u8]) {
    for pixel in bytes.chunks_exact_mut(4) {
        let alpha = pixel[3];
        if alpha == 0 {
            pixel[0] = 0;
            pixel[1] = 0;
            pixel[2] = 0;
            continue;
        }

        let alpha_u16 = alpha as u16;
        pixel[0] = ((pixel[0] as u16 * 255 + (alpha_u16 / 2)) / alpha_u16).min(255) as u8;
        pixel[1] = ((pixel[1] as u16 * 255 + (alpha_u16 / 2)) / alpha_u16).min(255) as u8;
        pixel[2] = ((pixel[2] as u16 * 255 + (alpha_u16 / 2)) / alpha_u16).min(255) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_hex_color("#FF6B35"), Ok([0xFF, 0x6B, 0x35, 255]));
        assert_eq!(parse_hex_color("#00ff00"), Ok([0, 255, 0, 255]));
    }

    #[test]
    fn rejects_malformed_hex() {
        for bad in ["FF6B35", "#FF6B3", "#GG0000", "#FF6B35AA", ""] {
            assert!(parse_hex_color(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn premultiply_then_demultiply_is_stable_on_premultiplied_data() {
        let mut data = vec![10, 20, 30, 40, 200, 100, 0, 255, 0, 0, 0, 0];
        premultiply_rgba_in_place(&mut data);
        let premultiplied = data.clone();
        demultiply_rgba_in_place(&mut data);
        premultiply_rgba_in_place(&mut data);
        assert_eq!(data, premultiplied);
    }

    #[test]
    fn distance_includes_alpha() {
        assert_eq!(color_distance_sq([0, 0, 0, 0], [0, 0, 0, 10]), 100);
        assert_eq!(color_distance_sq([1, 2, 3, 4], [1, 2, 3, 4]), 0);
    }
}
