// --- File: flood_fill.rs ---
//! Span (scanline) seed fill over a straight-alpha RGBA buffer.

use crate::utils::color_distance_sq;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// Seed outside the buffer, or the buffer does not match its dimensions.
    OutOfBounds,
    /// Seed pixel already equals the fill color; nothing was written.
    AlreadyFilled,
    Filled { pixels: usize },
}

/// Fills the region connected to `seed` whose pixels lie within `tolerance` of
/// the seed's original color. Matching uses `Σ(Δ²) ≤ tolerance² · 4` over all
/// four channels.
///
/// `pixels` is row-major RGBA, `width * height * 4` bytes. The visited map is
/// allocated per call so concurrent fills on separate buffers never share state.
pub fn flood_fill(
    pixels: &mut [u8],
    width: usize,
    height: usize,
    seed: (i64, i64),
    color: [u8; 4],
    tolerance: i32,
) -> FillOutcome {
    if pixels.len() != width * height * 4 {
        log::warn!(
            "flood fill buffer is {} bytes, expected {} for {}x{}",
            pixels.len(),
            width * height * 4,
            width,
            height
        );
        return FillOutcome::OutOfBounds;
    }
    let (sx, sy) = seed;
    if sx < 0 || sy < 0 || sx as usize >= width || sy as usize >= height {
        return FillOutcome::OutOfBounds;
    }
    let (sx, sy) = (sx as usize, sy as usize);

    let source = read(pixels, sy * width + sx);
    if source == color {
        return FillOutcome::AlreadyFilled;
    }

    // Any tolerance past 255 already admits every color, so saturate there.
    let tolerance = tolerance.unsigned_abs().min(255) as i32;
    let threshold = tolerance * tolerance * 4;
    let mut visited = vec![false; width * height];
    let mut stack: Vec<(usize, usize)> = Vec::with_capacity(256);
    stack.push((sx, sy));
    let mut filled = 0usize;

    // Qualifies = unvisited and close enough to the original seed color.
    let qualifies = |pixels: &[u8], visited: &[bool], idx: usize| {
        !visited[idx] && color_distance_sq(read(pixels, idx), source) <= threshold
    };

    while let Some((seed_x, y)) = stack.pop() {
        let row = y * width;

        // Walk left to the start of the span.
        let mut x = seed_x;
        while x > 0 && qualifies(pixels, &visited, row + x - 1) {
            x -= 1;
        }
        if !qualifies(pixels, &visited, row + x) {
            continue;
        }

        let mut span_up = false;
        let mut span_down = false;

        while x < width && qualifies(pixels, &visited, row + x) {
            let idx = row + x;
            write(pixels, idx, color);
            visited[idx] = true;
            filled += 1;

            if y > 0 {
                let up = qualifies(pixels, &visited, idx - width);
                if !span_up && up {
                    stack.push((x, y - 1));
                    span_up = true;
                } else if span_up && !up {
                    span_up = false;
                }
            }

            if y + 1 < height {
                let down = qualifies(pixels, &visited, idx + width);
                if !span_down && down {
                    stack.push((x, y + 1));
                    span_down = true;
                } else if span_down && !down {
                    span_down = false;
                }
            }

            x += 1;
        }
    }

    FillOutcome::Filled { pixels: filled }
}

#[inline]
fn read(pixels: &[u8], idx: usize) -> [u8; 4] {
    let o = idx * 4;
    [pixels[o], pixels[o + 1], pixels[o + 2], pixels[o + 3]]
}

#[inline]
fn write(pixels: &mut [u8], idx: usize, color: [u8; 4]) {
    let o = idx * 4;
    pixels[o..o + 4].copy_from_slice(&color);
}

// --- End of File: flood_fill.rs ---
