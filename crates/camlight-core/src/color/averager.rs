/// Bytes per interleaved RGBA sample.
const CHANNELS: usize = 4;

/// Average the R, G and B channels of an interleaved RGBA buffer.
///
/// Each mean is rounded to the nearest integer with halves rounding up.
/// Alpha is ignored. An empty buffer averages to black. A trailing partial
/// sample (length not a multiple of four) is ignored.
pub fn average_rgb(rgba: &[u8]) -> (u8, u8, u8) {
    let mut sums = [0u64; 3];
    let mut count = 0u64;

    for px in rgba.chunks_exact(CHANNELS) {
        sums[0] += u64::from(px[0]);
        sums[1] += u64::from(px[1]);
        sums[2] += u64::from(px[2]);
        count += 1;
    }

    if count == 0 {
        return (0, 0, 0);
    }

    // floor((2 * sum + count) / (2 * count)) == round-half-up(sum / count)
    let mean = |sum: u64| -> u8 {
        let rounded = (2 * sum + count) / (2 * count);
        u8::try_from(rounded).unwrap_or(u8::MAX)
    };

    (mean(sums[0]), mean(sums[1]), mean(sums[2]))
}
