/// Fallback for zero-weight histograms.
pub const NEUTRAL_GRAY: [u8; 3] = [128, 128, 128];

/// Count-weighted average of RGB colors, rounded per channel.
///
/// `channel = round(sum(count_i * color_i[channel]) / sum(count_i))`,
/// with per-channel rounding (not truncation) to match the store's
/// precomputed bins. A zero total weight blends to neutral gray.
pub fn blend_weighted<I>(entries: I) -> [u8; 3]
where
    I: IntoIterator<Item = (u64, [u8; 3])>,
{
    let mut total = 0u64;
    let mut sums = [0.0f64; 3];
    for (count, color) in entries {
        total += count;
        for (sum, channel) in sums.iter_mut().zip(color) {
            *sum += count as f64 * channel as f64;
        }
    }
    if total == 0 {
        return NEUTRAL_GRAY;
    }
    let mut out = [0u8; 3];
    for (o, sum) in out.iter_mut().zip(sums) {
        *o = (sum / total as f64).round() as u8;
    }
    out
}
