/// Converts interleaved samples from `from` channels to `to` channels.
///
/// Mono is duplicated to every output channel, anything folded down to mono
/// is averaged, and other layouts keep the leading channels (missing ones are
/// silent).
pub fn remix(samples: &[f32], from: usize, to: usize) -> Vec<f32> {
    if from == to || from == 0 || to == 0 {
        return samples.to_vec();
    }

    let frames = samples.len() / from;
    let mut out = Vec::with_capacity(frames * to);

    for frame in samples.chunks_exact(from) {
        if from == 1 {
            out.extend(std::iter::repeat(frame[0]).take(to));
        } else if to == 1 {
            out.push(frame.iter().sum::<f32>() / from as f32);
        } else {
            for ch in 0..to {
                out.push(frame.get(ch).copied().unwrap_or(0.0));
            }
        }
    }

    out
}
