use cutscene_core::format::DeltaPixel;

/// Result of comparing two frames.
pub enum FrameDiff {
    /// Use this as a keyframe (too many changes, or no previous frame).
    Keyframe(Vec<u8>),
    /// Delta: only the changed pixels.
    Delta(Vec<DeltaPixel>),
}

/// Compare current palette indices against the previous frame, producing either a
/// delta or promoting to keyframe. `width` maps the flat index back to x,y.
pub fn compute_delta(prev: &[u8], current: &[u8], width: u16, force_keyframe: bool) -> FrameDiff {
    if force_keyframe || prev.len() != current.len() {
        return FrameDiff::Keyframe(current.to_vec());
    }

    let deltas: Vec<DeltaPixel> = prev
        .iter()
        .zip(current)
        .enumerate()
        .filter(|(_, (a, b))| a != b)
        .map(|(i, (_, &index))| DeltaPixel {
            x: (i % width as usize) as u16,
            y: (i / width as usize) as u16,
            index,
        })
        .collect();

    // A delta record costs 5 bytes against 1 per keyframe pixel
    if deltas.len() * DeltaPixel::SIZE > current.len() {
        FrameDiff::Keyframe(current.to_vec())
    } else {
        FrameDiff::Delta(deltas)
    }
}
