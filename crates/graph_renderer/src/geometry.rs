//! Index geometry for the bar graph.
//!
//! Bars carry no vertex data. The index buffer is generated once for the
//! largest window; each frame only varies the index count and base vertex.

/// Quads covered by the shared index buffer.
pub const MAX_QUADS: u32 = 16384;
pub const VERTICES_PER_QUAD: u32 = 4;
pub const INDICES_PER_QUAD: u32 = 6;
/// Quads per indexed draw. One short of `MAX_QUADS` so no draw ever emits
/// index `0xFFFF`.
pub const QUADS_PER_DRAW: u32 = MAX_QUADS - 1;

/// Two triangles per quad: `base+0, base+1, base+2, base+1, base+2, base+3`,
/// with `base = quad * 4` wrapping in 16 bits.
pub fn quad_indices(quad_count: u32) -> Vec<u16> {
    let mut indices = Vec::with_capacity((quad_count * INDICES_PER_QUAD) as usize);
    for quad in 0..quad_count {
        let base = (quad.wrapping_mul(VERTICES_PER_QUAD) & 0xFFFF) as u16;
        indices.extend_from_slice(&[
            base,
            base.wrapping_add(1),
            base.wrapping_add(2),
            base.wrapping_add(1),
            base.wrapping_add(2),
            base.wrapping_add(3),
        ]);
    }
    indices
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawBatch {
    pub index_count: u32,
    pub base_vertex: i32,
}

/// Splits `window_size` bars into indexed draws of at most `QUADS_PER_DRAW`
/// quads. Each draw starts at index 0 and shifts by `chunk_start * 4`.
pub fn draw_batches(window_size: u32) -> impl Iterator<Item = DrawBatch> {
    (0..window_size)
        .step_by(QUADS_PER_DRAW as usize)
        .map(move |start| {
            let quads = (window_size - start).min(QUADS_PER_DRAW);
            DrawBatch {
                index_count: quads * INDICES_PER_QUAD,
                base_vertex: i32::try_from(start * VERTICES_PER_QUAD)
                    .expect("base vertex overflow"),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_indices_follow_two_triangle_pattern() {
        let indices = quad_indices(2);
        assert_eq!(indices, vec![0, 1, 2, 1, 2, 3, 4, 5, 6, 5, 6, 7]);
    }

    #[test]
    fn full_index_buffer_reaches_u16_limit() {
        let indices = quad_indices(MAX_QUADS);
        assert_eq!(indices.len(), (MAX_QUADS * INDICES_PER_QUAD) as usize);
        let last_quad = &indices[indices.len() - 6..];
        assert_eq!(last_quad, &[65532, 65533, 65534, 65533, 65534, 65535]);
        let largest_drawn = indices[..(QUADS_PER_DRAW * INDICES_PER_QUAD) as usize]
            .iter()
            .max()
            .copied();
        assert_eq!(largest_drawn, Some(65531));
    }

    #[test]
    fn small_window_is_a_single_draw() {
        let batches: Vec<_> = draw_batches(256).collect();
        assert_eq!(
            batches,
            vec![DrawBatch {
                index_count: 256 * 6,
                base_vertex: 0,
            }]
        );
    }

    #[test]
    fn large_window_is_split_at_draw_limit() {
        let batches: Vec<_> = draw_batches(32768).collect();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].index_count, QUADS_PER_DRAW * 6);
        assert_eq!(batches[1].base_vertex, (QUADS_PER_DRAW * 4) as i32);
        assert_eq!(batches[2].base_vertex, (2 * QUADS_PER_DRAW * 4) as i32);
        let quads: u32 = batches.iter().map(|batch| batch.index_count / 6).sum();
        assert_eq!(quads, 32768);
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        let batches: Vec<_> = draw_batches(QUADS_PER_DRAW).collect();
        assert_eq!(batches.len(), 1);
        assert!(draw_batches(0).next().is_none());
    }
}
