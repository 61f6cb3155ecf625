//! Connected-component labeling for thresholded detection maps.
//!
//! Two-pass labeling with union-find and path compression, 4-connectivity.
//! Labels are consecutive starting at 1; 0 is background.

use ndarray::{Array2, ArrayView2};

fn find_root(parents: &mut [usize], label: usize) -> usize {
    let mut current = label;
    while current != parents[current] {
        parents[current] = parents[parents[current]];
        current = parents[current];
    }
    current
}

fn union(parents: &mut [usize], a: usize, b: usize) {
    let ra = find_root(parents, a);
    let rb = find_root(parents, b);
    if ra != rb {
        // Smaller root wins so final labels come out in scan order
        if ra < rb {
            parents[rb] = ra;
        } else {
            parents[ra] = rb;
        }
    }
}

/// Label connected foreground regions of a binary image.
///
/// Any non-zero pixel is foreground. Returns the label map and the number of
/// components; component `k` (1-based) occupies the pixels labeled `k`.
pub fn label_components(binary: &ArrayView2<f32>) -> (Array2<usize>, usize) {
    let (rows, cols) = binary.dim();
    let mut labels = Array2::zeros((rows, cols));
    let mut parents: Vec<usize> = vec![0];
    let mut next = 1usize;

    // First pass: provisional labels and equivalences from the two
    // already-visited neighbors (above, left)
    for i in 0..rows {
        for j in 0..cols {
            if binary[[i, j]] == 0.0 {
                continue;
            }
            let above = if i > 0 { labels[[i - 1, j]] } else { 0 };
            let left = if j > 0 { labels[[i, j - 1]] } else { 0 };

            let label = match (above, left) {
                (0, 0) => {
                    parents.push(next);
                    let l = next;
                    next += 1;
                    l
                }
                (a, 0) => a,
                (0, l) => l,
                (a, l) => {
                    union(&mut parents, a, l);
                    a.min(l)
                }
            };
            labels[[i, j]] = label;
        }
    }

    // Resolve equivalences into consecutive final labels
    let mut remap = vec![0usize; next];
    let mut count = 0usize;
    for label in 1..next {
        let root = find_root(&mut parents, label);
        if remap[root] == 0 {
            count += 1;
            remap[root] = count;
        }
        remap[label] = remap[root];
    }

    for value in labels.iter_mut() {
        if *value != 0 {
            *value = remap[*value];
        }
    }

    (labels, count)
}
