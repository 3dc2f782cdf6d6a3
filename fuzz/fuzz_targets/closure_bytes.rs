#![no_main]

use bossgraph_core::{AnchorSet, compute_closure, group_by_ancestor};
use libfuzzer_sys::fuzz_target;

// Every two bytes form one `(id, parent_id)` edge over a 256-id space.
fuzz_target!(|data: &[u8]| {
    let anchors: AnchorSet<u8> = data.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect();
    let closure = compute_closure(&anchors);

    for edge in anchors.iter().filter(|edge| !edge.is_self_loop()) {
        assert!(closure.contains(&edge.id, &edge.parent_id));
    }
    assert!(closure.iter().all(|edge| edge.id != edge.parent_id));

    let groups = group_by_ancestor(&closure);
    assert_eq!(groups.membership_count(), closure.len());
});
