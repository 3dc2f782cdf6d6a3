#![no_main]

use bossgraph_core::loader::{JsonLoader, edges_from_json};
use bossgraph_core::{RelationLoader, compute_closure};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(anchors) = edges_from_json(input) {
        let closure = compute_closure(&anchors);
        assert!(closure.iter().all(|edge| edge.id != edge.parent_id));
    }

    if let Ok(loader) = JsonLoader::parse(input) {
        if let Ok(partitions) = loader.partitions() {
            for partition in partitions {
                let _ = loader.load_anchors(&partition).map(|a| compute_closure(&a));
            }
        }
    }
});
