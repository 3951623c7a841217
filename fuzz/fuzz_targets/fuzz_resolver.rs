#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use secnav_core::{
    SectionId, SectionRegistry, TieBreak, VisibilityBatch, VisibilityMetric, VisibilitySnapshot,
    resolve_active,
};

const IDS: [&str; 6] = ["intro", "why", "projects", "impact", "next", "contact"];

#[derive(Debug, Arbitrary)]
struct Entry {
    section: u8,
    ratio: f64,
    top: f64,
    bottom: f64,
}

#[derive(Debug, Arbitrary)]
struct Input {
    len: u8,
    batches: Vec<Vec<Entry>>,
    previous: Option<u8>,
    hint: Option<String>,
    ratio_first: bool,
}

fn id_for(index: u8) -> &'static str {
    // One slot past the end produces ids the registry has never seen.
    IDS.get(usize::from(index) % (IDS.len() + 1))
        .copied()
        .unwrap_or("stray")
}

fuzz_target!(|input: Input| {
    let len = usize::from(input.len) % IDS.len() + 1;
    let Ok(registry) = SectionRegistry::from_pairs(IDS[..len].iter().map(|id| (*id, "label")))
    else {
        return;
    };

    let mut snapshot = VisibilitySnapshot::new();
    for entries in input.batches.iter().take(32) {
        let batch = VisibilityBatch::new(
            entries
                .iter()
                .take(64)
                .map(|e| VisibilityMetric::new(id_for(e.section), e.ratio, e.top, e.bottom))
                .collect(),
        );
        snapshot.merge(&batch, &registry);
    }
    // Stray ids never reach the snapshot.
    assert!(snapshot.iter().all(|m| registry.contains(m.section_id.as_str())));

    let previous = input.previous.map(|p| SectionId::new(id_for(p)));
    let tie_break = if input.ratio_first {
        TieBreak::RatioFirst
    } else {
        TieBreak::DistanceFirst
    };
    let active = resolve_active(
        &registry,
        &snapshot,
        previous.as_ref(),
        input.hint.as_deref(),
        tie_break,
    );
    assert!(registry.contains(active.as_str()));
});
