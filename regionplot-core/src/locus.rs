//! Locus discovery: greedy peak-calling with exclusion windows.
//!
//! The global best hit is always reported first, regardless of threshold.
//! Secondary peaks are then pulled from the remaining pool, each new locus
//! excluding every same-chromosome marker inside its window so no region is
//! reported twice. The pool shrinks by at least one record per iteration,
//! so the search terminates in at most N iterations for N records.

use crate::record::AssociationRecord;

/// Strategy for interpreting the dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocusMode {
    /// Best hit first, then secondary peaks below the significance threshold.
    Peaks,
    /// A single locus spanning the full extent of the best hit's chromosome.
    WholeDataset,
}

/// A genomic window centered on a significant marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Locus {
    /// Identity key of the anchor (best-hit) record.
    pub anchor: String,
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

/// Find independent significant loci.
///
/// `threshold` is the p-value below which secondary peaks are reported;
/// `padding` is the number of base pairs added on each side of an anchor.
/// Validation of the padding domain belongs to the caller. Loci are
/// returned in discovery order.
pub fn find_loci(
    records: &[AssociationRecord],
    threshold: f64,
    padding: u64,
    mode: LocusMode,
) -> Vec<Locus> {
    let Some(best) = min_p_record(records.iter()) else {
        return Vec::new();
    };

    if mode == LocusMode::WholeDataset {
        let mut start = best.pos;
        let mut end = best.pos;
        for r in records.iter().filter(|r| r.chrom == best.chrom) {
            start = start.min(r.pos);
            end = end.max(r.pos);
        }
        return vec![Locus {
            anchor: best.id.clone(),
            chrom: best.chrom.clone(),
            start,
            end,
        }];
    }

    let mut loci: Vec<Locus> = Vec::new();
    let mut pool: Vec<&AssociationRecord> = records.iter().collect();

    // The best hit is reported even when it misses the threshold.
    let first = make_locus(best, padding, &loci);
    pool.retain(|r| !first.contains(r));
    loci.push(first);

    loop {
        pool.retain(|r| r.p_value < threshold);
        let Some(hit) = min_p_record(pool.iter().copied()) else {
            break;
        };
        let locus = make_locus(hit, padding, &loci);
        pool.retain(|r| !locus.contains(r));
        loci.push(locus);
    }

    loci
}

impl Locus {
    fn contains(&self, record: &AssociationRecord) -> bool {
        record.chrom == self.chrom && self.start <= record.pos && record.pos <= self.end
    }
}

fn make_locus(anchor: &AssociationRecord, padding: u64, prior: &[Locus]) -> Locus {
    // Window start never goes below zero.
    let mut start = anchor.pos.saturating_sub(padding);
    let mut end = anchor.pos.saturating_add(padding);

    // Trim against already-reported loci so same-chromosome windows stay
    // disjoint. The anchor itself is never inside a prior window, so it
    // always survives the trim.
    for prev in prior.iter().filter(|l| l.chrom == anchor.chrom) {
        if prev.end < anchor.pos && prev.end >= start {
            start = prev.end + 1;
        }
        if prev.start > anchor.pos && prev.start <= end {
            end = prev.start - 1;
        }
    }

    Locus {
        anchor: anchor.id.clone(),
        chrom: anchor.chrom.clone(),
        start,
        end,
    }
}

/// Minimum-p record; ties broken by lexicographically smallest identity key
/// so discovery is deterministic.
fn min_p_record<'a, I>(records: I) -> Option<&'a AssociationRecord>
where
    I: IntoIterator<Item = &'a AssociationRecord>,
{
    records.into_iter().min_by(|a, b| {
        a.p_value
            .partial_cmp(&b.p_value)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    })
}
