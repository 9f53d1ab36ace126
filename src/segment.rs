//! Folding of subtitle cues into audio segments.
//!
//! Subtitle editors often split one spoken sentence into several cues that
//! touch end-to-start. [`SegmentMerger`] rebuilds the sentence by joining cues
//! whose start equals the running segment's end, and emits a segment as soon
//! as a gap (of any size) appears.

use crate::subtitle::Cue;

/// Separator placed between the texts of merged cues
pub const TEXT_SEPARATOR: &str = ", ";

/// A merged unit emitted as one audio clip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

impl Segment {
    pub fn new<S: Into<String>>(start_ms: u64, end_ms: u64, text: S) -> Self {
        Self {
            start_ms,
            end_ms,
            text: text.into(),
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }

    fn extend(&mut self, cue: Cue) {
        self.end_ms = cue.end_ms;
        self.text.push_str(TEXT_SEPARATOR);
        self.text.push_str(&cue.text);
    }
}

impl From<Cue> for Segment {
    fn from(cue: Cue) -> Self {
        Self {
            start_ms: cue.start_ms,
            end_ms: cue.end_ms,
            text: cue.text,
        }
    }
}

#[derive(Debug, Default)]
enum MergerState {
    #[default]
    Empty,
    Open(Segment),
}

/// Two-state machine turning a cue stream into a segment stream.
///
/// Feed cues in file order with [`feed`](Self::feed); call
/// [`flush`](Self::flush) once after the last cue. Continuity is exact
/// timestamp equality: a one-millisecond gap starts a new segment.
#[derive(Debug, Default)]
pub struct SegmentMerger {
    state: MergerState,
}

impl SegmentMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one cue, returning the segment it closed, if any
    pub fn feed(&mut self, cue: Cue) -> Option<Segment> {
        if let MergerState::Open(current) = &mut self.state {
            if cue.start_ms == current.end_ms {
                current.extend(cue);
                return None;
            }
        }

        // Empty opens a segment; a discontinuity closes the current one
        match std::mem::replace(&mut self.state, MergerState::Open(cue.into())) {
            MergerState::Open(finished) => Some(finished),
            MergerState::Empty => None,
        }
    }

    /// Emit the open segment and return to the empty state
    pub fn flush(&mut self) -> Option<Segment> {
        match std::mem::take(&mut self.state) {
            MergerState::Open(segment) => Some(segment),
            MergerState::Empty => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, MergerState::Open(_))
    }
}

/// Merge a whole cue sequence at once
pub fn merge_cues<I: IntoIterator<Item = Cue>>(cues: I) -> Vec<Segment> {
    let mut merger = SegmentMerger::new();
    let mut segments: Vec<Segment> = cues.into_iter().filter_map(|cue| merger.feed(cue)).collect();
    segments.extend(merger.flush());
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merges_touching_cues_and_splits_on_gap() {
        let segments = merge_cues(vec![
            Cue::new(0, 1000, "a"),
            Cue::new(1000, 2000, "b"),
            Cue::new(3000, 4000, "c"),
        ]);
        assert_eq!(
            segments,
            vec![Segment::new(0, 2000, "a, b"), Segment::new(3000, 4000, "c")]
        );
    }

    #[test]
    fn test_single_cue_yields_single_segment() {
        assert_eq!(
            merge_cues(vec![Cue::new(500, 900, "only")]),
            vec![Segment::new(500, 900, "only")]
        );
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(merge_cues(Vec::new()).is_empty());
    }

    #[test]
    fn test_cue_at_zero_after_first_is_not_treated_as_first() {
        // A segment starting at 0 ms must still merge/split like any other
        let segments = merge_cues(vec![
            Cue::new(0, 1000, "a"),
            Cue::new(1500, 2000, "b"),
        ]);
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn test_one_millisecond_gap_breaks_merge() {
        let segments = merge_cues(vec![
            Cue::new(0, 1000, "a"),
            Cue::new(1001, 2000, "b"),
        ]);
        assert_eq!(
            segments,
            vec![Segment::new(0, 1000, "a"), Segment::new(1001, 2000, "b")]
        );
    }

    #[test]
    fn test_feed_reports_closed_segment_only_on_discontinuity() {
        let mut merger = SegmentMerger::new();
        assert!(!merger.is_open());
        assert_eq!(merger.feed(Cue::new(0, 10, "a")), None);
        assert!(merger.is_open());
        assert_eq!(merger.feed(Cue::new(10, 20, "b")), None);
        assert_eq!(merger.feed(Cue::new(30, 40, "c")), Some(Segment::new(0, 20, "a, b")));
        assert_eq!(merger.flush(), Some(Segment::new(30, 40, "c")));
        assert!(!merger.is_open());
        assert_eq!(merger.flush(), None);
    }

    #[test]
    fn test_last_cue_is_flushed_even_when_just_opened() {
        let segments = merge_cues(vec![
            Cue::new(0, 1000, "a"),
            Cue::new(1000, 2000, "b"),
            Cue::new(5000, 6000, "tail"),
        ]);
        assert_eq!(segments.last(), Some(&Segment::new(5000, 6000, "tail")));
    }

    #[test]
    fn test_segments_are_ordered_and_disjoint() {
        let mut cues = Vec::new();
        let mut t = 0;
        for i in 0..50u64 {
            let gap = if i % 3 == 0 { 250 } else { 0 };
            let len = 100 + (i * 37) % 400;
            cues.push(Cue::new(t + gap, t + gap + len, format!("c{}", i)));
            t += gap + len;
        }

        let segments = merge_cues(cues);
        for pair in segments.windows(2) {
            assert!(pair[0].start_ms <= pair[0].end_ms);
            assert!(pair[0].end_ms < pair[1].start_ms);
        }
    }
}
