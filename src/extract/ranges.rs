//! Range scanner: row spans of ammo dropoff tables and the patch divider that ends a block.

use crate::config::PATCH_DIVIDER_MIN_COLUMNS;
use crate::sheet::MergedRange;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeScan {
    /// Merge start row -> merge end row, for merges anchored at the ammo column.
    pub spans: BTreeMap<usize, usize>,
    /// Rows at or after this belong to another patch.
    pub stop_row: Option<usize>,
}

/// Scan merged ranges for one block. Only dividers starting after `first_row` stop the block.
pub fn scan_ranges(merges: &[MergedRange], ammo_col: usize, first_row: usize) -> RangeScan {
    let mut scan = RangeScan::default();
    for m in merges {
        if m.start_col == ammo_col {
            scan.spans.insert(m.start_row, m.end_row);
        }
        if m.width() >= PATCH_DIVIDER_MIN_COLUMNS && m.start_row > first_row {
            scan.stop_row = Some(match scan.stop_row {
                Some(r) => r.min(m.start_row),
                None => m.start_row,
            });
        }
    }
    scan
}

impl RangeScan {
    /// Last row of the dropoff table starting at `row`, if one starts there.
    /// An unmerged row whose range reads "0 ~" is a one-row table.
    pub fn span_at(&self, row: usize, range_text: &str) -> Option<usize> {
        if let Some(end) = self.spans.get(&row) {
            return Some(*end);
        }
        if is_open_zero_range(range_text) {
            return Some(row);
        }
        None
    }

    pub fn is_stopped(&self, row: usize) -> bool {
        self.stop_row.map(|s| row >= s).unwrap_or(false)
    }
}

fn is_open_zero_range(text: &str) -> bool {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    compact == "0~"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_spans_anchored_at_ammo_column_only() {
        let merges = vec![
            MergedRange::new(3, 6, 1, 1),
            MergedRange::new(7, 8, 1, 1),
            MergedRange::new(3, 10, 0, 0),
        ];
        let scan = scan_ranges(&merges, 1, 2);
        assert_eq!(scan.spans.get(&3), Some(&6));
        assert_eq!(scan.spans.get(&7), Some(&8));
        assert_eq!(scan.spans.len(), 2);
        assert_eq!(scan.stop_row, None);
    }

    #[test]
    fn widest_merges_mark_the_earliest_patch_divider() {
        let merges = vec![
            MergedRange::new(0, 0, 0, 25),
            MergedRange::new(40, 40, 0, 21),
            MergedRange::new(30, 30, 0, 19),
            MergedRange::new(20, 20, 0, 30),
        ];
        let scan = scan_ranges(&merges, 1, 2);
        assert_eq!(scan.stop_row, Some(20));
        assert!(scan.is_stopped(20));
        assert!(!scan.is_stopped(19));
    }

    #[test]
    fn single_unmerged_zero_range_row_is_its_own_span() {
        let scan = RangeScan::default();
        assert_eq!(scan.span_at(5, "0 ~"), Some(5));
        assert_eq!(scan.span_at(5, "0~"), Some(5));
        assert_eq!(scan.span_at(5, "10 ~"), None);
        assert_eq!(scan.span_at(5, ""), None);
    }

    #[test]
    fn merged_span_wins_over_single_row_rule() {
        let scan = scan_ranges(&[MergedRange::new(5, 7, 1, 1)], 1, 0);
        assert_eq!(scan.span_at(5, "0 ~"), Some(7));
    }
}
