//! Minimal edit sequence for child lists
//!
//! Computes the ordered keep/insert/delete operations that turn one
//! sequence into another under a caller-supplied equality predicate.
//!
//! # Cost model
//!
//! | Operation | Cost |
//! |-----------|------|
//! | keep      | 0    |
//! | insert    | 1    |
//! | delete    | 1    |
//!
//! There is no substitution: every target item is produced by a keep or an
//! insert, every source item is consumed by a keep or a delete.
//!
//! # Decomposition
//!
//! The script is defined head-first. Equal heads are kept. Otherwise both
//! "delete the source head" and "insert the target head" are explored and
//! the shorter continuation wins, deletion winning ties. Evaluated naively
//! that recursion is exponential, so this module fills a table over all
//! suffix pairs and then walks it from `(0, 0)`, making the same choice the
//! recursion would at every step.
//!
//! # Complexity
//!
//! - Time: O(n * m) predicate calls for the table, O(n + m) for the walk
//! - Space: O(n * m) `u32` cells
//!
//! A common prefix is stripped first; it is always kept, so the table only
//! covers the differing tail. Suffixes are *not* stripped: with the
//! delete-first tie rule that would change which of two equal items is kept.

// =============================================================================
// Public Types
// =============================================================================

/// One step of an edit script.
///
/// `index` is the position in the evolving target sequence for `Keep` and
/// `Insert`, and the position of the removed item for `Delete` (deletes do
/// not advance the index).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit<T> {
    /// Source item survives as the target item at `index`
    Keep { source: T, target: T, index: usize },
    /// Target item is inserted at `index`
    Insert { target: T, index: usize },
    /// Source item at `index` is removed
    Delete { source: T, index: usize },
}

impl<T> Edit<T> {
    /// Position this edit applies at.
    pub fn index(&self) -> usize {
        match self {
            Edit::Keep { index, .. } | Edit::Insert { index, .. } | Edit::Delete { index, .. } => {
                *index
            }
        }
    }

    pub fn is_keep(&self) -> bool {
        matches!(self, Edit::Keep { .. })
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Edit::Insert { .. })
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Edit::Delete { .. })
    }
}

/// Counts of each edit kind in a script.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EditStats {
    pub kept: usize,
    pub inserted: usize,
    pub deleted: usize,
}

impl EditStats {
    /// Tally a script.
    pub fn from_edits<T>(edits: &[Edit<T>]) -> Self {
        edits.iter().fold(Self::default(), |mut stats, edit| {
            match edit {
                Edit::Keep { .. } => stats.kept += 1,
                Edit::Insert { .. } => stats.inserted += 1,
                Edit::Delete { .. } => stats.deleted += 1,
            }
            stats
        })
    }

    /// Number of operations that change the sequence (keeps excluded).
    pub fn edit_count(&self) -> usize {
        self.inserted + self.deleted
    }

    /// True when the two sequences were already equal.
    pub fn is_empty(&self) -> bool {
        self.edit_count() == 0
    }
}

// =============================================================================
// Main API
// =============================================================================

/// Minimal edit sequence using `PartialEq`.
pub fn minimal_edit_sequence<'a, T: PartialEq>(
    source: &'a [T],
    target: &'a [T],
) -> Vec<Edit<&'a T>> {
    minimal_edit_sequence_by(source, target, |a, b| a == b)
}

/// Minimal edit sequence using a custom equality predicate.
///
/// The predicate must be deterministic; it is consulted once per table cell
/// and again along the chosen path.
pub fn minimal_edit_sequence_by<'a, T, F>(
    source: &'a [T],
    target: &'a [T],
    mut eq: F,
) -> Vec<Edit<&'a T>>
where
    F: FnMut(&T, &T) -> bool,
{
    let mut steps: Vec<Step<'a, T>> = Vec::with_capacity(source.len().max(target.len()));

    // Common prefix is always kept by head-first decomposition
    let mut prefix = 0;
    while prefix < source.len() && prefix < target.len() && eq(&source[prefix], &target[prefix]) {
        steps.push(Step::Keep(&source[prefix], &target[prefix]));
        prefix += 1;
    }

    let source_rest = &source[prefix..];
    let target_rest = &target[prefix..];

    // Quick paths
    if source_rest.is_empty() {
        steps.extend(target_rest.iter().map(Step::Insert));
    } else if target_rest.is_empty() {
        steps.extend(source_rest.iter().map(Step::Delete));
    } else {
        walk_table(source_rest, target_rest, &mut eq, &mut steps);
    }

    assign_indices(steps)
}

// =============================================================================
// Table
// =============================================================================

enum Step<'a, T> {
    Keep(&'a T, &'a T),
    Insert(&'a T),
    Delete(&'a T),
}

/// Fill the suffix table and walk it from the top-left corner.
///
/// `len[i][j]` is the script length (keeps included) for `source[i..]`
/// against `target[j..]`.
fn walk_table<'a, T, F>(
    source: &'a [T],
    target: &'a [T],
    eq: &mut F,
    steps: &mut Vec<Step<'a, T>>,
) where
    F: FnMut(&T, &T) -> bool,
{
    let n = source.len();
    let m = target.len();
    let width = m + 1;
    let mut len = vec![0u32; (n + 1) * width];

    for j in 0..=m {
        len[n * width + j] = (m - j) as u32;
    }
    for i in 0..=n {
        len[i * width + m] = (n - i) as u32;
    }

    for i in (0..n).rev() {
        for j in (0..m).rev() {
            len[i * width + j] = if eq(&source[i], &target[j]) {
                1 + len[(i + 1) * width + j + 1]
            } else {
                1 + len[(i + 1) * width + j].min(len[i * width + j + 1])
            };
        }
    }

    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if eq(&source[i], &target[j]) {
            steps.push(Step::Keep(&source[i], &target[j]));
            i += 1;
            j += 1;
        } else if len[(i + 1) * width + j] <= len[i * width + j + 1] {
            // Ties go to deletion
            steps.push(Step::Delete(&source[i]));
            i += 1;
        } else {
            steps.push(Step::Insert(&target[j]));
            j += 1;
        }
    }
    steps.extend(source[i..].iter().map(Step::Delete));
    steps.extend(target[j..].iter().map(Step::Insert));
}

/// Index post-pass: +1 after keep/insert, unchanged after delete.
fn assign_indices<'a, T>(steps: Vec<Step<'a, T>>) -> Vec<Edit<&'a T>> {
    let mut index = 0;
    steps
        .into_iter()
        .map(|step| match step {
            Step::Keep(source, target) => {
                let edit = Edit::Keep { source, target, index };
                index += 1;
                edit
            }
            Step::Insert(target) => {
                let edit = Edit::Insert { target, index };
                index += 1;
                edit
            }
            Step::Delete(source) => Edit::Delete { source, index },
        })
        .collect()
}

// =============================================================================
// Replay
// =============================================================================

/// Replay an edit script against `source`, producing the edited sequence.
///
/// Inserts land at their index, deletes remove at their index, keeps are
/// no-ops. For any script returned by this module the result equals the
/// target sequence.
pub fn apply_edits<T: Clone>(source: &[T], edits: &[Edit<&T>]) -> Vec<T> {
    let mut out = source.to_vec();
    for edit in edits {
        match edit {
            Edit::Keep { .. } => {}
            Edit::Insert { target, index } => out.insert(*index, (*target).clone()),
            Edit::Delete { index, .. } => {
                out.remove(*index);
            }
        }
    }
    out
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn edits<'a>(source: &'a [i32], target: &'a [i32]) -> Vec<Edit<&'a i32>> {
        minimal_edit_sequence(source, target)
    }

    #[test]
    fn test_both_empty() {
        assert!(edits(&[], &[]).is_empty());
    }

    #[test]
    fn test_single_keep() {
        assert_eq!(edits(&[1], &[1]), vec![Edit::Keep { source: &1, target: &1, index: 0 }]);
    }

    #[test]
    fn test_insert_before_keep() {
        assert_eq!(
            edits(&[1], &[2, 1]),
            vec![
                Edit::Insert { target: &2, index: 0 },
                Edit::Keep { source: &1, target: &1, index: 1 },
            ]
        );
    }

    #[test]
    fn test_delete_before_keep() {
        assert_eq!(
            edits(&[2, 1], &[1]),
            vec![
                Edit::Delete { source: &2, index: 0 },
                Edit::Keep { source: &1, target: &1, index: 0 },
            ]
        );
    }

    #[test]
    fn test_empty_source_is_all_inserts() {
        let result = edits(&[], &[1, 2, 3]);
        assert!(result.iter().all(Edit::is_insert));
        let indices: Vec<_> = result.iter().map(Edit::index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_target_is_all_deletes() {
        let result = edits(&[1, 2, 3], &[]);
        assert!(result.iter().all(Edit::is_delete));
        assert!(result.iter().all(|e| e.index() == 0));
    }

    #[test]
    fn test_disjoint_prefers_delete_on_tie() {
        assert_eq!(
            edits(&[1], &[2]),
            vec![Edit::Delete { source: &1, index: 0 }, Edit::Insert { target: &2, index: 0 }]
        );

        let result = edits(&[1, 2], &[3, 4]);
        let stats = EditStats::from_edits(&result);
        assert_eq!(stats, EditStats { kept: 0, inserted: 2, deleted: 2 });
        assert!(result[0].is_delete());
    }

    #[test]
    fn test_subsequence_inputs() {
        let result = edits(&[1, 3], &[1, 2, 3]);
        assert_eq!(EditStats::from_edits(&result), EditStats { kept: 2, inserted: 1, deleted: 0 });
        assert_eq!(result[1], Edit::Insert { target: &2, index: 1 });

        let result = edits(&[1, 2, 3], &[1, 3]);
        assert_eq!(EditStats::from_edits(&result), EditStats { kept: 2, inserted: 0, deleted: 1 });
        assert_eq!(result[1], Edit::Delete { source: &2, index: 1 });
    }

    #[test]
    fn test_duplicate_items_keep_earliest() {
        // Head-first keeps the first `1`, then deletes the trailing one
        let result = edits(&[1, 1], &[1]);
        assert_eq!(
            result,
            vec![
                Edit::Keep { source: &1, target: &1, index: 0 },
                Edit::Delete { source: &1, index: 1 },
            ]
        );
    }

    #[test]
    fn test_replay_reproduces_target() {
        let cases: &[(&[i32], &[i32])] = &[
            (&[], &[]),
            (&[1, 2, 3], &[3, 2, 1]),
            (&[1, 2, 3, 4], &[1, 5, 3]),
            (&[5, 1, 5, 2], &[2, 5, 5, 1, 7]),
            (&[1, 1, 2, 2], &[2, 1, 2, 1]),
            (&[9, 8, 7], &[]),
            (&[], &[4, 4]),
        ];
        for (source, target) in cases {
            let script = edits(source, target);
            assert_eq!(&apply_edits(source, &script), target, "{source:?} -> {target:?}");
        }
    }

    #[test]
    fn test_custom_predicate() {
        let source = ["apple", "banana", "cherry"];
        let target = ["avocado", "blueberry"];
        // Compare by first letter only
        let result = minimal_edit_sequence_by(&source, &target, |a, b| {
            a.as_bytes()[0] == b.as_bytes()[0]
        });

        let stats = EditStats::from_edits(&result);
        assert_eq!(stats, EditStats { kept: 2, inserted: 0, deleted: 1 });
        assert_eq!(
            result[0],
            Edit::Keep { source: &"apple", target: &"avocado", index: 0 }
        );
    }

    #[test]
    fn test_script_length_is_minimal() {
        // n + m - lcs
        let source = [1, 2, 3, 4, 5, 6];
        let target = [2, 4, 6, 1, 3, 5];
        let result = edits(&source, &target);
        let stats = EditStats::from_edits(&result);
        assert_eq!(stats.kept, 3);
        assert_eq!(result.len(), source.len() + target.len() - 3);
    }

    /// Head-first recursion over the same cost model, deleting on ties.
    fn head_first<'a>(
        source: &'a [i32],
        target: &'a [i32],
        index: usize,
        eq: fn(&i32, &i32) -> bool,
    ) -> Vec<Edit<&'a i32>> {
        let prepend = |edit, rest: Vec<Edit<&'a i32>>| {
            let mut out = vec![edit];
            out.extend(rest);
            out
        };
        match (source.split_first(), target.split_first()) {
            (None, None) => Vec::new(),
            (Some((s, rest)), None) => {
                prepend(Edit::Delete { source: s, index }, head_first(rest, target, index, eq))
            }
            (None, Some((t, rest))) => {
                prepend(Edit::Insert { target: t, index }, head_first(source, rest, index + 1, eq))
            }
            (Some((s, s_rest)), Some((t, t_rest))) => {
                if eq(s, t) {
                    let rest = head_first(s_rest, t_rest, index + 1, eq);
                    return prepend(Edit::Keep { source: s, target: t, index }, rest);
                }
                let delete = prepend(
                    Edit::Delete { source: s, index },
                    head_first(s_rest, target, index, eq),
                );
                let insert = prepend(
                    Edit::Insert { target: t, index },
                    head_first(source, t_rest, index + 1, eq),
                );
                if delete.len() <= insert.len() { delete } else { insert }
            }
        }
    }

    fn all_sequences(alphabet: &[i32], max_len: usize) -> Vec<Vec<i32>> {
        let mut all = vec![Vec::new()];
        let mut frontier = vec![Vec::new()];
        for _ in 0..max_len {
            frontier = frontier
                .iter()
                .flat_map(|seq: &Vec<i32>| {
                    alphabet.iter().map(move |&x| {
                        let mut next = seq.clone();
                        next.push(x);
                        next
                    })
                })
                .collect();
            all.extend(frontier.iter().cloned());
        }
        all
    }

    #[test]
    fn test_exhaustive_small_inputs() {
        let same: fn(&i32, &i32) -> bool = |a, b| a == b;
        let parity: fn(&i32, &i32) -> bool = |a, b| a % 2 == b % 2;
        let sequences = all_sequences(&[0, 1, 2], 4);
        assert_eq!(sequences.len(), 121);

        for source in &sequences {
            for target in &sequences {
                for eq in [same, parity] {
                    let script = minimal_edit_sequence_by(source, target, eq);

                    let replayed = apply_edits(source, &script);
                    assert_eq!(replayed.len(), target.len(), "{source:?} -> {target:?}");
                    assert!(
                        replayed.iter().zip(target).all(|(a, b)| eq(a, b)),
                        "{source:?} -> {target:?} replayed as {replayed:?}"
                    );

                    assert_eq!(
                        script,
                        head_first(source, target, 0, eq),
                        "{source:?} -> {target:?}"
                    );
                }
            }
        }
    }
}
