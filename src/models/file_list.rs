//! Ordered list of input documents and its editing operations.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use thiserror::Error;

/// Extensions accepted for input and output documents (lowercase, without dot).
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["hwp", "hwpx"];

/// Check whether `path` ends in one of [`SUPPORTED_EXTENSIONS`] (case-insensitive).
pub fn is_supported(path: &Utf8Path) -> bool {
    path.extension()
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// How the list is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Kept sorted by file name; manual moves are refused
    #[default]
    Name,
    /// Order is whatever the user arranged
    Manual,
}

/// Direction of a manual move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FileListError {
    #[error("Files can only be moved in manual sort mode")]
    ManualModeRequired,

    #[error("Index {index} is out of range for a list of {len} file(s)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Ordered, duplicate-free list of input documents.
///
/// The order is the merge order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileList {
    paths: IndexSet<Utf8PathBuf>,
    sort_mode: SortMode,
}

impl FileList {
    pub fn new(sort_mode: SortMode) -> Self {
        Self {
            paths: IndexSet::new(),
            sort_mode,
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Utf8Path> {
        self.paths.get_index(index).map(|p| p.as_path())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Utf8Path> {
        self.paths.iter().map(|p| p.as_path())
    }

    pub fn to_vec(&self) -> Vec<Utf8PathBuf> {
        self.paths.iter().cloned().collect()
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    /// Change the sort mode. Switching to [`SortMode::Name`] re-sorts immediately.
    pub fn set_sort_mode(&mut self, mode: SortMode) {
        self.sort_mode = mode;
        if mode == SortMode::Name {
            self.sort_by_name();
        }
    }

    /// Append supported, not-yet-listed paths. Returns how many were added.
    pub fn add<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        let mut added = 0;
        for path in paths {
            let path = path.into();
            if !is_supported(&path) {
                tracing::debug!("Skipping unsupported file: {}", path);
                continue;
            }
            if self.paths.insert(path.clone()) {
                added += 1;
            } else {
                tracing::debug!("Skipping duplicate file: {}", path);
            }
        }

        if self.sort_mode == SortMode::Name {
            self.sort_by_name();
        }
        added
    }

    /// Remove the entries at `indices`. Duplicate indices are ignored.
    ///
    /// Nothing is removed if any index is out of range.
    pub fn remove(&mut self, indices: &[usize]) -> Result<usize, FileListError> {
        let indices = self.validated(indices)?;
        // Highest first so earlier positions stay valid
        for &index in indices.iter().rev() {
            self.paths.shift_remove_index(index);
        }
        Ok(indices.len())
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    /// Sort by case-insensitive file name, then by case-insensitive full path.
    pub fn sort_by_name(&mut self) {
        self.paths.sort_by(|a, b| name_order(a, b));
    }

    /// Move the selected entries one position in `direction`.
    ///
    /// Entries already at the edge stay where they are, and so does a selected entry
    /// blocked by another selected entry that cannot move. Returns the new positions of
    /// the selected entries, sorted.
    pub fn move_selected(
        &mut self,
        indices: &[usize],
        direction: MoveDirection,
    ) -> Result<Vec<usize>, FileListError> {
        if self.sort_mode != SortMode::Manual {
            return Err(FileListError::ManualModeRequired);
        }
        let mut selected = self.validated(indices)?;
        let len = self.paths.len();

        let order: Vec<usize> = match direction {
            MoveDirection::Down => (0..len).rev().collect(),
            MoveDirection::Up => (0..len).collect(),
        };

        for i in order {
            if !selected.contains(&i) {
                continue;
            }
            let target = match direction {
                MoveDirection::Down if i + 1 < len => i + 1,
                MoveDirection::Up if i > 0 => i - 1,
                _ => continue,
            };
            if selected.contains(&target) {
                continue;
            }
            self.paths.swap_indices(i, target);
            selected.remove(&i);
            selected.insert(target);
        }

        Ok(selected.into_iter().collect())
    }

    fn validated(&self, indices: &[usize]) -> Result<BTreeSet<usize>, FileListError> {
        let len = self.paths.len();
        indices
            .iter()
            .map(|&index| {
                if index < len {
                    Ok(index)
                } else {
                    Err(FileListError::IndexOutOfRange { index, len })
                }
            })
            .collect()
    }
}

fn name_order(a: &Utf8Path, b: &Utf8Path) -> Ordering {
    let key = |p: &Utf8Path| {
        (
            p.file_name().unwrap_or_default().to_lowercase(),
            p.as_str().to_lowercase(),
        )
    };
    key(a).cmp(&key(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &FileList) -> Vec<&str> {
        list.iter().map(|p| p.file_name().unwrap()).collect()
    }

    fn manual(paths: &[&str]) -> FileList {
        let mut list = FileList::new(SortMode::Manual);
        list.add(paths.iter().copied());
        list
    }

    #[test]
    fn test_is_supported() {
        assert!(is_supported(Utf8Path::new("a.hwp")));
        assert!(is_supported(Utf8Path::new("C:/docs/B.HWPX")));
        assert!(!is_supported(Utf8Path::new("a.docx")));
        assert!(!is_supported(Utf8Path::new("hwp")));
    }

    #[test]
    fn test_add_filters_and_dedups() {
        let mut list = FileList::new(SortMode::Manual);
        let added = list.add(["b.hwp", "a.hwpx", "notes.txt", "b.hwp"]);

        assert_eq!(added, 2);
        assert_eq!(names(&list), vec!["b.hwp", "a.hwpx"]);
    }

    #[test]
    fn test_add_sorts_in_name_mode() {
        let mut list = FileList::new(SortMode::Name);
        list.add(["z/Beta.hwp", "a/alpha.hwp", "c/Gamma.hwpx"]);
        assert_eq!(names(&list), vec!["alpha.hwp", "Beta.hwp", "Gamma.hwpx"]);
    }

    #[test]
    fn test_sort_tie_breaks_on_full_path() {
        let mut list = manual(&["z/same.hwp", "A/Same.hwp", "m/same.hwp"]);
        list.sort_by_name();
        let paths: Vec<&str> = list.iter().map(|p| p.as_str()).collect();
        assert_eq!(paths, vec!["A/Same.hwp", "m/same.hwp", "z/same.hwp"]);
    }

    #[test]
    fn test_remove_multiple() {
        let mut list = manual(&["a.hwp", "b.hwp", "c.hwp", "d.hwp"]);
        assert_eq!(list.remove(&[0, 2, 2]), Ok(2));
        assert_eq!(names(&list), vec!["b.hwp", "d.hwp"]);
    }

    #[test]
    fn test_remove_out_of_range_is_rejected() {
        let mut list = manual(&["a.hwp", "b.hwp"]);
        assert_eq!(
            list.remove(&[0, 5]),
            Err(FileListError::IndexOutOfRange { index: 5, len: 2 })
        );
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_move_requires_manual_mode() {
        let mut list = FileList::new(SortMode::Name);
        list.add(["a.hwp", "b.hwp"]);
        let before = list.clone();

        assert_eq!(
            list.move_selected(&[1], MoveDirection::Up),
            Err(FileListError::ManualModeRequired)
        );
        assert_eq!(list, before);
    }

    #[test]
    fn test_move_down_and_up() {
        let mut list = manual(&["a.hwp", "b.hwp", "c.hwp"]);

        assert_eq!(list.move_selected(&[0], MoveDirection::Down), Ok(vec![1]));
        assert_eq!(names(&list), vec!["b.hwp", "a.hwp", "c.hwp"]);

        assert_eq!(list.move_selected(&[2], MoveDirection::Up), Ok(vec![1]));
        assert_eq!(names(&list), vec!["b.hwp", "c.hwp", "a.hwp"]);
    }

    #[test]
    fn test_adjacent_selection_moves_as_block() {
        let mut list = manual(&["a.hwp", "b.hwp", "c.hwp", "d.hwp"]);
        assert_eq!(list.move_selected(&[0, 1], MoveDirection::Down), Ok(vec![1, 2]));
        assert_eq!(names(&list), vec!["c.hwp", "a.hwp", "b.hwp", "d.hwp"]);
    }

    #[test]
    fn test_move_stops_at_boundary() {
        let mut list = manual(&["a.hwp", "b.hwp", "c.hwp"]);

        // Last item cannot move down; the one behind it is blocked
        assert_eq!(list.move_selected(&[1, 2], MoveDirection::Down), Ok(vec![1, 2]));
        assert_eq!(names(&list), vec!["a.hwp", "b.hwp", "c.hwp"]);

        assert_eq!(list.move_selected(&[0], MoveDirection::Up), Ok(vec![0]));
        assert_eq!(names(&list), vec!["a.hwp", "b.hwp", "c.hwp"]);
    }

    #[test]
    fn test_switching_to_name_mode_sorts() {
        let mut list = manual(&["b.hwp", "a.hwp"]);
        list.set_sort_mode(SortMode::Name);
        assert_eq!(names(&list), vec!["a.hwp", "b.hwp"]);
    }
}
