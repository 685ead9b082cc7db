//! The group queue: an ordered, resumable traversal of image groups.
//!
//! Groups derived from a directory tree are walked front to back. The
//! queue keeps the full history, so a finished group can be revisited
//! ([`GroupQueue::retreat`]), the current group can be duplicated for
//! another pass ([`GroupQueue::repeat`]), and a prior run can be resumed
//! from its last logged group id ([`GroupQueue::resume`]).
//!
//! # Membership
//!
//! While a group is current, its images are partitioned into two disjoint
//! 1-based index maps, `active` and `excluded`, whose union is always the
//! full index set of the group. Excluding an image never deletes it: the
//! partition is rebuilt from scratch on every `advance` and `retreat`.

mod scan;

pub use scan::{scan_groups, GroupingMode, ScanError, SUPPORTED_EXTENSIONS};

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};

use log::warn;
use thiserror::Error;

/// An ordered batch of image filenames processed and tagged together.
///
/// Immutable once constructed; repeating a group produces a fully
/// independent deep copy (`Clone` here clones the filename list).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Stable identity derived from the directory tree, e.g. `root/A` or
    /// `root/A#2`; repeats get an `_n` instance suffix.
    pub id: String,
    /// Absolute directory the filenames live in.
    pub directory: PathBuf,
    /// Directory relative to the scan root, used to mirror the tree on
    /// output.
    pub relative_dir: PathBuf,
    /// Image filenames, lexically sorted.
    pub filenames: Vec<String>,
    /// True for instances produced by [`GroupQueue::repeat`].
    pub repeated: bool,
}

impl Group {
    pub fn new(
        id: String,
        directory: PathBuf,
        relative_dir: PathBuf,
        filenames: Vec<String>,
    ) -> Self {
        Self {
            id,
            directory,
            relative_dir,
            filenames,
            repeated: false,
        }
    }

    pub fn member_count(&self) -> usize {
        self.filenames.len()
    }
}

/// What [`GroupQueue::advance`] and [`GroupQueue::retreat`] hand back:
/// the group's active image paths in order, plus its repeat flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupView {
    pub group_id: String,
    pub filenames: Vec<PathBuf>,
    pub is_repeat: bool,
}

/// Errors from queue navigation.
#[derive(Debug, Error)]
pub enum QueueError {
    /// No pending groups remain. Terminal for the run, not retried.
    #[error("no groups left to process")]
    Exhausted,

    /// Retreat with an empty history. Warning-level; the queue is
    /// unchanged.
    #[error("no groups before this one")]
    NothingBehind,
}

/// FIFO traversal of groups with history, membership partitioning,
/// repeats and resume.
#[derive(Debug, Clone, Default)]
pub struct GroupQueue {
    pending: VecDeque<Group>,
    finished: Vec<Group>,
    current: Option<Group>,
    active_members: BTreeMap<usize, String>,
    excluded_members: BTreeMap<usize, String>,
}

impl GroupQueue {
    /// Build a queue from an already-scanned group list.
    pub fn from_groups(groups: Vec<Group>) -> Result<Self, ScanError> {
        if groups.is_empty() {
            return Err(ScanError::EmptyCollection);
        }
        Ok(Self {
            pending: groups.into(),
            ..Self::default()
        })
    }

    /// Scan `root` with the given mode and build the queue.
    pub fn from_dir(root: &Path, mode: GroupingMode) -> Result<Self, ScanError> {
        Self::from_groups(scan_groups(root, mode)?)
    }

    /// Move to the next group.
    ///
    /// The outgoing current group is archived to the history unless it was
    /// itself a repeat instance; membership is reset to "everything
    /// active". Fails with [`QueueError::Exhausted`] once the queue is
    /// drained.
    pub fn advance(&mut self) -> Result<GroupView, QueueError> {
        if self.pending.is_empty() {
            return Err(QueueError::Exhausted);
        }
        if let Some(previous) = self.current.take() {
            if !previous.repeated {
                self.finished.push(previous);
            }
        }
        let group = self.pending.pop_front().expect("pending checked non-empty");
        self.reset_membership(&group);
        self.current = Some(group);
        Ok(self.current_view())
    }

    /// Step back to the previously finished group.
    ///
    /// The current group returns to the front of the queue and the last
    /// finished group becomes current with its full original membership;
    /// exclusions from the prior visit are deliberately not preserved.
    pub fn retreat(&mut self) -> Result<GroupView, QueueError> {
        let Some(previous) = self.finished.pop() else {
            warn!("retreat requested with no finished groups");
            return Err(QueueError::NothingBehind);
        };
        if let Some(current) = self.current.take() {
            self.pending.push_front(current);
        }
        self.reset_membership(&previous);
        self.current = Some(previous);
        Ok(self.current_view())
    }

    /// Queue `times` additional passes over the current group.
    ///
    /// Each copy is an independent deep copy flagged `repeated`, inserted
    /// immediately ahead of the rest of the queue and identified by an
    /// appended instance counter (`_2`, `_3`, ...).
    pub fn repeat(&mut self, times: usize) {
        let Some(current) = &self.current else {
            warn!("repeat requested with no active group");
            return;
        };
        for idx in (0..times).rev() {
            let mut copy = current.clone();
            copy.id = format!("{}_{}", current.id, idx + 2);
            copy.repeated = true;
            self.pending.push_front(copy);
        }
    }

    /// Move an image index between the active and excluded partitions.
    ///
    /// Idempotent when the index is already in the target set; silently
    /// ignores indices absent from both.
    pub fn toggle_membership(&mut self, index: usize, include: bool) {
        if include {
            if let Some(name) = self.excluded_members.remove(&index) {
                self.active_members.insert(index, name);
            }
        } else if let Some(name) = self.active_members.remove(&index) {
            self.excluded_members.insert(index, name);
        }
    }

    /// The canonical "what to crop next" list: active image paths ordered
    /// by ascending index, joined onto the group directory.
    pub fn active_filenames(&self) -> Vec<PathBuf> {
        let Some(current) = &self.current else {
            return Vec::new();
        };
        self.active_members
            .values()
            .map(|name| current.directory.join(name))
            .collect()
    }

    /// Names of the currently excluded images, ordered by index.
    pub fn excluded_filenames(&self) -> Vec<String> {
        self.excluded_members.values().cloned().collect()
    }

    pub fn current_group(&self) -> Option<&Group> {
        self.current.as_ref()
    }

    /// True once no pending groups remain.
    pub fn is_exhausted(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn groups_complete(&self) -> usize {
        self.finished.len()
    }

    pub fn groups_total(&self) -> usize {
        self.finished.len() + self.pending.len() + usize::from(self.current.is_some())
    }

    /// Largest member count across the remaining groups.
    pub fn max_group_size(&self) -> usize {
        self.pending
            .iter()
            .map(Group::member_count)
            .max()
            .unwrap_or(0)
    }

    /// Fraction of groups finished.
    ///
    /// The denominator includes one extra slot so the metric never reports
    /// 100% while a current group is still in progress.
    pub fn percent_complete(&self) -> f64 {
        let done = self.finished.len() as f64;
        done / (done + self.pending.len() as f64 + 1.0)
    }

    /// Fast-forward a freshly built queue past already-completed work.
    ///
    /// Every group up to and including `last_completed_group_id` moves
    /// from pending into the history, leaving the next `advance` to hand
    /// out the first unfinished group. If the id is not found in the
    /// re-scanned tree (directories reshuffled between runs), the queue is
    /// left untouched and the run starts from the beginning.
    pub fn resume(&mut self, last_completed_group_id: &str) {
        let Some(position) = self
            .pending
            .iter()
            .position(|group| group.id == last_completed_group_id)
        else {
            warn!(
                "group '{}' not found in the scanned tree; starting from scratch",
                last_completed_group_id
            );
            return;
        };
        self.finished.extend(self.pending.drain(..=position));
    }

    fn reset_membership(&mut self, group: &Group) {
        self.active_members = group
            .filenames
            .iter()
            .enumerate()
            .map(|(idx, name)| (idx + 1, name.clone()))
            .collect();
        self.excluded_members.clear();
    }

    fn current_view(&self) -> GroupView {
        let current = self.current.as_ref().expect("current group set");
        GroupView {
            group_id: current.id.clone(),
            filenames: self.active_filenames(),
            is_repeat: current.repeated,
        }
    }
}

impl fmt::Display for GroupQueue {
    /// Progress summary: one line per group with its member count.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.current.is_some() || !self.pending.is_empty() {
            writeln!(f, "UNFINISHED GROUPS")?;
            for group in self.current.iter().chain(self.pending.iter()) {
                writeln!(f, "{}, N = {}", group.id, group.member_count())?;
            }
        }
        if !self.finished.is_empty() {
            writeln!(f, "FINISHED GROUPS")?;
            for group in &self.finished {
                writeln!(f, "{}, N = {}", group.id, group.member_count())?;
            }
        }
        Ok(())
    }
}
