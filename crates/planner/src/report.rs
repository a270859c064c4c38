use crate::error::Error;
use derive_more::Display;
use time::UtcDateTime;

/// What a request does to its sources.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    #[display("move")]
    Move,
    #[display("copy")]
    Copy,
    #[display("delete")]
    Delete,
}

/// How a request was classified.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Every source handled independently, unchanged in name, into an
    /// existing folder. Deletions always run in this mode.
    #[display("bulk")]
    Bulk,
    /// One source renamed and/or relocated to (or copied as) the destination.
    #[display("single")]
    Single,
    /// The request fit neither mode; nothing was done.
    #[display("ignored")]
    Ignored,
}

/// Outcome of one request.
///
/// Failures never abort the request, so a report is returned even when some
/// (or all) items failed.
#[derive(Debug)]
pub struct Report {
    pub operation: Operation,
    pub mode: Mode,
    /// Items that could not be moved, copied, renamed or deleted.
    pub failures: Vec<Error>,
    /// Collisions that kept the existing file because no answer came.
    pub warnings: Vec<Error>,
    pub folders_moved: usize,
    pub folders_merged: usize,
    pub files_moved: usize,
    pub files_overwritten: usize,
    pub items_renamed: usize,
    pub folders_copied: usize,
    pub files_copied: usize,
    pub folders_deleted: usize,
    pub files_deleted: usize,
    /// Files that lost one parent but stayed listed elsewhere.
    pub files_detached: usize,
    /// Remaining items were skipped after cancellation.
    pub cancelled: bool,
    pub started_at: UtcDateTime,
    pub finished_at: Option<UtcDateTime>,
}
impl Report {
    pub(crate) fn start(operation: Operation, mode: Mode) -> Self {
        Self {
            operation,
            mode,
            failures: Vec::new(),
            warnings: Vec::new(),
            folders_moved: 0,
            folders_merged: 0,
            files_moved: 0,
            files_overwritten: 0,
            items_renamed: 0,
            folders_copied: 0,
            files_copied: 0,
            folders_deleted: 0,
            files_deleted: 0,
            files_detached: 0,
            cancelled: false,
            started_at: UtcDateTime::now(),
            finished_at: None,
        }
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Some(UtcDateTime::now());
        self
    }

    /// `true` when no item failed. Warnings and cancellation do not count.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether anything was changed at all.
    pub fn changed(&self) -> bool {
        let moved = self.folders_moved + self.folders_merged + self.files_moved + self.files_overwritten;
        let copied = self.folders_copied + self.files_copied;
        let removed = self.folders_deleted + self.files_deleted + self.files_detached;
        moved + self.items_renamed + copied + removed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use grove_store::EntityId;

    #[test]
    fn test_success_ignores_warnings() {
        let mut report = Report::start(Operation::Move, Mode::Bulk);
        report.warnings.push(exn::Exn::from(ErrorKind::Interrupted(EntityId::new("Drive", "f").unwrap())));
        assert!(report.is_success());
        report.failures.push(exn::Exn::from(ErrorKind::Storage));
        assert!(!report.is_success());
    }

    #[test]
    fn test_finish_stamps_time() {
        let report = Report::start(Operation::Copy, Mode::Ignored).finish();
        assert!(report.finished_at.is_some_and(|finished| finished >= report.started_at));
        assert!(!report.changed());
    }

    #[test]
    fn test_detached_file_counts_as_change() {
        let mut report = Report::start(Operation::Delete, Mode::Bulk);
        report.files_detached += 1;
        assert!(report.changed());
    }
}
