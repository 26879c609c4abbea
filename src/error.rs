use thiserror::Error;

/// 利用者に通知して操作を中断する検証エラー。
///
/// このエラーが返った場合、状態は変更されず保存も行われない。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Project name must not be empty")]
    EmptyProjectName,

    #[error("Project already exists: {0}")]
    DuplicateProject(String),

    #[error("Project not found: {0}")]
    UnknownProject(String),

    #[error("Project has no entries: {0}")]
    NoEntries(String),

    #[error("Project has no valid entries: {0}")]
    NoValidEntries(String),

    #[error("There are no projects to export")]
    NoProjects,

    #[error("Rate name must not be empty")]
    EmptyRateName,

    #[error("Rate preset not found: {0}")]
    UnknownRate(String),

    #[error("Entry {index} is out of range for project {project} ({len} entries)")]
    EntryOutOfRange {
        project: String,
        index: usize,
        len: usize,
    },
}
