// src/watch/event_kind.rs

//! Static table from `notify` event codes to semantic kinds.

use std::fmt;

use notify::event::{AccessKind, AccessMode, CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::EventKind as RawKind;

/// What happened to a path, independent of the platform backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A file or directory appeared.
    Create,
    /// The backend reported a creation without saying what was created.
    CreateAny,
    Write,
    /// A file or directory went away.
    Remove,
    RemoveAny,
    /// Destination side of a rename, e.g. an editor's atomic save.
    MovedTo,
    /// Any other name change.
    Rename,
    Attributes,
    /// inotify `IN_CLOSE_WRITE`: a writer closed the file.
    CloseWrite,
    Access,
}

impl EventKind {
    /// Content changes, creations, deletions and files renamed into place
    /// restart the pipeline. Everything else is inert unless a callback
    /// bypasses the filters.
    pub fn triggers_reload(self) -> bool {
        matches!(
            self,
            EventKind::Write
                | EventKind::CloseWrite
                | EventKind::Create
                | EventKind::Remove
                | EventKind::MovedTo
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Create => "create",
            EventKind::CreateAny => "create_any",
            EventKind::Write => "write",
            EventKind::Remove => "remove",
            EventKind::RemoveAny => "remove_any",
            EventKind::MovedTo => "moved_to",
            EventKind::Rename => "rename",
            EventKind::Attributes => "attributes",
            EventKind::CloseWrite => "close_write",
            EventKind::Access => "access",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a raw backend event. `None` means the code is not in the table.
pub fn classify(raw: &RawKind) -> Option<EventKind> {
    let kind = match raw {
        RawKind::Create(CreateKind::File | CreateKind::Folder) => EventKind::Create,
        RawKind::Create(_) => EventKind::CreateAny,
        RawKind::Modify(ModifyKind::Data(_)) | RawKind::Modify(ModifyKind::Any) => {
            EventKind::Write
        }
        RawKind::Modify(ModifyKind::Metadata(_)) => EventKind::Attributes,
        RawKind::Modify(ModifyKind::Name(RenameMode::To)) => EventKind::MovedTo,
        RawKind::Modify(ModifyKind::Name(_)) => EventKind::Rename,
        RawKind::Access(AccessKind::Close(AccessMode::Write)) => EventKind::CloseWrite,
        RawKind::Access(_) => EventKind::Access,
        RawKind::Remove(RemoveKind::File | RemoveKind::Folder) => EventKind::Remove,
        RawKind::Remove(_) => EventKind::RemoveAny,
        RawKind::Modify(ModifyKind::Other) | RawKind::Any | RawKind::Other => return None,
    };
    Some(kind)
}
