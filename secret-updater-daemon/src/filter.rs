//! Decides which filesystem notifications are worth a sync.

use notify::event::ModifyKind;
use notify::{Event, EventKind};
use secret_updater_core::{WatchedFile, WatchedFiles};

/// Content writes only. Creates, removes, renames and metadata changes are
/// ignored; the issuing sidecar always follows a create with a write.
pub fn is_write_event_kind(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any)
    )
}

/// The watched file a qualifying write touched, if any.
pub fn qualifying_write(event: &Event, files: &WatchedFiles) -> Option<WatchedFile> {
    if !is_write_event_kind(&event.kind) {
        return None;
    }
    event.paths.iter().find_map(|path| files.match_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{
        AccessKind, AccessMode, CreateKind, DataChange, MetadataKind, RemoveKind, RenameMode,
    };
    use rstest::rstest;

    fn files() -> WatchedFiles {
        WatchedFiles::in_dir("/certs")
    }

    #[rstest]
    #[case(EventKind::Modify(ModifyKind::Data(DataChange::Content)), true)]
    #[case(EventKind::Modify(ModifyKind::Data(DataChange::Any)), true)]
    #[case(EventKind::Modify(ModifyKind::Any), true)]
    #[case(EventKind::Modify(ModifyKind::Name(RenameMode::To)), false)]
    #[case(EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)), false)]
    #[case(EventKind::Create(CreateKind::File), false)]
    #[case(EventKind::Remove(RemoveKind::File), false)]
    #[case(EventKind::Access(AccessKind::Close(AccessMode::Write)), false)]
    #[case(EventKind::Any, false)]
    fn only_content_writes_qualify(#[case] kind: EventKind, #[case] expected: bool) {
        let event = Event::new(kind).add_path("/certs/tls.crt".into());
        assert_eq!(qualifying_write(&event, &files()).is_some(), expected);
    }

    #[test]
    fn unrelated_paths_are_ignored() {
        let write = EventKind::Modify(ModifyKind::Data(DataChange::Content));
        for path in ["/certs/other.pem", "/certs/..data", "/elsewhere/tls.crt", "/certs"] {
            let event = Event::new(write).add_path(path.into());
            assert_eq!(qualifying_write(&event, &files()), None, "path {path}");
        }
    }

    #[test]
    fn any_watched_path_in_event_qualifies() {
        let event = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path("/certs/unrelated".into())
            .add_path("/certs/tls.key".into());
        assert_eq!(
            qualifying_write(&event, &files()),
            Some(WatchedFile::TlsKey)
        );
    }
}
