use crate::folder::FolderAccess;
use crate::model::{AccessMode, PermissionState};

/// Checks read access, asking once if it is not already granted.
pub fn verify(folder: &mut dyn FolderAccess) -> bool {
    if folder.query_permission(AccessMode::Read) == PermissionState::Granted {
        return true;
    }

    let granted = folder.request_permission(AccessMode::Read) == PermissionState::Granted;
    if !granted {
        log::warn!(
            "read access to {} not granted",
            folder.handle().path.display()
        );
    }
    granted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::folder::MemoryFolder;

    #[test]
    fn granted_query_skips_request() {
        let mut folder = MemoryFolder::new("/music");
        assert!(verify(&mut folder));
        assert_eq!(folder.query_count(), 1);
        assert_eq!(folder.request_count(), 0);
    }

    #[test]
    fn prompt_escalates_to_single_request() {
        let mut folder = MemoryFolder::new("/music")
            .with_permission(PermissionState::Prompt, PermissionState::Granted);
        assert!(verify(&mut folder));
        assert_eq!(folder.query_count(), 1);
        assert_eq!(folder.request_count(), 1);
    }

    #[test]
    fn dismissed_request_is_false_not_error() {
        let mut folder = MemoryFolder::new("/music")
            .with_permission(PermissionState::Prompt, PermissionState::Prompt);
        assert!(!verify(&mut folder));
        assert_eq!(folder.request_count(), 1);
    }

    #[test]
    fn denial_is_false() {
        let mut folder = MemoryFolder::new("/music")
            .with_permission(PermissionState::Denied, PermissionState::Denied);
        assert!(!verify(&mut folder));
        assert_eq!(folder.query_count(), 1);
        assert_eq!(folder.request_count(), 1);
    }
}
