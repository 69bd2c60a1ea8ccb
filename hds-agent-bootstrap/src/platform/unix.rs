// /////////////////////////////////////////////////////////////////////////////
// HDS Agent
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

use std::ffi::CStr;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use super::{Platform, PlatformError};

pub struct UnixPlatform;

impl UnixPlatform {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UnixPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for UnixPlatform {
    fn hostname(&self) -> String {
        let mut buf = [0u8; 256];
        let rc = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
        if rc != 0 {
            return "unknown".to_string();
        }
        let cstr = unsafe { CStr::from_ptr(buf.as_ptr() as *const libc::c_char) };
        cstr.to_string_lossy().into_owned()
    }

    fn temp_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }

    fn is_executable(&self, path: &Path) -> bool {
        match std::fs::metadata(path) {
            Ok(metadata) => metadata.permissions().mode() & 0o111 != 0,
            Err(_) => false,
        }
    }

    fn set_permissions(&self, path: &Path, mode: u32) -> Result<(), PlatformError> {
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostname_is_nonempty() {
        assert!(!UnixPlatform::new().hostname().is_empty());
    }

    #[test]
    fn is_executable_false_for_missing_path() {
        let platform = UnixPlatform::new();
        assert!(!platform.is_executable(Path::new("/no/such/path/hopefully")));
    }

    #[test]
    fn set_permissions_then_is_executable() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("script.sh");
        std::fs::write(&file, "#!/bin/sh\necho hi\n").unwrap();

        let platform = UnixPlatform::new();
        assert!(!platform.is_executable(&file));

        platform.set_permissions(&file, 0o700).unwrap();
        assert!(platform.is_executable(&file));
    }
}
