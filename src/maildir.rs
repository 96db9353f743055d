//! Delivery into a [Maildir](https://cr.yp.to/proto/maildir.html).
//!
//! A message is written in full to `tmp/` and then renamed into `new/`. Readers only look in
//! `new/` and `cur/`, and a rename within one filesystem is atomic, so nobody ever sees a
//! partially written message.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rand::rngs::OsRng;
use rand::RngCore;

use super::error::{DeliveryError, Result};

const TMP: &str = "tmp";
const NEW: &str = "new";
const CUR: &str = "cur";

/// Number of random bytes in a message name.
const UNIQUE_LEN: usize = 16;

/// A local Maildir that messages can be delivered into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maildir {
    path: PathBuf,
}

impl Maildir {
    /// Refer to the Maildir rooted at `path`. Nothing is checked or created.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Maildir { path: path.into() }
    }

    /// The root directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create `tmp/`, `new/` and `cur/` (and the root) if they are missing.
    pub fn create_dirs(&self) -> io::Result<()> {
        for sub in [TMP, NEW, CUR] {
            fs::create_dir_all(self.path.join(sub))?;
        }
        Ok(())
    }

    /// Durably deliver `message` and return the path of the new file in `new/`.
    ///
    /// When this returns `Ok`, the file and its directory entry have been flushed to disk. A
    /// write or rename failure adds nothing to `new/`, though a file may be left behind in `tmp/`,
    /// which no reader treats as a message.
    pub fn deliver(&self, message: &[u8]) -> Result<PathBuf> {
        let unique = unique_name()?;
        let tmp = self.path.join(TMP).join(&unique);
        let new = self.path.join(NEW).join(&unique);

        if let Err(source) = write_synced(&tmp, message) {
            // best effort; a stray file in tmp/ is harmless
            let _ = fs::remove_file(&tmp);
            return Err(DeliveryError::Write { path: tmp, source }.into());
        }

        if let Err(source) = fs::rename(&tmp, &new) {
            return Err(DeliveryError::Rename {
                from: tmp,
                to: new,
                source,
            }
            .into());
        }

        let new_dir = self.path.join(NEW);
        if let Err(source) = sync_dir(&new_dir) {
            return Err(DeliveryError::Sync {
                path: new_dir,
                source,
            }
            .into());
        }

        tracing::debug!(path = %new.display(), bytes = message.len(), "delivered");
        Ok(new)
    }
}

/// 128 random bits from the operating system, as 32 lowercase hex digits.
///
/// Collisions are not checked for; at 2^-64 odds after four billion messages they are not
/// worth a round trip to the filesystem. Staging files are opened with `create_new`, so a
/// collision would fail the delivery rather than clobber another message.
fn unique_name() -> Result<String> {
    let mut bytes = [0u8; UNIQUE_LEN];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(DeliveryError::Entropy)?;
    Ok(hex::encode(bytes))
}

fn write_synced(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.sync_all()
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

// Directory handles cannot be fsynced on Windows; NTFS journals the rename itself.
#[cfg(not(unix))]
fn sync_dir(_: &Path) -> io::Result<()> {
    Ok(())
}
