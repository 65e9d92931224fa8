// Collaborator implementations used by the CLI surface. The ledger core only
// sees these through the `ContentStore` and `ComputeExecutor` traits.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};
use sha2::{Digest, Sha256};

use crate::ledger::{ComputeError, ComputeExecutor, ContentStore};

/// Content-addressed directory store: each payload is written under its own
/// SHA-256 digest, so the content ref and the content hash coincide.
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ComputeError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(FsContentStore { root })
    }

    fn entry_path(&self, content_ref: &str) -> PathBuf {
        self.root.join(content_ref)
    }
}

impl ContentStore for FsContentStore {
    fn upload(&self, path: &Path) -> Result<(String, String), ComputeError> {
        let content = fs::read(path)?;
        let hash = hex::encode(Sha256::digest(&content));

        let dest = self.entry_path(&hash);
        if !dest.exists() {
            fs::write(&dest, &content)?;
        }

        info!("Stored {} as {}", path.display(), hash);
        Ok((hash.clone(), hash))
    }

    fn download(&self, content_ref: &str, dest: &Path) -> Result<(), ComputeError> {
        let src = self.entry_path(content_ref);
        if !src.exists() {
            return Err(ComputeError::NotFound(content_ref.to_string()));
        }

        fs::copy(&src, dest)?;
        Ok(())
    }
}

/// Runs a committed algorithm as a subprocess, `algorithm INPUT OUTPUT`, and
/// reports the SHA-256 of whatever the program wrote to OUTPUT.
pub struct CommandExecutor<'a> {
    store: &'a dyn ContentStore,
    work_dir: PathBuf,
}

impl<'a> CommandExecutor<'a> {
    pub fn new(
        store: &'a dyn ContentStore,
        work_dir: impl Into<PathBuf>,
    ) -> Result<Self, ComputeError> {
        let work_dir = work_dir.into();
        fs::create_dir_all(&work_dir)?;
        Ok(CommandExecutor { store, work_dir })
    }
}

impl ComputeExecutor for CommandExecutor<'_> {
    fn execute(&self, algorithm_ref: &str, input_ref: &str) -> Result<String, ComputeError> {
        let alg_path = self.work_dir.join("algorithm");
        let input_path = self.work_dir.join("input.data");
        let output_path = self.work_dir.join("output.data");

        self.store.download(algorithm_ref, &alg_path)?;
        self.store.download(input_ref, &input_path)?;

        // the algorithm payload must be directly executable
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&alg_path, fs::Permissions::from_mode(0o755))?;
        }

        debug!("Executing algorithm {} on input {}", algorithm_ref, input_ref);
        let status = Command::new(&alg_path)
            .arg(&input_path)
            .arg(&output_path)
            .status()?;
        if !status.success() {
            return Err(ComputeError::ExecutionFailed(format!(
                "algorithm {} exited with {}",
                algorithm_ref, status
            )));
        }

        let output = fs::read(&output_path)?;
        let output_hash = hex::encode(Sha256::digest(&output));

        for path in [&alg_path, &input_path, &output_path] {
            let _ = fs::remove_file(path);
        }

        Ok(output_hash)
    }
}
