use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use super::WalletWithModules;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("snapshot json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to persist snapshot: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// 一条路线尚未执行完的钱包计划。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedModules {
    pub route: String,
    #[serde(default)]
    pub is_finished: bool,
    #[serde(default)]
    pub wallets_with_modules: Vec<WalletWithModules>,
}

impl SavedModules {
    pub fn new(route: impl Into<String>, wallets_with_modules: Vec<WalletWithModules>) -> Self {
        Self {
            route: route.into(),
            is_finished: false,
            wallets_with_modules,
        }
    }

    pub fn remove_wallet(&mut self, wallet_id: &str) -> bool {
        let before = self.wallets_with_modules.len();
        self.wallets_with_modules
            .retain(|entry| entry.wallet.id != wallet_id);
        before != self.wallets_with_modules.len()
    }

    /// 可以继续执行：未标记完成且仍有钱包。
    pub fn is_resumable(&self) -> bool {
        !self.is_finished && !self.wallets_with_modules.is_empty()
    }
}

/// `<dir>/<route>.json` 形式的快照存储，写入先落到同目录临时文件再原子替换。
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, route: &str) -> PathBuf {
        self.dir.join(format!("{route}.json"))
    }

    pub fn load(&self, route: &str) -> Result<Option<SavedModules>, SnapshotError> {
        let path = self.path(route);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(SnapshotError::Io { path, source }),
        };
        let saved: SavedModules = serde_json::from_str(&contents)?;
        if saved.route != route {
            warn!(
                target: "wallet::snapshot",
                expected = route,
                found = %saved.route,
                "快照中的路线名与文件名不一致"
            );
        }
        Ok(Some(saved))
    }

    pub fn save(&self, saved: &SavedModules) -> Result<(), SnapshotError> {
        fs::create_dir_all(&self.dir).map_err(|source| SnapshotError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path(&saved.route);
        let mut file = NamedTempFile::new_in(&self.dir).map_err(|source| SnapshotError::Io {
            path: self.dir.clone(),
            source,
        })?;
        serde_json::to_writer_pretty(&mut file, saved)?;
        file.flush().map_err(|source| SnapshotError::Io {
            path: file.path().to_path_buf(),
            source,
        })?;
        file.persist(&path)?;
        debug!(
            target: "wallet::snapshot",
            path = %path.display(),
            wallets = saved.wallets_with_modules.len(),
            finished = saved.is_finished,
            "快照已写入"
        );
        Ok(())
    }

    /// 删除已处理完的钱包并写回；快照不存在时什么也不做。
    pub fn remove_wallet(&self, route: &str, wallet_id: &str) -> Result<(), SnapshotError> {
        let Some(mut saved) = self.load(route)? else {
            return Ok(());
        };
        if saved.remove_wallet(wallet_id) {
            self.save(&saved)?;
        }
        Ok(())
    }

    pub fn mark_finished(&self, route: &str) -> Result<(), SnapshotError> {
        let Some(mut saved) = self.load(route)? else {
            return Ok(());
        };
        saved.is_finished = true;
        self.save(&saved)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
