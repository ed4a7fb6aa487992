use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use time::macros::format_description;

const DIAGRAM_FILE_STEM: &str = "diagram_info";

/// Where the serialized diagram of the current workspace lives.
///
/// `revision` changes whenever the content is replaced from outside the
/// editor (workspace switch, removal), so the editor knows to restore.
pub trait DiagramSource {
    fn content(&self) -> Option<&str>;
    fn set_content(&mut self, content: String) -> anyhow::Result<()>;
    fn remove_diagram(&mut self) -> anyhow::Result<()>;
    fn on_delete_workspace(&mut self, workspace_id: &str) -> anyhow::Result<()>;
    fn revision(&self) -> u64;

    /// Re-read the backing store. In-memory sources have nothing to re-read.
    fn reload(&mut self) -> anyhow::Result<()> { Ok(()) }

    /// Keep a timestamped copy of the current content, if the source supports it.
    fn save_versioned(&self) -> anyhow::Result<Option<PathBuf>> { Ok(None) }

    fn workspace(&self) -> Option<&str> { None }

    fn switch_workspace(&mut self, _workspace: Option<String>) -> anyhow::Result<()> {
        anyhow::bail!("this diagram source has no workspaces")
    }

    /// Timestamped copies of the active diagram, newest first.
    fn list_versions(&self) -> anyhow::Result<Vec<PathBuf>> { Ok(Vec::new()) }

    fn restore_version(&mut self, path: &Path) -> anyhow::Result<()> {
        anyhow::bail!("this diagram source cannot restore {}", path.display())
    }
}

/// In-memory source; nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct LocalStateSource {
    content: Option<String>,
    revision: u64,
}

impl LocalStateSource {
    pub fn new(initial: Option<String>) -> Self {
        Self { content: initial, revision: 0 }
    }
}

impl DiagramSource for LocalStateSource {
    fn content(&self) -> Option<&str> { self.content.as_deref() }

    fn set_content(&mut self, content: String) -> anyhow::Result<()> {
        self.content = Some(content);
        Ok(())
    }

    fn remove_diagram(&mut self) -> anyhow::Result<()> {
        self.content = None;
        self.revision += 1;
        Ok(())
    }

    fn on_delete_workspace(&mut self, _workspace_id: &str) -> anyhow::Result<()> {
        self.remove_diagram()
    }

    fn revision(&self) -> u64 { self.revision }
}

/// One JSON file per workspace inside `dir`.
#[derive(Debug, Clone)]
pub struct WorkspaceFileSource {
    dir: PathBuf,
    workspace: Option<String>,
    content: Option<String>,
    revision: u64,
}

impl WorkspaceFileSource {
    pub fn open(dir: impl Into<PathBuf>, workspace: Option<String>) -> anyhow::Result<Self> {
        let mut source = Self { dir: dir.into(), workspace, content: None, revision: 0 };
        source.content = read_optional(&source.active_path())?;
        Ok(source)
    }

    pub fn dir(&self) -> &Path { &self.dir }

    pub fn active_path(&self) -> PathBuf {
        self.path_for(self.workspace.as_deref())
    }

    fn path_for(&self, workspace: Option<&str>) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(workspace)))
    }
}

impl DiagramSource for WorkspaceFileSource {
    fn content(&self) -> Option<&str> { self.content.as_deref() }

    fn set_content(&mut self, content: String) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.active_path();
        atomic_write(&path, content.as_bytes())?;
        log::debug!("wrote diagram to {}", path.display());
        self.content = Some(content);
        Ok(())
    }

    fn remove_diagram(&mut self) -> anyhow::Result<()> {
        remove_if_exists(&self.active_path())?;
        self.content = None;
        self.revision += 1;
        Ok(())
    }

    fn on_delete_workspace(&mut self, workspace_id: &str) -> anyhow::Result<()> {
        remove_if_exists(&self.path_for(Some(workspace_id)))?;
        if self.workspace.as_deref() == Some(workspace_id) {
            self.content = None;
            self.revision += 1;
        }
        Ok(())
    }

    fn revision(&self) -> u64 { self.revision }

    fn workspace(&self) -> Option<&str> { self.workspace.as_deref() }

    fn switch_workspace(&mut self, workspace: Option<String>) -> anyhow::Result<()> {
        self.workspace = workspace;
        self.content = read_optional(&self.active_path())?;
        self.revision += 1;
        log::info!("switched to workspace {}", self.workspace.as_deref().unwrap_or("<default>"));
        Ok(())
    }

    fn list_versions(&self) -> anyhow::Result<Vec<PathBuf>> {
        let prefix = format!("{}_", file_stem(self.workspace.as_deref()));
        let mut entries: Vec<PathBuf> = Vec::new();
        if self.dir.exists() {
            for e in fs::read_dir(&self.dir)? {
                let p = e?.path();
                if let Some(name) = p.file_name().and_then(|s| s.to_str())
                    && let Some(rest) = name.strip_prefix(&prefix)
                    && let Some(stamp) = rest.strip_suffix(".json")
                    && is_version_stamp(stamp)
                {
                    entries.push(p);
                }
            }
        }
        // sort descending by filename (timestamp)
        entries.sort();
        entries.reverse();
        Ok(entries)
    }

    fn restore_version(&mut self, path: &Path) -> anyhow::Result<()> {
        let content = read_optional(path)?
            .ok_or_else(|| anyhow::anyhow!("version {} does not exist", path.display()))?;
        self.set_content(content)?;
        self.revision += 1;
        Ok(())
    }

    fn reload(&mut self) -> anyhow::Result<()> {
        self.content = read_optional(&self.active_path())?;
        self.revision += 1;
        Ok(())
    }

    // Timestamped backup of the current content next to the active file
    fn save_versioned(&self) -> anyhow::Result<Option<PathBuf>> {
        let Some(content) = &self.content else { return Ok(None) };
        fs::create_dir_all(&self.dir)?;
        let now = OffsetDateTime::now_utc();
        let fmt = format_description!("[year][month][day]_[hour][minute][second]");
        let stamp = now.format(fmt).unwrap_or_else(|_| "unknown".to_string());
        let path = self.dir.join(format!("{}_{}.json", file_stem(self.workspace.as_deref()), stamp));
        atomic_write(&path, content.as_bytes())?;
        Ok(Some(path))
    }
}

// Readable part plus a digest of the raw id, so ids that clean to the
// same text ("team a", "team_a") still get their own file.
fn file_stem(workspace: Option<&str>) -> String {
    match workspace {
        Some(ws) => {
            let safe: String = ws
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
                .collect();
            let mut hasher = Sha256::new();
            hasher.update(ws.as_bytes());
            let digest = hasher.finalize();
            let short: String = digest[..4].iter().map(|b| format!("{:02x}", b)).collect();
            format!("{}_{}-{}", DIAGRAM_FILE_STEM, safe, short)
        }
        None => DIAGRAM_FILE_STEM.to_string(),
    }
}

// yyyymmdd_hhmmss
fn is_version_stamp(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 15 && b[8] == b'_' && b.iter().enumerate().all(|(i, c)| i == 8 || c.is_ascii_digit())
}

fn read_optional(path: &Path) -> anyhow::Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let mut f = File::open(path)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    Ok(Some(buf))
}

fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    {
        let mut f = File::create(&tmp_path)?;
        f.write_all(data)?;
        f.flush()?;
    }
    fs::rename(tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_state_removal_bumps_revision() {
        let mut src = LocalStateSource::new(Some("{}".into()));
        assert_eq!(src.content(), Some("{}"));
        src.set_content("x".into()).unwrap();
        assert_eq!(src.revision(), 0);
        src.remove_diagram().unwrap();
        assert_eq!(src.content(), None);
        assert_eq!(src.revision(), 1);
    }

    #[test]
    fn workspaces_are_kept_apart() {
        let dir = tempfile::tempdir().unwrap();
        let mut src = WorkspaceFileSource::open(dir.path(), None).unwrap();
        src.set_content("default".into()).unwrap();
        assert!(dir.path().join("diagram_info.json").exists());

        src.switch_workspace(Some("team a".into())).unwrap();
        assert_eq!(src.content(), None);
        src.set_content("team".into()).unwrap();
        let team_file = src.active_path();
        assert!(team_file.exists());
        assert!(team_file.file_name().and_then(|s| s.to_str()).unwrap().starts_with("diagram_info_team_a-"));

        src.switch_workspace(None).unwrap();
        assert_eq!(src.content(), Some("default"));

        src.on_delete_workspace("team a").unwrap();
        assert!(!team_file.exists());
        assert_eq!(src.content(), Some("default"));
    }

    #[test]
    fn workspace_ids_that_clean_alike_get_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = WorkspaceFileSource::open(dir.path(), Some("team a".into())).unwrap();
        a.set_content("A-diagram".into()).unwrap();

        let mut b = WorkspaceFileSource::open(dir.path(), Some("team_a".into())).unwrap();
        assert_eq!(b.content(), None);
        b.set_content("B-diagram".into()).unwrap();
        let c = WorkspaceFileSource::open(dir.path(), Some("team.a".into())).unwrap();
        assert_eq!(c.content(), None);
        assert_ne!(a.active_path(), b.active_path());

        b.on_delete_workspace("team a").unwrap();
        assert_eq!(b.content(), Some("B-diagram"));
        a.reload().unwrap();
        assert_eq!(a.content(), None);
        b.reload().unwrap();
        assert_eq!(b.content(), Some("B-diagram"));
    }

    #[test]
    fn deleting_the_active_workspace_bumps_revision() {
        let dir = tempfile::tempdir().unwrap();
        let mut src = WorkspaceFileSource::open(dir.path(), Some("ws".into())).unwrap();
        src.set_content("{}".into()).unwrap();
        let before = src.revision();
        src.on_delete_workspace("ws").unwrap();
        assert_eq!(src.content(), None);
        assert!(src.revision() > before);
        assert!(!src.active_path().exists());
    }

    #[test]
    fn in_memory_source_has_no_workspaces_or_versions() {
        let mut src = LocalStateSource::new(None);
        assert_eq!(src.workspace(), None);
        assert!(src.switch_workspace(Some("x".into())).is_err());
        assert!(src.list_versions().unwrap().is_empty());
        assert!(src.restore_version(Path::new("nope.json")).is_err());
    }

    #[test]
    fn versions_are_listed_for_the_active_workspace_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut src = WorkspaceFileSource::open(dir.path(), Some("ws".into())).unwrap();
        assert!(src.save_versioned().unwrap().is_none());
        src.set_content("v1".into()).unwrap();
        let path = src.save_versioned().unwrap().unwrap();
        fs::write(dir.path().join("diagram_info_20240101_000000.json"), "other").unwrap();

        let versions = src.list_versions().unwrap();
        assert_eq!(versions, vec![path.clone()]);

        src.set_content("v2".into()).unwrap();
        src.restore_version(&path).unwrap();
        assert_eq!(src.content(), Some("v1"));
    }
}
