use std::path::{Path, PathBuf};

use tracing::debug;

use super::loader::{ConfigError, read_document};
use crate::planner::RouteSettings;

const ROUTE_EXTENSIONS: &[&str] = &["yaml", "yml", "toml"];

/// 按名称加载路线：`<routes_dir>/<name>.{yaml,yml,toml}`，也接受直接给出的文件路径。
pub fn load_route(routes_dir: &Path, name: &str) -> Result<RouteSettings, ConfigError> {
    let path = route_path(routes_dir, name)?;
    let route: RouteSettings = read_document(&path)?;
    if route.modules.is_empty() {
        return Err(ConfigError::Invalid(format!(
            "route {} has no modules",
            path.display()
        )));
    }
    debug!(
        target: "config",
        route = name,
        path = %path.display(),
        modules = route.modules.len(),
        "路线已加载"
    );
    Ok(route)
}

fn route_path(routes_dir: &Path, name: &str) -> Result<PathBuf, ConfigError> {
    let direct = PathBuf::from(name);
    if direct.extension().is_some() && direct.is_file() {
        return Ok(direct);
    }

    ROUTE_EXTENSIONS
        .iter()
        .map(|ext| routes_dir.join(format!("{name}.{ext}")))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| ConfigError::Io {
            path: routes_dir.join(format!("{name}.yaml")),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })
}

/// 路线名称（文件名去掉扩展名），用作快照文件名。
pub fn route_name(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn loads_route_by_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("zk.yml"),
            "modules:\n  - module_name: sync-swap\n    reverse: true\n",
        )
        .unwrap();
        let route = load_route(dir.path(), "zk").unwrap();
        assert_eq!(route.modules.len(), 1);
        assert_eq!(route.modules[0].overrides.reverse, Some(true));
    }

    #[test]
    fn missing_route_reports_expected_path() {
        let dir = tempfile::tempdir().unwrap();
        match load_route(dir.path(), "ghost") {
            Err(ConfigError::Io { path, .. }) => {
                assert_eq!(path, dir.path().join("ghost.yaml"))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn empty_route_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("empty.yaml"), "modules: []\n").unwrap();
        assert!(matches!(
            load_route(dir.path(), "empty"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn route_name_strips_directories_and_extension() {
        assert_eq!(route_name("routes/zk.yaml"), "zk");
        assert_eq!(route_name("zk"), "zk");
    }
}
