// JSON 文件读写工具
//
// 写入先落到同目录的临时文件再 rename，避免进程中途退出留下半个文件

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::modules::chat::ports::RepositoryError;

/// 读取 JSON 文件，文件不存在时返回默认值
///
/// 文件存在但无法解析时返回错误，不会静默丢弃已有数据
pub async fn load_or_default<T>(path: &Path) -> Result<T, RepositoryError>
where
    T: DeserializeOwned + Default,
{
    if !fs::try_exists(path).await? {
        return Ok(T::default());
    }

    let content = fs::read_to_string(path).await?;
    if content.trim().is_empty() {
        return Ok(T::default());
    }

    serde_json::from_str(&content).map_err(|e| {
        RepositoryError::SerializationError(format!("{}: {}", path.display(), e))
    })
}

/// 原子写入 JSON 文件
pub async fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), RepositoryError> {
    let content = serde_json::to_vec_pretty(value)?;
    let tmp_path = temp_path(path);

    fs::write(&tmp_path, content).await?;
    fs::rename(&tmp_path, path).await?;

    Ok(())
}

/// 确保数据目录存在并返回文件路径
pub async fn prepare(data_dir: &Path, file_name: &str) -> Result<PathBuf, RepositoryError> {
    fs::create_dir_all(data_dir).await?;
    Ok(data_dir.join(file_name))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
