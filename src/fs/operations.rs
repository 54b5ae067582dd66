use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::{self, File},
    io::{self, AsyncReadExt, AsyncWriteExt},
};
use tracing::debug;

/// Reads the whole file while holding a shared lock on it. A missing file is reported as `None`
/// rather than an error, since most callers treat it as "nothing saved yet".
pub async fn read_locked(path: &Path) -> Result<Option<String>, io::Error> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    file.lock_shared()?;
    let mut content = String::new();
    let result = file.read_to_string(&mut content).await;
    file.unlock_async().await?;
    result?;
    Ok(Some(content))
}

/// Replaces the contents of `path` in one step. Data is written into a sibling temporary file
/// which is then renamed over the target, so readers observe either the old or the new content.
pub async fn write_atomically(path: &Path, data: &[u8]) -> Result<(), io::Error> {
    let temp_path = temporary_path(path);
    debug!("Writing {} bytes to {temp_path:?}", data.len());

    let mut file = File::options()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .await?;

    file.lock_exclusive()?;
    let result = write_and_sync(&mut file, data).await;
    file.unlock_async().await?;
    drop(file);

    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e);
    }

    fs::rename(&temp_path, path).await
}

async fn write_and_sync(file: &mut File, data: &[u8]) -> Result<(), io::Error> {
    file.write_all(data).await?;
    file.flush().await?;
    file.sync_all().await
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|v| v.to_os_string())
        .unwrap_or_else(|| OsString::from("data"));
    name.push(".tmp");
    path.with_file_name(name)
}
