use std::{
    io::{self, ErrorKind},
    path::PathBuf,
};

use chrono::Utc;
use tokio::{fs::OpenOptions, io::AsyncWriteExt};

/// Public path prefix uploaded files are served under.
pub const UPLOAD_ROUTE: &str = "/uploads";

const MAX_NAME_ATTEMPTS: u32 = 64;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct UploadStorage {
    dir: PathBuf,
}

impl UploadStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn ensure_dir(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// `<millis>-<basename>`, or `<millis>-<attempt>-<basename>` once that
    /// name is taken. Directory parts of the client name are dropped.
    pub fn stored_name(original: &str, millis: i64, attempt: u32) -> String {
        let base = original.rsplit(['/', '\\']).next().unwrap_or_default();
        let base = match base {
            "" | "." | ".." => "upload",
            name => name,
        };
        match attempt {
            0 => format!("{}-{}", millis, base),
            n => format!("{}-{}-{}", millis, n, base),
        }
    }

    /// Writes the attachment under a name no other upload holds and returns it.
    pub async fn save(&self, file: &UploadedFile) -> io::Result<String> {
        self.save_at(file, Utc::now().timestamp_millis()).await
    }

    async fn save_at(&self, file: &UploadedFile, millis: i64) -> io::Result<String> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let stored = Self::stored_name(&file.filename, millis, attempt);
            let path = self.dir.join(&stored);

            let mut handle = match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(handle) => handle,
                Err(error) if error.kind() == ErrorKind::AlreadyExists => continue,
                Err(error) => return Err(error),
            };

            if let Err(error) = write_all(&mut handle, &file.bytes).await {
                drop(handle);
                let _ = tokio::fs::remove_file(&path).await;
                return Err(error);
            }
            return Ok(stored);
        }

        Err(io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free upload name for {}", file.filename),
        ))
    }

    /// Best-effort cleanup for a file whose post was never persisted.
    pub async fn remove(&self, stored: &str) -> io::Result<()> {
        tokio::fs::remove_file(self.dir.join(stored)).await
    }

    pub fn public_url(scheme: &str, host: &str, stored: &str) -> String {
        format!("{}://{}{}/{}", scheme, host, UPLOAD_ROUTE, stored)
    }

    pub fn is_safe_name(name: &str) -> bool {
        !name.is_empty() && !name.contains(['/', '\\']) && !name.contains("..")
    }

    /// `Ok(None)` when no such file was stored.
    pub async fn read(&self, stored: &str) -> io::Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.dir.join(stored)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error),
        }
    }
}

async fn write_all(handle: &mut tokio::fs::File, bytes: &[u8]) -> io::Result<()> {
    handle.write_all(bytes).await?;
    handle.flush().await
}

pub fn content_type_for(name: &str) -> &'static str {
    let ext = name.rsplit('.').next().map(|ext| ext.to_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("mp4") => "video/mp4",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
