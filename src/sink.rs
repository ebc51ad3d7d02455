use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::OpenOptions;

/// Append-only log file for one instance, opened on the first line.
pub struct LogSink {
    path: PathBuf,
    file: Option<Arc<File>>,
    lines: usize,
}

impl LogSink {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            file: None,
            lines: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line and flush it before returning.
    pub async fn append_line(&mut self, line: &str) -> io::Result<()> {
        let file = match &self.file {
            Some(f) => Arc::clone(f),
            None => {
                let opened = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)
                    .await?
                    .into_std()
                    .await;
                Arc::clone(self.file.insert(Arc::new(opened)))
            }
        };

        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        // A blocking job runs to the end even if the streamer is aborted,
        // so a cut-off lands between lines, whatever their length.
        tokio::task::spawn_blocking(move || (&*file).write_all(buf.as_bytes()))
            .await
            .map_err(io::Error::other)??;
        self.lines += 1;
        Ok(())
    }

    /// Close the file, if it was ever opened. Returns the number of lines written.
    pub async fn close(mut self) -> io::Result<usize> {
        if let Some(file) = self.file.take() {
            tokio::task::spawn_blocking(move || file.sync_data())
                .await
                .map_err(io::Error::other)??;
        }
        Ok(self.lines)
    }
}
