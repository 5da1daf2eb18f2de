//! Destinations for downloaded ticket images

use crate::backend::TicketImage;
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;

/// File name the ticket is offered under
pub const TICKET_FILE_NAME: &str = "ticket.png";

/// Where a rendered ticket is delivered
#[async_trait]
pub trait TicketSink: Send + Sync {
    /// Deliver the ticket under `file_name`
    async fn save(&self, file_name: &str, image: &TicketImage) -> Result<()>;
}

/// Writes tickets into a directory
#[derive(Debug, Clone)]
pub struct DirectoryTicketSink {
    dir: PathBuf,
}

impl DirectoryTicketSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl TicketSink for DirectoryTicketSink {
    async fn save(&self, file_name: &str, image: &TicketImage) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, &image.bytes).await?;
        info!(path = %path.display(), bytes = image.bytes.len(), "Ticket saved");
        Ok(())
    }
}

/// Keeps delivered tickets in memory
#[derive(Debug, Default)]
pub struct MemoryTicketSink {
    tickets: Mutex<Vec<(String, TicketImage)>>,
}

impl MemoryTicketSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tickets delivered so far, oldest first
    pub async fn tickets(&self) -> Vec<(String, TicketImage)> {
        self.tickets.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.tickets.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tickets.lock().await.is_empty()
    }
}

#[async_trait]
impl TicketSink for MemoryTicketSink {
    async fn save(&self, file_name: &str, image: &TicketImage) -> Result<()> {
        self.tickets
            .lock()
            .await
            .push((file_name.to_string(), image.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> TicketImage {
        TicketImage {
            bytes: vec![0x89, b'P', b'N', b'G'],
            content_type: Some("image/png".to_string()),
        }
    }

    #[tokio::test]
    async fn test_directory_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectoryTicketSink::new(dir.path().join("tickets"));

        sink.save(TICKET_FILE_NAME, &image()).await.unwrap();

        let written = tokio::fs::read(dir.path().join("tickets").join("ticket.png"))
            .await
            .unwrap();
        assert_eq!(written, image().bytes);
    }

    #[tokio::test]
    async fn test_memory_sink_records_in_order() {
        let sink = MemoryTicketSink::new();
        sink.save("first.png", &image()).await.unwrap();
        sink.save("second.png", &image()).await.unwrap();

        let names: Vec<String> = sink.tickets().await.into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["first.png", "second.png"]);
    }
}
