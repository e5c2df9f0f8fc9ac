//! HTTP backend with a plain-text index file
//!
//! The server publishes an index file (`index.txt` by default) containing one
//! `.gpkg` key per line; `#`-prefixed comments and blank lines are skipped.
//! Keys resolve relative to the base URL.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use locus_core::config::HttpConfig;
use locus_core::{LocusError, Result};
use tokio::io::AsyncWriteExt;

use crate::ports::{ensure_parent_dirs, is_gpkg_key, ObjectStore, RemoteObject};

pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
    index_file: String,
}

impl HttpStore {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| LocusError::storage("init", &config.base_url, e))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            index_file: config.index_file.clone(),
        })
    }

    fn url_for(&self, key: &str) -> String {
        join_url(&self.base_url, key)
    }
}

/// Parse an index document into its usable keys.
pub fn parse_index(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| is_gpkg_key(line))
        .map(str::to_string)
        .collect()
}

fn join_url(base: &str, key: &str) -> String {
    let base = base.trim_end_matches('/');
    let key = key.trim_start_matches('/');
    format!("{base}/{key}")
}

#[async_trait]
impl ObjectStore for HttpStore {
    async fn list(&self) -> Result<Vec<RemoteObject>> {
        let url = self.url_for(&self.index_file);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LocusError::storage("list", &self.index_file, e))?;

        // A missing index means an empty backend rather than a failure.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let response = response
            .error_for_status()
            .map_err(|e| LocusError::storage("list", &self.index_file, e))?;

        let body = response
            .text()
            .await
            .map_err(|e| LocusError::storage("list", &self.index_file, e))?;

        Ok(parse_index(&body)
            .into_iter()
            .map(|key| RemoteObject {
                key,
                size: 0,
                last_modified: None,
                etag: None,
            })
            .collect())
    }

    async fn download(&self, key: &str, local_path: &Path) -> Result<()> {
        ensure_parent_dirs(local_path).await?;

        let response = self
            .client
            .get(self.url_for(key))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| LocusError::storage("download", key, e))?;

        let mut file = tokio::fs::File::create(local_path)
            .await
            .map_err(|e| LocusError::storage("download", key, e))?;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| LocusError::storage("download", key, e))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| LocusError::storage("download", key, e))?;
        }
        file.flush()
            .await
            .map_err(|e| LocusError::storage("download", key, e))?;

        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let response = self
            .client
            .head(self.url_for(key))
            .send()
            .await
            .map_err(|e| LocusError::storage("exists", key, e))?;
        Ok(response.status().is_success())
    }

    async fn reader(&self, key: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(self.url_for(key))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| LocusError::storage("read", key, e))?;

        response
            .bytes()
            .await
            .map_err(|e| LocusError::storage("read", key, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_parsing_skips_comments_and_blanks() {
        let body = "\
# regional packages
districts.gpkg

zones.gpkg
  # indented comment
nested/parcels.gpkg
";
        assert_eq!(
            parse_index(body),
            vec!["districts.gpkg", "zones.gpkg", "nested/parcels.gpkg"]
        );
    }

    #[test]
    fn index_parsing_drops_non_gpkg_lines() {
        let body = "districts.gpkg\nreadme.md\narchive.zip\n";
        assert_eq!(parse_index(body), vec!["districts.gpkg"]);
    }

    #[test]
    fn url_joining_normalizes_slashes() {
        assert_eq!(
            join_url("https://x.test/data/", "a.gpkg"),
            "https://x.test/data/a.gpkg"
        );
        assert_eq!(
            join_url("https://x.test/data", "/a.gpkg"),
            "https://x.test/data/a.gpkg"
        );
    }
}
