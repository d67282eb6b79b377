//! WebDAV file access: signed GET and PUT of a single file

use async_trait::async_trait;
use reqwest::Method;

use super::{ClientError, HostClient};
use crate::services::FileStore;

const DAV_ROOT: [&str; 3] = ["remote.php", "dav", "files"];

/// `remote.php/dav/files/{user}/{path...}`, empty path components dropped
fn dav_segments<'a>(user_id: &'a str, path: &'a str) -> Vec<&'a str> {
    let mut segments: Vec<&'a str> = DAV_ROOT.to_vec();
    segments.push(user_id);
    segments.extend(path.split('/').filter(|segment| !segment.is_empty()));
    segments
}

#[async_trait]
impl FileStore for HostClient {
    async fn read_file(&self, user_id: &str, path: &str) -> Result<Vec<u8>, ClientError> {
        let url = self.endpoint(dav_segments(user_id, path), &[])?;
        let response = self
            .send_signed(Method::GET, url, Vec::new(), None, Some(user_id))
            .await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn write_file(
        &self,
        user_id: &str,
        path: &str,
        content: Vec<u8>,
    ) -> Result<(), ClientError> {
        let url = self.endpoint(dav_segments(user_id, path), &[])?;
        self.send_signed(
            Method::PUT,
            url,
            content,
            Some("application/octet-stream"),
            Some(user_id),
        )
        .await?;
        Ok(())
    }
}
