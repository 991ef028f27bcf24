use super::*;

impl RemoteClient {
    pub fn download_file(&self, file_id: &str) -> Result<Vec<u8>, RemoteError> {
        let resp = self.send("download file", |c| {
            c.get(self.url(&format!("/files/{}/download", file_id)))
        })?;
        let bytes = resp
            .bytes()
            .map_err(|e| RemoteError::transport("download file", e))?;
        Ok(bytes.to_vec())
    }
}
