//! Object storage for uploaded resumes.
//!
//! Handlers only see `ResumeStore`; production wires in `S3ResumeStore`
//! (MinIO locally, S3 in production) and tests use an in-memory store.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;

use crate::errors::AppError;

#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Stores `body` under `key` and returns the URL clients should use to fetch it.
    async fn put(&self, key: &str, content_type: &str, body: Bytes) -> Result<String, AppError>;
}

pub struct S3ResumeStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_url: String,
}

impl S3ResumeStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, public_url: String) -> Self {
        Self {
            client,
            bucket,
            public_url,
        }
    }
}

#[async_trait]
impl ResumeStore for S3ResumeStore {
    async fn put(&self, key: &str, content_type: &str, body: Bytes) -> Result<String, AppError> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

        info!("Uploaded {size} bytes to s3://{}/{}", self.bucket, key);
        Ok(object_url(&self.public_url, key))
    }
}

pub fn object_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}

#[cfg(test)]
pub mod memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Keeps uploads in a map so tests can assert on what was stored.
    #[derive(Default)]
    pub struct MemoryResumeStore {
        pub objects: Mutex<HashMap<String, (String, Bytes)>>,
    }

    #[async_trait]
    impl ResumeStore for MemoryResumeStore {
        async fn put(
            &self,
            key: &str,
            content_type: &str,
            body: Bytes,
        ) -> Result<String, AppError> {
            self.objects
                .lock()
                .unwrap()
                .insert(key.to_string(), (content_type.to_string(), body));
            Ok(object_url("memory://resumes", key))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryResumeStore;
    use super::*;

    #[test]
    fn test_object_url_joins_cleanly() {
        assert_eq!(
            object_url("http://localhost:9000/resumes/", "/resumes/a/b.pdf"),
            "http://localhost:9000/resumes/resumes/a/b.pdf"
        );
    }

    #[tokio::test]
    async fn test_memory_store_records_upload() {
        let store = MemoryResumeStore::default();
        let url = store
            .put("resumes/x/cv.pdf", "application/pdf", Bytes::from_static(b"%PDF-1.7"))
            .await
            .unwrap();
        assert_eq!(url, "memory://resumes/resumes/x/cv.pdf");
        let objects = store.objects.lock().unwrap();
        assert_eq!(objects["resumes/x/cv.pdf"].0, "application/pdf");
    }
}
