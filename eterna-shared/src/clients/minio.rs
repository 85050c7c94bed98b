use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::Client as S3Client;

/// S3-compatible object storage for user uploads (MinIO in development).
#[derive(Clone)]
pub struct MinioClient {
    client: S3Client,
    bucket: String,
    public_url: String,
}

impl MinioClient {
    pub async fn new(
        endpoint: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
        public_url: &str,
    ) -> Self {
        let credentials = Credentials::new(access_key, secret_key, None, None, "minio");

        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(endpoint)
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        let client = S3Client::from_conf(config);

        // Already-exists errors are expected after the first boot.
        if let Err(e) = client.create_bucket().bucket(bucket).send().await {
            tracing::debug!(error = %e, bucket = %bucket, "create_bucket skipped");
        }

        tracing::info!(endpoint = %endpoint, bucket = %bucket, "object storage initialized");

        Self {
            client,
            bucket: bucket.to_string(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Upload an object and return its public URL.
    pub async fn upload(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body.into())
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| format!("upload failed: {e}"))?;

        Ok(self.public_url_for(key))
    }

    pub async fn delete(&self, key: &str) -> Result<(), String> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| format!("delete failed: {e}"))?;

        Ok(())
    }

    pub fn public_url_for(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_url, self.bucket, key)
    }

    /// Inverse of [`public_url_for`](Self::public_url_for); `None` for URLs
    /// that do not point into this bucket.
    pub fn key_for_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(&self.public_url)?
            .strip_prefix('/')?
            .strip_prefix(self.bucket.as_str())?
            .strip_prefix('/')
    }
}
