use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::operation::create_bucket::CreateBucketError;
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::{Client, error::SdkError};

use crate::application::ports::storage_port::StoragePort;
use crate::bootstrap::config::Config;
use crate::infrastructure::storage::{join_key, join_url, normalize_key, normalize_prefix};

pub struct S3StoragePort {
    client: Client,
    bucket: String,
    root_prefix: String,
    public_base: String,
}

impl S3StoragePort {
    pub async fn new(cfg: &Config) -> anyhow::Result<Self> {
        let bucket = cfg
            .s3_bucket
            .clone()
            .context("S3 bucket must be configured when using S3 storage backend")?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &cfg.s3_region {
            loader = loader.region(Region::new(region.clone()));
        }
        let shared_config = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);

        if let (Some(access), Some(secret)) = (&cfg.s3_access_key, &cfg.s3_secret_key) {
            let creds = Credentials::new(
                access.clone(),
                secret.clone(),
                None,
                None,
                "bookwiki-s3-static",
            );
            builder = builder.credentials_provider(creds);
        }
        if let Some(endpoint) = &cfg.s3_endpoint {
            builder = builder.endpoint_url(endpoint.clone());
        }
        if cfg.s3_use_path_style {
            builder = builder.force_path_style(true);
        }
        let client = Client::from_conf(builder.build());

        let root_prefix = normalize_prefix(&PathBuf::from(&cfg.storage_root));
        let public_base = match (&cfg.s3_endpoint, cfg.s3_use_path_style) {
            (Some(endpoint), true) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
            (Some(endpoint), false) => endpoint.trim_end_matches('/').to_string(),
            (None, _) => format!("https://{bucket}.s3.amazonaws.com"),
        };

        ensure_bucket(&client, &bucket).await?;
        Ok(Self {
            client,
            bucket,
            root_prefix,
            public_base,
        })
    }

    fn key(&self, remote_path: &str) -> anyhow::Result<String> {
        Ok(join_key(&self.root_prefix, &normalize_key(remote_path)?))
    }
}

#[async_trait]
impl StoragePort for S3StoragePort {
    async fn move_to_store(&self, local_path: &Path, remote_path: &str) -> anyhow::Result<()> {
        let key = self.key(remote_path)?;
        let content_type = mime_guess::from_path(remote_path)
            .first_or_octet_stream()
            .to_string();
        let body = ByteStream::from_path(local_path)
            .await
            .with_context(|| format!("failed to read staged file {}", local_path.display()))?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .with_context(|| format!("failed to upload object {key}"))?;
        let _ = tokio::fs::remove_file(local_path).await;
        Ok(())
    }

    async fn object_exists(&self, remote_path: &str) -> anyhow::Result<bool> {
        let key = self.key(remote_path)?;
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(service_err)) => {
                let head_err: &HeadObjectError = service_err.err();
                if head_err.is_not_found() {
                    Ok(false)
                } else {
                    Err(anyhow!("head_object error for {}: {}", key, head_err))
                }
            }
            Err(other) => Err(anyhow!("head_object failed for {}: {}", key, other)),
        }
    }

    async fn delete_folder(&self, remote_path: &str) -> anyhow::Result<usize> {
        let prefix = format!("{}/", self.key(remote_path)?);
        let mut removed = 0;
        let mut continuation: Option<String> = None;
        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .with_context(|| format!("failed to list objects under {prefix}"))?;

            let ids = page
                .contents()
                .iter()
                .filter_map(|o| o.key())
                .map(|k| ObjectIdentifier::builder().key(k).build())
                .collect::<Result<Vec<_>, _>>()?;
            if !ids.is_empty() {
                removed += ids.len();
                let delete = Delete::builder().set_objects(Some(ids)).build()?;
                self.client
                    .delete_objects()
                    .bucket(&self.bucket)
                    .delete(delete)
                    .send()
                    .await
                    .with_context(|| format!("failed to delete objects under {prefix}"))?;
            }

            match page.next_continuation_token() {
                Some(token) if page.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string())
                }
                _ => break,
            }
        }
        Ok(removed)
    }

    fn public_url(&self, remote_path: &str) -> String {
        let key = self.key(remote_path).unwrap_or_default();
        join_url(&self.public_base, &key)
    }
}

async fn ensure_bucket(client: &Client, bucket: &str) -> anyhow::Result<()> {
    match client.head_bucket().bucket(bucket).send().await {
        Ok(_) => return Ok(()),
        Err(SdkError::ServiceError(service_err)) => {
            if !matches!(service_err.err(), HeadBucketError::NotFound(_)) {
                return Err(anyhow!(service_err.err().to_string()));
            }
        }
        Err(err) => return Err(anyhow!(err.to_string())),
    }

    match client.create_bucket().bucket(bucket).send().await {
        Ok(_) => Ok(()),
        Err(SdkError::ServiceError(service_err)) => match service_err.err() {
            CreateBucketError::BucketAlreadyOwnedByYou(_) => Ok(()),
            CreateBucketError::BucketAlreadyExists(_) => Ok(()),
            other => Err(anyhow!(other.to_string())),
        },
        Err(err) => Err(anyhow!(err.to_string())),
    }
}
