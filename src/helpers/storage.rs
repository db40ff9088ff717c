use s3::creds::Credentials;
use s3::{Bucket, Region};
use uuid::Uuid;

use crate::config::Config;
use crate::errors::ApiError;

/// Gateway to the object store. Built once at bootstrap, cloned into the
/// worker closures through `web::Data`.
#[derive(Clone)]
pub struct Storage {
    bucket: Bucket,
    public_base: String,
}

impl Storage {
    pub fn from_config(config: &Config) -> Result<Storage, ApiError> {
        let region = Region::Custom {
            region: config.s3_region.clone(),
            endpoint: config.s3_endpoint.clone(),
        };

        let credentials = Credentials {
            access_key: Some(config.s3_access_key.clone()),
            secret_key: Some(config.s3_secret_key.clone()),
            security_token: None,
            session_token: None,
        };

        let mut bucket = Bucket::new(&config.s3_bucket, region, credentials)?;
        bucket.add_header("x-amz-acl", "public-read");

        Ok(Storage {
            bucket,
            public_base: config.s3_public_base.trim_end_matches('/').to_string(),
        })
    }

    /// Uploads one object and returns its public URL.
    pub async fn put(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<String, ApiError> {
        let (_, code) = self
            .bucket
            .put_object_with_content_type(key, data, content_type)
            .await?;

        if code != 200 {
            return Err(ApiError::Internal(format!(
                "Object storage answered {} for {}",
                code, key
            )));
        }

        Ok(format!("{}/{}", self.public_base, key))
    }
}

/// Object keys follow `{prefix}/{channel_id}/{uuid}-{filename}` so
/// re-uploads of a same-named file never collide.
pub fn object_key(prefix: &str, channel_id: i32, filename: &str) -> String {
    format!("{}/{}/{}-{}", prefix, channel_id, Uuid::new_v4(), filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_keys_are_scoped_and_unique() {
        let a = object_key("videos", 7, "clip.mp4");
        let b = object_key("videos", 7, "clip.mp4");

        assert!(a.starts_with("videos/7/"));
        assert!(a.ends_with("-clip.mp4"));
        assert_ne!(a, b);
    }
}
