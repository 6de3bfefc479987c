//! Image uploads for posts.
//!
//! Images live in a single bucket of the blob store under generated names
//! (`<unix_millis>-<random>.<ext>`) and are referenced from posts by their
//! public URL.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use metrics::counter;
use imagesize::ImageType;
use sha2::{Digest, Sha256};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::repos::{BlobStore, RepoError};

const RAW_BASE64_CONTENT_TYPE: &str = "image/jpeg";
const RANDOM_SUFFIX_LEN: usize = 13;
const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("No file provided")]
    Missing,
    #[error("File must be an image")]
    NotAnImage,
    #[error("File size must be less than {limit}")]
    TooLarge { limit: String },
    #[error("File is not a readable image")]
    Undecodable,
    #[error("Invalid base64 image data")]
    InvalidEncoding,
    #[error(transparent)]
    Store(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub url: String,
    pub name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub width: u32,
    pub height: u32,
    pub checksum: String,
}

#[derive(Debug, Clone)]
pub struct ImageSettings {
    pub public_base_url: String,
    pub bucket: String,
    pub max_bytes: u64,
}

#[derive(Clone)]
pub struct ImageService {
    store: Arc<dyn BlobStore>,
    settings: ImageSettings,
}

impl ImageService {
    pub fn new(store: Arc<dyn BlobStore>, settings: ImageSettings) -> Self {
        let public_base_url = settings.public_base_url.trim_end_matches('/').to_string();
        Self {
            store,
            settings: ImageSettings {
                public_base_url,
                ..settings
            },
        }
    }

    pub fn bucket(&self) -> &str {
        &self.settings.bucket
    }

    pub async fn upload(&self, upload: ImageUpload) -> Result<StoredImage, ImageError> {
        let ImageUpload {
            filename,
            content_type,
            data,
        } = upload;

        if data.is_empty() {
            return Err(ImageError::Missing);
        }

        let content_type = content_type
            .map(|value| value.trim().to_ascii_lowercase())
            .filter(|value| !value.is_empty())
            .or_else(|| {
                filename
                    .as_deref()
                    .and_then(|name| mime_guess::from_path(name).first_raw())
                    .map(str::to_string)
            })
            .ok_or(ImageError::NotAnImage)?;
        if !content_type.starts_with("image/") {
            return Err(ImageError::NotAnImage);
        }

        if data.len() as u64 > self.settings.max_bytes {
            return Err(ImageError::TooLarge {
                limit: format_size_limit(self.settings.max_bytes),
            });
        }

        // The stored name and the served MIME type follow the bytes, never
        // the client's filename or declared type.
        let format = sniff_format(&data)?;
        let content_type = format.content_type.to_string();

        let dimensions = imagesize::blob_size(&data).map_err(|_| ImageError::Undecodable)?;
        let width = u32::try_from(dimensions.width).map_err(|_| ImageError::Undecodable)?;
        let height = u32::try_from(dimensions.height).map_err(|_| ImageError::Undecodable)?;

        let name = generate_object_name(format.extension);
        let key = format!("{}/{name}", self.settings.bucket);
        let checksum = hex::encode(Sha256::digest(&data));
        let size_bytes = data.len() as u64;

        self.store.put_object(&key, data).await?;

        counter!("postdesk_image_upload_total").increment(1);
        info!(
            target = "postdesk::images",
            name = %name,
            size_bytes,
            content_type = %content_type,
            "image stored"
        );

        Ok(StoredImage {
            url: self.public_url(&name),
            name,
            content_type,
            size_bytes,
            width,
            height,
            checksum,
        })
    }

    /// Accepts `data:image/<kind>;base64,<payload>` or a bare base64 payload.
    pub async fn upload_data_uri(
        &self,
        data: &str,
        filename: Option<String>,
    ) -> Result<StoredImage, ImageError> {
        let (content_type, payload) = parse_data_uri(data.trim())?;
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|_| ImageError::InvalidEncoding)?;

        self.upload(ImageUpload {
            filename,
            content_type: Some(content_type),
            data: Bytes::from(bytes),
        })
        .await
    }

    /// Delete the stored object behind `url`. Returns `false` for URLs that
    /// do not point into our bucket.
    pub async fn delete_by_url(&self, url: &str) -> Result<bool, ImageError> {
        let Some(name) = self.object_name(url) else {
            return Ok(false);
        };
        let key = format!("{}/{name}", self.settings.bucket);
        self.store.delete_object(&key).await?;
        info!(target = "postdesk::images", name = %name, "image deleted");
        Ok(true)
    }

    /// Deletion that never fails the caller; used after the owning post changed.
    pub async fn discard(&self, url: Option<&str>) {
        let Some(url) = url else {
            return;
        };
        if let Err(err) = self.delete_by_url(url).await {
            warn!(
                target = "postdesk::images",
                url = %url,
                error = %err,
                "failed to delete image"
            );
        }
    }

    /// Load a stored object by its `<bucket>/<name>` path.
    pub async fn read(&self, path: &str) -> Result<Option<Bytes>, ImageError> {
        let Some((bucket, name)) = path.split_once('/') else {
            return Ok(None);
        };
        if bucket != self.settings.bucket || !is_object_name(name) {
            return Ok(None);
        }
        Ok(self.store.get_object(path).await?)
    }

    pub fn public_url(&self, name: &str) -> String {
        format!(
            "{}/{}/{name}",
            self.settings.public_base_url, self.settings.bucket
        )
    }

    /// Object name of a URL pointing into our bucket; query strings and
    /// fragments are ignored.
    pub fn object_name(&self, url: &str) -> Option<String> {
        let without_query = url.split(['?', '#']).next().unwrap_or_default();
        let prefix = format!(
            "{}/{}/",
            self.settings.public_base_url, self.settings.bucket
        );
        let name = without_query.strip_prefix(&prefix)?;
        is_object_name(name).then(|| name.to_string())
    }
}

fn is_object_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('\\') && !name.starts_with('.')
}

fn parse_data_uri(data: &str) -> Result<(String, &str), ImageError> {
    let Some(rest) = data.strip_prefix("data:") else {
        return Ok((RAW_BASE64_CONTENT_TYPE.to_string(), data));
    };

    let (header, payload) = rest.split_once(',').ok_or(ImageError::InvalidEncoding)?;
    let content_type = header
        .strip_suffix(";base64")
        .ok_or(ImageError::InvalidEncoding)?;
    Ok((content_type.trim().to_ascii_lowercase(), payload))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ImageFormat {
    extension: &'static str,
    content_type: &'static str,
}

impl ImageFormat {
    const fn new(extension: &'static str, content_type: &'static str) -> Self {
        Self {
            extension,
            content_type,
        }
    }
}

/// Formats posts may carry, identified by their file signature.
fn sniff_format(data: &[u8]) -> Result<ImageFormat, ImageError> {
    let kind = imagesize::image_type(data).map_err(|_| ImageError::NotAnImage)?;
    match kind {
        ImageType::Png => Ok(ImageFormat::new("png", "image/png")),
        ImageType::Jpeg => Ok(ImageFormat::new("jpg", "image/jpeg")),
        ImageType::Gif => Ok(ImageFormat::new("gif", "image/gif")),
        ImageType::Webp => Ok(ImageFormat::new("webp", "image/webp")),
        ImageType::Bmp => Ok(ImageFormat::new("bmp", "image/bmp")),
        ImageType::Tiff => Ok(ImageFormat::new("tiff", "image/tiff")),
        ImageType::Ico => Ok(ImageFormat::new("ico", "image/x-icon")),
        _ => Err(ImageError::NotAnImage),
    }
}

/// Extensions [`sniff_format`] can produce; anything else in the bucket is
/// not served as an image.
pub fn is_image_extension(extension: &str) -> bool {
    matches!(
        extension,
        "png" | "jpg" | "gif" | "webp" | "bmp" | "tiff" | "ico"
    )
}

fn format_size_limit(bytes: u64) -> String {
    if bytes >= MIB {
        if bytes % MIB == 0 {
            format!("{}MB", bytes / MIB)
        } else {
            format!("{:.1}MB", bytes as f64 / MIB as f64)
        }
    } else if bytes >= KIB && bytes % KIB == 0 {
        format!("{}KB", bytes / KIB)
    } else {
        format!("{bytes} bytes")
    }
}

fn generate_object_name(extension: &str) -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let random = Uuid::new_v4().simple().to_string();
    format!("{millis}-{}.{extension}", &random[..RANDOM_SUFFIX_LEN])
}
