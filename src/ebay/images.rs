use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use thiserror::Error;
use tracing::{debug, warn};

use crate::ebay::auth::Credentials;
use crate::ebay::env::EbayEnv;
use crate::http::build_client;

#[derive(Debug, Error)]
pub enum EbayImageError {
    #[error("photo directory {dir} unreadable: {source}")]
    PhotoDir {
        dir: String,
        source: std::io::Error,
    },
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("picture response carried no FullURL")]
    MissingUrl,
}

/// Capability consumed by the payload builder: hosted image URLs for a SKU.
/// A directory-level error fails the row; per-file upload failures are the
/// implementor's business.
#[async_trait]
pub trait ImageResolver {
    async fn hosted_urls(&self, sku: &str) -> Result<Vec<String>, EbayImageError>;
}

/// Uploads the pictures stored under `{photo_root}/{sku}/` through the
/// legacy `UploadSiteHostedPictures` Trading call and collects the hosted
/// URLs in filename order. Files are uploaded one at a time; a failed file
/// is logged and skipped, never retried.
pub struct PictureUploader {
    http: Client,
    env: EbayEnv,
    credentials: Credentials,
    photo_root: PathBuf,
    access_token: String,
}

impl PictureUploader {
    pub fn new(
        env: EbayEnv,
        credentials: Credentials,
        photo_root: PathBuf,
        access_token: String,
    ) -> Self {
        Self {
            http: build_client(),
            env,
            credentials,
            photo_root,
            access_token,
        }
    }

    /// The Trading API wants the token inside an XML envelope rather than a
    /// header. `Supersize` asks for the largest hosted rendition.
    fn envelope(&self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <UploadSiteHostedPicturesRequest xmlns=\"urn:ebay:apis:eBLBaseComponents\">\n\
             \t<RequesterCredentials>\n\
             \t\t<ebl:eBayAuthToken xmlns:ebl=\"urn:ebay:apis:eBLBaseComponents\">{}</ebl:eBayAuthToken>\n\
             \t</RequesterCredentials>\n\
             \t<PictureSet>Supersize</PictureSet>\n\
             </UploadSiteHostedPicturesRequest>\n",
            self.access_token
        )
    }

    async fn upload_picture(&self, path: &Path) -> Result<String, EbayImageError> {
        let bytes =
            std::fs::read(path).map_err(|err| EbayImageError::Upload(err.to_string()))?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("image.jpg")
            .to_string();
        let file_part = Part::bytes(bytes)
            .file_name(filename)
            .mime_str("image/jpeg")
            .map_err(|err| EbayImageError::Upload(err.to_string()))?;
        let form = Form::new()
            .text("request", self.envelope())
            .part("file", file_part);

        let response = self
            .http
            .post(format!("{}/ws/api.dll", self.env.api_root()))
            .header("SOAPAction", "")
            .header("X-EBAY-API-COMPATIBILITY-LEVEL", "967")
            .header("X-EBAY-API-DEV-NAME", &self.credentials.dev_id)
            .header("X-EBAY-API-APP-NAME", &self.credentials.client_id)
            .header("X-EBAY-API-CERT-NAME", &self.credentials.client_secret)
            .header("X-EBAY-API-SITEID", "0")
            .header("X-EBAY-API-DETAIL-LEVEL", "0")
            .header("X-EBAY-API-CALL-NAME", "UploadSiteHostedPictures")
            .multipart(form)
            .send()
            .await
            .map_err(|err| EbayImageError::Upload(err.to_string()))?;

        if !response.status().is_success() {
            return Err(EbayImageError::Upload(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let xml = response
            .text()
            .await
            .map_err(|err| EbayImageError::Upload(err.to_string()))?;
        extract_full_url(&xml).ok_or(EbayImageError::MissingUrl)
    }
}

#[async_trait]
impl ImageResolver for PictureUploader {
    async fn hosted_urls(&self, sku: &str) -> Result<Vec<String>, EbayImageError> {
        let dir = self.photo_root.join(sku);
        let entries = std::fs::read_dir(&dir).map_err(|source| EbayImageError::PhotoDir {
            dir: dir.display().to_string(),
            source,
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        debug!(target = "lister.images", sku = %sku, files = files.len(), "uploading pictures");

        let mut urls = Vec::new();
        for file in files {
            match self.upload_picture(&file).await {
                Ok(url) => urls.push(url),
                Err(err) => warn!(
                    target = "lister.images",
                    sku = %sku,
                    file = %file.display(),
                    error = %err,
                    "picture upload failed, skipping file"
                ),
            }
        }
        Ok(urls)
    }
}

/// The response is namespaced XML; the hosted URL sits in the first
/// `FullURL` element. The pack carries no XML reader and a whole parser for
/// one element is not worth a new dependency, so this scans for the tag and
/// unescapes the one entity eBay puts in URLs.
fn extract_full_url(xml: &str) -> Option<String> {
    let at = xml.find("FullURL")?;
    let rest = &xml[at..];
    let open_end = rest.find('>')?;
    let body = &rest[open_end + 1..];
    let close = body.find("</")?;
    let value = body[..close].trim();
    if value.is_empty() {
        None
    } else {
        Some(value.replace("&amp;", "&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<UploadSiteHostedPicturesResponse xmlns="urn:ebay:apis:eBLBaseComponents">
  <Ack>Success</Ack>
  <SiteHostedPictureDetails>
    <FullURL>https://i.ebayimg.com/00/s/MTYw/z/abc/$_1.JPG?set_id=880000500F&amp;v=2</FullURL>
    <BaseURL>https://i.ebayimg.com/00/s/MTYw/z/abc/$_</BaseURL>
  </SiteHostedPictureDetails>
</UploadSiteHostedPicturesResponse>"#;

    #[test]
    fn full_url_extracted_and_unescaped() {
        let url = extract_full_url(RESPONSE).expect("url");
        assert_eq!(
            url,
            "https://i.ebayimg.com/00/s/MTYw/z/abc/$_1.JPG?set_id=880000500F&v=2"
        );
    }

    #[test]
    fn missing_full_url_yields_none() {
        assert!(extract_full_url("<Ack>Failure</Ack>").is_none());
        assert!(extract_full_url("").is_none());
    }

    #[test]
    fn envelope_embeds_token_and_picture_set() {
        let uploader = PictureUploader::new(
            EbayEnv::Sandbox,
            Credentials {
                client_id: "app".into(),
                client_secret: "cert".into(),
                dev_id: "dev".into(),
                redirect_uri: "runame".into(),
            },
            PathBuf::from("photos"),
            "tok-123".into(),
        );
        let envelope = uploader.envelope();
        assert!(envelope.contains("<ebl:eBayAuthToken"));
        assert!(envelope.contains("tok-123"));
        assert!(envelope.contains("<PictureSet>Supersize</PictureSet>"));
    }

    #[tokio::test]
    async fn missing_sku_directory_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let uploader = PictureUploader::new(
            EbayEnv::Sandbox,
            Credentials {
                client_id: "app".into(),
                client_secret: "cert".into(),
                dev_id: "dev".into(),
                redirect_uri: "runame".into(),
            },
            dir.path().to_path_buf(),
            "tok".into(),
        );
        let err = uploader.hosted_urls("NO-SUCH-SKU").await.expect_err("err");
        assert!(matches!(err, EbayImageError::PhotoDir { .. }));
    }
}
