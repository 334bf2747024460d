use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::error::DataSourceError;
use crate::fs_util::persist_reader;

const BOX_SHARED_FOLDER_URL: &str = "https://ibm.ent.box.com/index.php";

/// Blocking single-attempt transfers.
pub trait Transfer: Send + Sync {
    /// Streams `url` into `{output_dir}/{file_name}`, replacing any existing file.
    fn download_file(
        &self,
        url: &str,
        file_name: &str,
        output_dir: &Path,
    ) -> Result<PathBuf, DataSourceError>;

    fn fetch_text(&self, url: &str) -> Result<String, DataSourceError>;

    fn fetch_json(&self, url: &str) -> Result<serde_json::Value, DataSourceError>;
}

#[derive(Debug, Clone, Default)]
pub struct TransferSettings {
    pub timeout: Option<Duration>,
}

#[derive(Clone)]
pub struct HttpTransfer {
    client: Client,
}

impl HttpTransfer {
    pub fn new(settings: TransferSettings) -> Result<Self, DataSourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("chem-ds/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| DataSourceError::Http(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .map_err(|err| DataSourceError::Http(err.to_string()))?;
        Ok(Self { client })
    }

    fn get(&self, url: &str) -> Result<Response, DataSourceError> {
        tracing::debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| DataSourceError::Http(err.to_string()))?;
        check_status(response)
    }
}

impl Transfer for HttpTransfer {
    fn download_file(
        &self,
        url: &str,
        file_name: &str,
        output_dir: &Path,
    ) -> Result<PathBuf, DataSourceError> {
        let mut response = self.get(url)?;
        persist_stream(&mut response, file_name, output_dir)
    }

    fn fetch_text(&self, url: &str) -> Result<String, DataSourceError> {
        self.get(url)?
            .text()
            .map_err(|err| DataSourceError::Http(err.to_string()))
    }

    fn fetch_json(&self, url: &str) -> Result<serde_json::Value, DataSourceError> {
        self.get(url)?
            .json()
            .map_err(|err| DataSourceError::Http(err.to_string()))
    }
}

fn check_status(response: Response) -> Result<Response, DataSourceError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let message = response
        .text()
        .unwrap_or_else(|_| "request failed".to_string());
    Err(DataSourceError::HttpStatus { status, message })
}

fn persist_stream<R: std::io::Read>(
    reader: &mut R,
    file_name: &str,
    output_dir: &Path,
) -> Result<PathBuf, DataSourceError> {
    persist_reader(reader, &output_dir.join(file_name))
        .map_err(|err| DataSourceError::Http(format!("{file_name}: {err}")))
}

pub fn box_shared_folder_url(folder_id: &str, vanity_name: &str) -> String {
    format!(
        "{BOX_SHARED_FOLDER_URL}?folder_id={folder_id}&q[shared_item][vanity_name]={vanity_name}&rm=box_v2_zip_shared_folder"
    )
}

/// Box shared folders hand out a short lived archive URL through a JSON endpoint.
pub fn resolve_box_shared_folder(
    transfer: &dyn Transfer,
    folder_id: &str,
    vanity_name: &str,
) -> Result<String, DataSourceError> {
    let body = transfer.fetch_json(&box_shared_folder_url(folder_id, vanity_name))?;
    body.get("download_url")
        .and_then(|value| value.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            DataSourceError::Resolution(format!(
                "Box shared folder {folder_id} ({vanity_name}) returned no download_url"
            ))
        })
}
