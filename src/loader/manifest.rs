use serde::Deserialize;

use super::fetch::HttpFetch;
use super::image_id::ImageId;
use crate::error::FetchError;

/// `manifest.json` listing the sample series served next to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub files: Vec<String>,
}

pub fn manifest_url(base_url: &str) -> String {
    format!("{}/manifest.json", base_url.trim_end_matches('/'))
}

pub fn sample_image_ids(base_url: &str, manifest: &Manifest) -> Vec<ImageId> {
    let base = base_url.trim_end_matches('/');
    manifest
        .files
        .iter()
        .map(|file| ImageId::from_url(&format!("{base}/sample_dicom/{file}")))
        .collect()
}

pub async fn fetch_manifest<H: HttpFetch>(http: &H, base_url: &str) -> Result<Manifest, FetchError> {
    let url = manifest_url(base_url);
    let response = http.get(&url).await?;
    if !response.is_success() {
        return Err(FetchError::Status {
            url,
            status: response.status,
        });
    }
    Ok(serde_json::from_slice(&response.body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_built_under_the_base() {
        let manifest = Manifest {
            files: vec!["1.dcm".to_string(), "2.dcm".to_string()],
        };

        assert_eq!(manifest_url("http://host/data/"), "http://host/data/manifest.json");
        assert_eq!(
            sample_image_ids("http://host/data", &manifest),
            vec![
                ImageId::new("wadouri:http://host/data/sample_dicom/1.dcm"),
                ImageId::new("wadouri:http://host/data/sample_dicom/2.dcm"),
            ]
        );
    }

    #[test]
    fn missing_file_list_reads_as_empty() {
        let manifest: Manifest = serde_json::from_str("{}").expect("valid json");

        assert!(manifest.files.is_empty());
    }
}
