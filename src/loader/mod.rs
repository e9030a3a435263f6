//! Turns picked files or the sample manifest into an ordered list of image
//! identifiers and decodes them into a viewport stack.

pub mod fetch;
pub mod image_id;
pub mod manifest;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dicom::object::{from_reader, open_file, DefaultDicomObject};

use crate::engine::{Slice, StackEntry};
use crate::image_pipeline::FrameImagePipeline;
pub use fetch::{HttpFetch, HttpResponse, ReqwestFetch};
pub use image_id::{FileManager, ImageId, ImageSource};
pub use manifest::Manifest;

pub const RECOGNIZED_EXTENSIONS: [&str; 2] = ["dcm", "dicom"];

/// DICOM files often carry no extension, so names without a dot are kept too.
pub fn is_candidate(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    match name.rsplit_once('.') {
        None => true,
        Some((_, extension)) => RECOGNIZED_EXTENSIONS
            .iter()
            .any(|known| extension.eq_ignore_ascii_case(known)),
    }
}

/// Coarse progress: only the start and the end of a load are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: usize,
    pub total: usize,
}

impl LoadProgress {
    pub fn status(&self) -> String {
        format!("Loading… {}/{}", self.loaded, self.total)
    }
}

#[derive(Debug, Default)]
pub struct ImageSourceLoader {
    image_ids: Vec<ImageId>,
    files: FileManager,
}

impl ImageSourceLoader {
    pub fn image_ids(&self) -> &[ImageId] {
        &self.image_ids
    }

    pub fn files(&self) -> &FileManager {
        &self.files
    }

    /// Keeps the candidates among `paths`; `None` when nothing is left. An
    /// accepted selection replaces the paths registered by the previous one.
    pub fn load_from_files(&mut self, paths: &[PathBuf]) -> Option<StackRequest> {
        let candidates: Vec<&PathBuf> = paths.iter().filter(|path| is_candidate(path)).collect();

        let skipped = paths.len() - candidates.len();
        if skipped > 0 {
            log::info!("Skipped {skipped} file(s) that do not look like DICOM");
        }
        if candidates.is_empty() {
            return None;
        }

        self.files.clear();
        let (image_ids, sources) = candidates
            .into_iter()
            .map(|path| (self.files.add(path), ImageSource::File(path.clone())))
            .unzip();
        Some(StackRequest { image_ids, sources })
    }

    pub fn replace_image_ids(&mut self, image_ids: Vec<ImageId>) {
        self.image_ids = image_ids;
    }
}

#[derive(Debug, Clone)]
pub struct StackRequest {
    image_ids: Vec<ImageId>,
    sources: Vec<ImageSource>,
}

impl StackRequest {
    pub fn from_urls(image_ids: Vec<ImageId>, files: &FileManager) -> Option<Self> {
        let sources = image_ids
            .iter()
            .map(|id| files.resolve(id))
            .collect::<Option<Vec<_>>>()?;
        Some(Self { image_ids, sources })
    }

    pub fn image_ids(&self) -> &[ImageId] {
        &self.image_ids
    }

    pub fn len(&self) -> usize {
        self.image_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image_ids.is_empty()
    }

    /// Middle slice, so the viewer opens inside the series.
    pub fn initial_index(&self) -> usize {
        self.image_ids.len() / 2
    }

    pub fn started(&self) -> LoadProgress {
        LoadProgress {
            loaded: 0,
            total: self.len(),
        }
    }

    /// Decodes every image of the request in one go.
    pub async fn fetch<H: HttpFetch>(self, http: &H) -> LoadedStack {
        let initial_index = self.initial_index();
        let mut entries = Vec::with_capacity(self.image_ids.len());
        for (image_id, source) in self.image_ids.into_iter().zip(self.sources) {
            let slice = load_image(http, &source).await;
            if let Err(err) = &slice {
                log::warn!("{image_id}: {err}");
            }
            entries.push(StackEntry { image_id, slice });
        }
        LoadedStack {
            entries,
            initial_index,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedStack {
    pub entries: Vec<StackEntry>,
    pub initial_index: usize,
}

impl LoadedStack {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn finished(&self) -> LoadProgress {
        LoadProgress {
            loaded: self.len(),
            total: self.len(),
        }
    }
}

/// Any failure along the way means "no sample data", never an error.
pub async fn load_sample_stack<H: HttpFetch>(http: H, base_url: String) -> Option<LoadedStack> {
    let manifest = match manifest::fetch_manifest(&http, &base_url).await {
        Ok(manifest) => manifest,
        Err(err) => {
            log::info!("No sample data available: {err}");
            return None;
        }
    };
    if manifest.files.is_empty() {
        log::info!("Sample manifest lists no files");
        return None;
    }

    let image_ids = manifest::sample_image_ids(&base_url, &manifest);
    let request = StackRequest::from_urls(image_ids, &FileManager::default())?;
    Some(request.fetch(&http).await)
}

pub async fn load_image<H: HttpFetch>(http: &H, source: &ImageSource) -> Slice {
    let object = match source {
        ImageSource::File(path) => open_file(path).map_err(|err| {
            format!("{}: failed to open DICOM file ({err})", path.display())
        })?,
        ImageSource::Url(url) => {
            let response = http.get(url).await.map_err(|err| err.to_string())?;
            if !response.is_success() {
                return Err(format!("{url} answered with status {}", response.status));
            }
            parse_dicom_bytes(&response.body)
                .map_err(|err| format!("{url}: failed to parse DICOM data ({err})"))?
        }
    };
    FrameImagePipeline::decode_first_frame(&object).map(Arc::new)
}

fn parse_dicom_bytes(bytes: &[u8]) -> Result<DefaultDicomObject, dicom::object::ReadError> {
    let body = match bytes.get(128..132) {
        Some(b"DICM") => &bytes[128..],
        _ => bytes,
    };
    from_reader(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use std::collections::HashMap;

    #[derive(Clone, Default)]
    struct StaticFetch {
        responses: Arc<HashMap<String, HttpResponse>>,
    }

    impl StaticFetch {
        fn with(responses: &[(&str, u16, &[u8])]) -> Self {
            let responses = responses
                .iter()
                .map(|(url, status, body)| {
                    (
                        url.to_string(),
                        HttpResponse {
                            status: *status,
                            body: body.to_vec(),
                        },
                    )
                })
                .collect();
            Self {
                responses: Arc::new(responses),
            }
        }
    }

    impl HttpFetch for StaticFetch {
        async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
            Ok(self.responses.get(url).cloned().unwrap_or(HttpResponse {
                status: 404,
                body: Vec::new(),
            }))
        }
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|name| PathBuf::from("/scans").join(name)).collect()
    }

    #[test]
    fn candidates_are_dcm_or_extensionless() {
        assert!(is_candidate(Path::new("/scans/a.dcm")));
        assert!(is_candidate(Path::new("/scans/B.DCM")));
        assert!(is_candidate(Path::new("/scans/series.dicom")));
        assert!(is_candidate(Path::new("/scans/IM000001")));
        assert!(!is_candidate(Path::new("/scans/notes.txt")));
        assert!(!is_candidate(Path::new("/scans/preview.jpg")));
    }

    #[test]
    fn empty_selection_loads_nothing() {
        let mut loader = ImageSourceLoader::default();
        loader.replace_image_ids(vec![ImageId::new("dicomfile:41")]);

        assert!(loader.load_from_files(&[]).is_none());
        assert!(loader.load_from_files(&paths(&["readme.txt"])).is_none());
        assert_eq!(loader.image_ids(), &[ImageId::new("dicomfile:41")]);
    }

    #[test]
    fn file_request_keeps_order_and_opens_in_the_middle() {
        let mut loader = ImageSourceLoader::default();

        let request = loader
            .load_from_files(&paths(&["a.dcm", "skip.txt", "b.dcm", "c.dcm"]))
            .expect("three candidates");

        assert_eq!(
            request.image_ids(),
            &[
                ImageId::new("dicomfile:0"),
                ImageId::new("dicomfile:1"),
                ImageId::new("dicomfile:2"),
            ]
        );
        assert_eq!(request.initial_index(), 1);
        assert_eq!(request.started(), LoadProgress { loaded: 0, total: 3 });
        assert_eq!(
            loader.files().get(&ImageId::new("dicomfile:2")),
            Some(Path::new("/scans/c.dcm"))
        );
    }

    #[test]
    fn new_selection_replaces_registered_paths() {
        let mut loader = ImageSourceLoader::default();
        let first = loader
            .load_from_files(&paths(&["a.dcm", "b.dcm"]))
            .expect("two candidates");

        assert!(loader.load_from_files(&paths(&["notes.txt"])).is_none());
        assert_eq!(loader.files().len(), 2);

        let second = loader
            .load_from_files(&paths(&["c.dcm"]))
            .expect("one candidate");

        assert_eq!(loader.files().len(), 1);
        assert_eq!(loader.files().get(&first.image_ids()[0]), None);
        assert_eq!(second.image_ids(), &[ImageId::new("dicomfile:2")]);
        assert_eq!(
            loader.files().get(&second.image_ids()[0]),
            Some(Path::new("/scans/c.dcm"))
        );
    }

    #[tokio::test]
    async fn unreadable_files_become_failed_slices() {
        let mut loader = ImageSourceLoader::default();
        let request = loader
            .load_from_files(&paths(&["missing-1.dcm", "missing-2.dcm"]))
            .expect("two candidates");

        let stack = request.fetch(&StaticFetch::default()).await;

        assert_eq!(stack.len(), 2);
        assert_eq!(stack.initial_index, 1);
        assert_eq!(stack.finished(), LoadProgress { loaded: 2, total: 2 });
        assert!(stack.entries.iter().all(|entry| entry.slice.is_err()));
    }

    #[tokio::test]
    async fn missing_manifest_means_no_sample_data() {
        let http = StaticFetch::default();

        assert!(load_sample_stack(http, "http://host/data".to_string()).await.is_none());
    }

    #[tokio::test]
    async fn malformed_or_empty_manifest_means_no_sample_data() {
        let malformed = StaticFetch::with(&[("http://host/data/manifest.json", 200, b"{files:")]);
        let empty = StaticFetch::with(&[("http://host/data/manifest.json", 200, br#"{"files":[]}"#)]);

        assert!(load_sample_stack(malformed, "http://host/data".to_string()).await.is_none());
        assert!(load_sample_stack(empty, "http://host/data".to_string()).await.is_none());
    }

    #[tokio::test]
    async fn manifest_entries_are_fetched_in_order() {
        let http = StaticFetch::with(&[
            (
                "http://host/data/manifest.json",
                200,
                br#"{"files":["1.dcm","2.dcm","3.dcm"]}"#,
            ),
            ("http://host/data/sample_dicom/2.dcm", 200, b"not dicom"),
        ]);

        let stack = load_sample_stack(http, "http://host/data/".to_string())
            .await
            .expect("manifest lists files");

        let ids: Vec<&str> = stack.entries.iter().map(|entry| entry.image_id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "wadouri:http://host/data/sample_dicom/1.dcm",
                "wadouri:http://host/data/sample_dicom/2.dcm",
                "wadouri:http://host/data/sample_dicom/3.dcm",
            ]
        );
        assert_eq!(stack.initial_index, 1);
        let first = stack.entries[0].slice.as_ref().expect_err("404 slice");
        assert!(first.contains("404"));
        assert!(stack.entries[1].slice.is_err());
    }
}
