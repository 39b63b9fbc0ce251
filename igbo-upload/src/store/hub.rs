//! Hugging Face Hub dataset store
//!
//! Repository layout:
//! - `data/train.jsonl` one JSON row per record
//! - `dataset_infos.json` column schema under the `default` config, read by
//!   the `datasets` library when loading the repository
//! - `audio/<uuid>.wav` uploaded clips, referenced by `audio_file_path`
//!
//! Every publish is a single commit. Files the Hub wants in LFS (the clips)
//! are uploaded through the LFS batch API first and committed as pointers.
//! With a known head revision the commit carries `parentCommit`, so the Hub
//! rejects it if anything landed since the fetch.

use async_trait::async_trait;
use base64::Engine;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{
    new_audio_path, split_dataset_id, DatasetStore, FetchOutcome, Precondition, PublishReceipt,
    RemoteSnapshot, StoreError,
};
use crate::dataset::{Dataset, Features};

const USER_AGENT: &str = concat!("igbo-upload/", env!("CARGO_PKG_VERSION"));
const DEFAULT_BRANCH: &str = "main";
const SPLIT: &str = "train";
const ROWS_FILE: &str = "data/train.jsonl";
const INFOS_FILE: &str = "dataset_infos.json";
const CONFIG_NAME: &str = "default";
const LFS_CONTENT_TYPE: &str = "application/vnd.git-lfs+json";
/// Bytes of each file sent to the preupload check
const PREUPLOAD_SAMPLE_BYTES: usize = 512;
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Hub access token
///
/// Passed explicitly to the store that uses it; never stored globally.
#[derive(Clone)]
pub struct HubCredentials {
    token: String,
}

impl HubCredentials {
    pub fn new(token: impl Into<String>) -> Result<Self, StoreError> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(StoreError::Unauthorized("empty access token".to_string()));
        }
        Ok(Self { token })
    }

    fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for HubCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubCredentials")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Identity behind a token
#[derive(Debug, Clone, Deserialize)]
pub struct WhoAmI {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RevisionInfo {
    sha: String,
    #[serde(default)]
    siblings: Vec<Sibling>,
}

#[derive(Debug, Deserialize)]
struct Sibling {
    rfilename: String,
}

/// `dataset_infos.json` entry for one config
#[derive(Debug, Serialize, Deserialize)]
struct DatasetInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    config_name: Option<String>,
    #[serde(default)]
    features: Option<Features>,
    #[serde(default)]
    splits: BTreeMap<String, SplitInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SplitInfo {
    name: String,
    #[serde(default)]
    num_examples: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitResponse {
    #[serde(default)]
    commit_oid: Option<String>,
    #[serde(default)]
    commit_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct PreuploadRequest<'a> {
    files: Vec<PreuploadFile<'a>>,
}

#[derive(Debug, Serialize)]
struct PreuploadFile<'a> {
    path: &'a str,
    sample: String,
    size: usize,
}

#[derive(Debug, Deserialize)]
struct PreuploadResponse {
    files: Vec<PreuploadResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreuploadResult {
    path: String,
    upload_mode: UploadMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum UploadMode {
    Lfs,
    Regular,
}

#[derive(Debug, Serialize)]
struct LfsBatchRequest<'a> {
    operation: &'static str,
    transfers: &'static [&'static str],
    objects: Vec<LfsPointer<'a>>,
    hash_algo: &'static str,
    #[serde(rename = "ref")]
    git_ref: LfsRef,
}

#[derive(Debug, Serialize)]
struct LfsRef {
    name: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct LfsPointer<'a> {
    oid: &'a str,
    size: usize,
}

#[derive(Debug, Deserialize)]
struct LfsBatchResponse {
    objects: Vec<LfsBatchObject>,
}

#[derive(Debug, Deserialize)]
struct LfsBatchObject {
    oid: String,
    #[serde(default)]
    actions: Option<LfsActions>,
    #[serde(default)]
    error: Option<LfsObjectError>,
}

#[derive(Debug, Deserialize)]
struct LfsActions {
    #[serde(default)]
    upload: Option<LfsAction>,
    #[serde(default)]
    verify: Option<LfsAction>,
}

#[derive(Debug, Deserialize)]
struct LfsAction {
    href: String,
    #[serde(default)]
    header: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct LfsObjectError {
    code: u16,
    message: String,
}

/// One NDJSON line of a commit request
#[derive(Debug, Serialize)]
#[serde(tag = "key", content = "value", rename_all = "camelCase")]
enum CommitLine<'a> {
    Header(CommitHeader<'a>),
    File(CommitFile<'a>),
    LfsFile(CommitLfsFile<'a>),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommitHeader<'a> {
    summary: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_commit: Option<&'a str>,
}

/// File committed inline
#[derive(Debug, Serialize)]
struct CommitFile<'a> {
    path: &'a str,
    content: String,
    encoding: &'static str,
}

/// Pointer to an object already uploaded through LFS
#[derive(Debug, Serialize)]
struct CommitLfsFile<'a> {
    path: &'a str,
    algo: &'static str,
    oid: &'a str,
    size: usize,
}

/// A file to add in the next commit
struct PendingFile {
    path: String,
    bytes: Vec<u8>,
    /// sha256 of `bytes`, hex
    oid: String,
}

impl PendingFile {
    fn new(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        let oid = format!("{:x}", Sha256::digest(&bytes));
        Self {
            path: path.into(),
            bytes,
            oid,
        }
    }

    fn commit_line(&self, mode: UploadMode) -> CommitLine<'_> {
        match mode {
            UploadMode::Regular => CommitLine::File(CommitFile {
                path: &self.path,
                content: base64::engine::general_purpose::STANDARD.encode(&self.bytes),
                encoding: "base64",
            }),
            UploadMode::Lfs => CommitLine::LfsFile(CommitLfsFile {
                path: &self.path,
                algo: "sha256",
                oid: &self.oid,
                size: self.bytes.len(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateRepoRequest<'a> {
    #[serde(rename = "type")]
    repo_type: &'static str,
    name: &'a str,
    organization: &'a str,
    private: bool,
}

/// Dataset store backed by a Hub dataset repository
pub struct HubDatasetStore {
    http: reqwest::Client,
    endpoint: String,
    credentials: HubCredentials,
}

impl HubDatasetStore {
    pub fn new(endpoint: &str, credentials: HubCredentials) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Validate the token
    pub async fn whoami(&self) -> Result<WhoAmI, StoreError> {
        let url = format!("{}/api/whoami-v2", self.endpoint);
        let response = self
            .http
            .get(&url)
            .bearer_auth(self.credentials.token())
            .send()
            .await
            .map_err(network)?;
        let response = check_status(response).await?;
        response
            .json::<WhoAmI>()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))
    }

    /// Head commit of the default branch and its file list, `None` if the
    /// repository does not exist
    async fn revision_info(&self, dataset_id: &str) -> Result<Option<RevisionInfo>, StoreError> {
        let url = format!(
            "{}/api/datasets/{}/revision/{}",
            self.endpoint, dataset_id, DEFAULT_BRANCH
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(self.credentials.token())
            .send()
            .await
            .map_err(network)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let info = check_status(response)
            .await?
            .json::<RevisionInfo>()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;
        Ok(Some(info))
    }

    /// File contents at a revision, `None` if the file does not exist
    async fn download(
        &self,
        dataset_id: &str,
        revision: &str,
        path: &str,
    ) -> Result<Option<String>, StoreError> {
        let url = format!(
            "{}/datasets/{}/resolve/{}/{}",
            self.endpoint, dataset_id, revision, path
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(self.credentials.token())
            .send()
            .await
            .map_err(network)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = check_status(response).await?.text().await.map_err(network)?;
        Ok(Some(body))
    }

    /// Schema from `dataset_infos.json`, or the published schema if absent
    async fn load_features(&self, dataset_id: &str, revision: &str) -> Result<Features, StoreError> {
        let Some(raw) = self.download(dataset_id, revision, INFOS_FILE).await? else {
            warn!(dataset_id, "No {} in repository, assuming default schema", INFOS_FILE);
            return Ok(Features::published_schema());
        };

        let mut infos: BTreeMap<String, DatasetInfo> = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Parse(format!("{}: {}", INFOS_FILE, e)))?;
        let info = match infos.remove(CONFIG_NAME) {
            Some(info) => Some(info),
            None => infos.into_values().next(),
        };
        info.and_then(|info| info.features)
            .ok_or_else(|| StoreError::Parse(format!("{} has no features", INFOS_FILE)))
    }

    /// Create the dataset repository. Returns false if it already existed.
    async fn create_repo(&self, dataset_id: &str) -> Result<bool, StoreError> {
        let (owner, name) = split_dataset_id(dataset_id)?;
        let url = format!("{}/api/repos/create", self.endpoint);
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.credentials.token())
            .json(&CreateRepoRequest {
                repo_type: "dataset",
                name,
                organization: owner,
                private: false,
            })
            .send()
            .await
            .map_err(network)?;

        if response.status() == StatusCode::CONFLICT {
            debug!(dataset_id, "Dataset repository already exists");
            return Ok(false);
        }

        check_status(response).await?;
        info!(dataset_id, "Created dataset repository");
        Ok(true)
    }

    /// Ask the Hub which files must go through LFS
    async fn upload_modes(
        &self,
        dataset_id: &str,
        revision: &str,
        files: &[PendingFile],
    ) -> Result<HashMap<String, UploadMode>, StoreError> {
        let request = PreuploadRequest {
            files: files
                .iter()
                .map(|file| PreuploadFile {
                    path: &file.path,
                    sample: base64::engine::general_purpose::STANDARD
                        .encode(&file.bytes[..file.bytes.len().min(PREUPLOAD_SAMPLE_BYTES)]),
                    size: file.bytes.len(),
                })
                .collect(),
        };

        let url = format!(
            "{}/api/datasets/{}/preupload/{}",
            self.endpoint, dataset_id, revision
        );
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.credentials.token())
            .json(&request)
            .send()
            .await
            .map_err(network)?;

        let modes = check_status(response)
            .await?
            .json::<PreuploadResponse>()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;
        Ok(modes
            .files
            .into_iter()
            .map(|file| (file.path, file.upload_mode))
            .collect())
    }

    /// Upload file contents to LFS storage ahead of the commit
    ///
    /// Objects the Hub already has come back without actions and are skipped.
    async fn upload_lfs(&self, dataset_id: &str, files: &[&PendingFile]) -> Result<(), StoreError> {
        if files.is_empty() {
            return Ok(());
        }

        let request = LfsBatchRequest {
            operation: "upload",
            transfers: &["basic"],
            objects: files
                .iter()
                .map(|file| LfsPointer {
                    oid: &file.oid,
                    size: file.bytes.len(),
                })
                .collect(),
            hash_algo: "sha256",
            git_ref: LfsRef {
                name: DEFAULT_BRANCH,
            },
        };

        let url = format!(
            "{}/datasets/{}.git/info/lfs/objects/batch",
            self.endpoint, dataset_id
        );
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.credentials.token())
            .header(reqwest::header::ACCEPT, LFS_CONTENT_TYPE)
            .header(reqwest::header::CONTENT_TYPE, LFS_CONTENT_TYPE)
            .body(serde_json::to_vec(&request).map_err(|e| StoreError::Parse(e.to_string()))?)
            .send()
            .await
            .map_err(network)?;
        let batch = check_status(response)
            .await?
            .json::<LfsBatchResponse>()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;

        for object in batch.objects {
            if let Some(error) = object.error {
                return Err(StoreError::Api(error.code, error.message));
            }
            let Some(actions) = object.actions else {
                debug!(oid = %object.oid, "LFS object already stored");
                continue;
            };
            let file = files
                .iter()
                .find(|file| file.oid == object.oid)
                .ok_or_else(|| StoreError::Parse(format!("unexpected LFS object {}", object.oid)))?;

            if let Some(upload) = actions.upload {
                let mut request = self.http.put(&upload.href).body(file.bytes.clone());
                for (name, value) in &upload.header {
                    request = request.header(name.as_str(), value.as_str());
                }
                check_status(request.send().await.map_err(network)?).await?;
                debug!(path = %file.path, bytes = file.bytes.len(), "Uploaded LFS object");
            }

            if let Some(verify) = actions.verify {
                let mut request = self
                    .http
                    .post(&verify.href)
                    .bearer_auth(self.credentials.token())
                    .json(&LfsPointer {
                        oid: &file.oid,
                        size: file.bytes.len(),
                    });
                for (name, value) in &verify.header {
                    request = request.header(name.as_str(), value.as_str());
                }
                check_status(request.send().await.map_err(network)?).await?;
            }
        }

        Ok(())
    }

    async fn commit(
        &self,
        dataset_id: &str,
        summary: &str,
        parent_commit: Option<&str>,
        files: &[PendingFile],
        modes: &HashMap<String, UploadMode>,
    ) -> Result<CommitResponse, StoreError> {
        let mut body = String::new();
        let header = CommitLine::Header(CommitHeader {
            summary,
            description: "",
            parent_commit,
        });
        push_line(&mut body, &header)?;
        for file in files {
            let mode = modes.get(&file.path).copied().unwrap_or(UploadMode::Regular);
            push_line(&mut body, &file.commit_line(mode))?;
        }

        let url = format!(
            "{}/api/datasets/{}/commit/{}",
            self.endpoint, dataset_id, DEFAULT_BRANCH
        );
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.credentials.token())
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(network)?;

        check_status(response)
            .await?
            .json::<CommitResponse>()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))
    }
}

#[async_trait]
impl DatasetStore for HubDatasetStore {
    async fn fetch(&self, dataset_id: &str) -> Result<FetchOutcome, StoreError> {
        split_dataset_id(dataset_id)?;

        let Some(info) = self.revision_info(dataset_id).await? else {
            return Ok(FetchOutcome::Missing { revision: None });
        };
        let revision = info.sha;

        let shards: Vec<&str> = info
            .siblings
            .iter()
            .map(|s| s.rfilename.as_str())
            .filter(|name| is_foreign_split_file(name))
            .collect();
        if !shards.is_empty() {
            return Err(StoreError::UnsupportedLayout(format!(
                "the {} split is stored as {}; only {} can be appended to",
                SPLIT,
                shards.join(", "),
                ROWS_FILE
            )));
        }

        let Some(rows) = self.download(dataset_id, &revision, ROWS_FILE).await? else {
            return Ok(FetchOutcome::Missing {
                revision: Some(revision),
            });
        };

        let features = self.load_features(dataset_id, &revision).await?;
        let dataset = Dataset::from_jsonl(features, &rows)?;
        debug!(dataset_id, %revision, records = dataset.len(), "Fetched dataset");
        Ok(FetchOutcome::Found(RemoteSnapshot { dataset, revision }))
    }

    async fn publish(
        &self,
        dataset_id: &str,
        dataset: &Dataset,
        precondition: &Precondition,
    ) -> Result<PublishReceipt, StoreError> {
        split_dataset_id(dataset_id)?;

        let parent_commit = match precondition {
            Precondition::Revision(revision) => Some(revision.as_str()),
            Precondition::Absent => {
                if !self.create_repo(dataset_id).await? {
                    // Someone created it after our fetch
                    return Err(StoreError::Conflict);
                }
                None
            }
            Precondition::Unconditional => {
                self.create_repo(dataset_id).await?;
                None
            }
        };

        let mut files = Vec::new();
        let mut records = Vec::with_capacity(dataset.len());
        let mut stored_audio = Vec::new();
        for record in dataset.records() {
            match record.pending_audio() {
                Some(path) => {
                    let bytes = tokio::fs::read(path).await?;
                    let repo_path = new_audio_path();
                    files.push(PendingFile::new(repo_path.clone(), bytes));
                    records.push(record.with_stored_audio(repo_path.clone()));
                    stored_audio.push(repo_path);
                }
                None => records.push(record.clone()),
            }
        }

        let published = dataset.with_records(records);
        files.push(PendingFile::new(ROWS_FILE, published.to_jsonl()?.into_bytes()));
        files.push(PendingFile::new(INFOS_FILE, dataset_infos(&published)?));

        let modes = self
            .upload_modes(dataset_id, parent_commit.unwrap_or(DEFAULT_BRANCH), &files)
            .await?;
        let lfs: Vec<&PendingFile> = files
            .iter()
            .filter(|file| modes.get(&file.path) == Some(&UploadMode::Lfs))
            .collect();
        self.upload_lfs(dataset_id, &lfs).await?;

        let summary = format!(
            "Add {} clip(s), {} records total",
            stored_audio.len(),
            published.len()
        );
        let response = self
            .commit(dataset_id, &summary, parent_commit, &files, &modes)
            .await?;

        let revision = response.commit_oid.unwrap_or_default();
        info!(
            dataset_id,
            %revision,
            records = published.len(),
            lfs_files = lfs.len(),
            "Published dataset"
        );

        Ok(PublishReceipt {
            revision,
            record_count: published.len(),
            stored_audio,
            commit_url: response.commit_url,
        })
    }
}

/// `dataset_infos.json` describing `dataset` as the `default` config
fn dataset_infos(dataset: &Dataset) -> Result<Vec<u8>, StoreError> {
    let mut splits = BTreeMap::new();
    splits.insert(
        SPLIT.to_string(),
        SplitInfo {
            name: SPLIT.to_string(),
            num_examples: dataset.len(),
        },
    );
    let mut infos = BTreeMap::new();
    infos.insert(
        CONFIG_NAME.to_string(),
        DatasetInfo {
            config_name: Some(CONFIG_NAME.to_string()),
            features: Some(dataset.features().clone()),
            splits,
        },
    );
    serde_json::to_vec_pretty(&infos).map_err(|e| StoreError::Parse(e.to_string()))
}

/// Data file for the split other than the rows file this store writes,
/// e.g. `data/train-00000-of-00001.parquet`
fn is_foreign_split_file(path: &str) -> bool {
    if path == ROWS_FILE {
        return false;
    }
    path.strip_prefix("data/")
        .and_then(|rest| rest.strip_prefix(SPLIT))
        .map(|rest| rest.starts_with(['-', '.', '_', '/']))
        .unwrap_or(false)
}

fn network(e: reqwest::Error) -> StoreError {
    StoreError::Network(e.to_string())
}

fn push_line<T: Serialize>(body: &mut String, line: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string(line).map_err(|e| StoreError::Parse(e.to_string()))?;
    body.push_str(&json);
    body.push('\n');
    Ok(())
}

/// Map non-success statuses to store errors
///
/// 409/412 on a commit mean the branch moved past `parentCommit`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StoreError::Unauthorized(format!("{} {}", status.as_u16(), body))
        }
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => StoreError::Conflict,
        _ => StoreError::Api(status.as_u16(), body),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DatasetRecord, RecordRow, AUDIO_SAMPLING_RATE};

    #[test]
    fn test_credentials_reject_blank_token() {
        assert!(matches!(
            HubCredentials::new("   "),
            Err(StoreError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_credentials_debug_hides_token() {
        let creds = HubCredentials::new("hf_secret").unwrap();
        let printed = format!("{:?}", creds);
        assert!(!printed.contains("hf_secret"));
    }

    #[test]
    fn test_commit_lines_shape() {
        let header = CommitLine::Header(CommitHeader {
            summary: "Add 1 clip(s)",
            description: "",
            parent_commit: Some("abc123"),
        });
        let json = serde_json::to_value(&header).unwrap();
        assert_eq!(json["key"], "header");
        assert_eq!(json["value"]["parentCommit"], "abc123");

        let rows = PendingFile::new("data/train.jsonl", b"{}\n".to_vec());
        let json = serde_json::to_value(rows.commit_line(UploadMode::Regular)).unwrap();
        assert_eq!(json["key"], "file");
        assert_eq!(json["value"]["path"], "data/train.jsonl");
        assert_eq!(json["value"]["encoding"], "base64");
        assert_eq!(json["value"]["content"], "e30K");
    }

    #[test]
    fn test_lfs_line_points_at_sha256() {
        let clip = PendingFile::new("audio/a.wav", b"RIFF".to_vec());
        let json = serde_json::to_value(clip.commit_line(UploadMode::Lfs)).unwrap();

        assert_eq!(json["key"], "lfsFile");
        assert_eq!(json["value"]["path"], "audio/a.wav");
        assert_eq!(json["value"]["algo"], "sha256");
        assert_eq!(json["value"]["size"], 4);
        assert_eq!(json["value"]["oid"], format!("{:x}", Sha256::digest(b"RIFF")));
        assert!(json["value"].get("content").is_none());
    }

    #[test]
    fn test_header_without_parent_omits_field() {
        let header = CommitLine::Header(CommitHeader {
            summary: "s",
            description: "",
            parent_commit: None,
        });
        let json = serde_json::to_value(&header).unwrap();
        assert!(json["value"].get("parentCommit").is_none());
    }

    #[test]
    fn test_dataset_infos_carry_audio_feature() {
        let dataset = Dataset::from_records(
            Features::published_schema(),
            vec![DatasetRecord::from_row(RecordRow {
                text: "otu".to_string(),
                audio_file_path: "audio/a.wav".to_string(),
                gender: None,
                age: None,
                dialect: None,
            })],
        );

        let json: serde_json::Value = serde_json::from_slice(&dataset_infos(&dataset).unwrap()).unwrap();
        let info = &json["default"];
        assert_eq!(info["features"]["audio_file_path"]["_type"], "Audio");
        assert_eq!(info["features"]["audio_file_path"]["sampling_rate"], AUDIO_SAMPLING_RATE);
        assert_eq!(info["splits"]["train"]["num_examples"], 1);

        let parsed: BTreeMap<String, DatasetInfo> = serde_json::from_value(json).unwrap();
        assert_eq!(parsed["default"].features.as_ref(), Some(&Features::published_schema()));
    }

    #[test]
    fn test_foreign_split_files() {
        assert!(is_foreign_split_file("data/train-00000-of-00001.parquet"));
        assert!(is_foreign_split_file("data/train.parquet"));
        assert!(is_foreign_split_file("data/train/part-0.arrow"));
        assert!(!is_foreign_split_file("data/train.jsonl"));
        assert!(!is_foreign_split_file("data/training_notes.md"));
        assert!(!is_foreign_split_file("audio/train-1.wav"));
        assert!(!is_foreign_split_file("README.md"));
    }
}
