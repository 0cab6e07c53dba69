use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bifrost_storage::{
    BifrostError, BifrostResult, BridgeConfig, ErrorCode, File, MultiFile, Options, Provider,
    RainbowBridge, UploadRequest, UploadedFile,
};
use serde_json::Value;

/// In-memory bridge recording the options each upload saw.
struct RecordingBridge {
    config: BridgeConfig,
    connected: bool,
    seen: Mutex<Vec<(String, Options)>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    delay: Duration,
}

impl RecordingBridge {
    fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            connected: true,
            seen: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            delay: Duration::from_millis(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn seen_options(&self, name: &str) -> Options {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, o)| o.clone())
            .unwrap()
    }
}

#[async_trait]
impl RainbowBridge for RecordingBridge {
    async fn upload_file(&self, file: File) -> BifrostResult<UploadedFile> {
        file.validate()?;
        let name = file.target_name().unwrap_or_default();

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        // later files finish first so ordering is not accidental
        let delay = self.delay / (name.len() as u32).max(1);
        tokio::time::sleep(delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.seen
            .lock()
            .unwrap()
            .push((name.clone(), file.options.clone()));

        if name.starts_with("bad") {
            return Err(BifrostError::file_operation(format!("rejected {}", name)));
        }

        Ok(UploadedFile {
            url: format!("mem://{}", name),
            preview: format!("mem://{}", name),
            bucket: "mem".to_string(),
            path: file.path.clone(),
            size: 1,
            name,
            provider_object: Value::Null,
            ..Default::default()
        })
    }

    async fn delete_file(&self, _file: &File) -> BifrostResult<()> {
        Ok(())
    }

    async fn disconnect(&mut self) -> BifrostResult<()> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn config(&self) -> &BridgeConfig {
        &self.config
    }

    fn provider(&self) -> Provider {
        Provider::SimpleStorageService
    }
}

fn files(names: &[&str]) -> Vec<File> {
    names
        .iter()
        .map(|n| File::from_path(format!("/data/{}", n)))
        .collect()
}

#[tokio::test]
async fn results_follow_input_order_and_isolate_failures() {
    let bridge = RecordingBridge::new(BridgeConfig::new("s3").with_debug(true));
    let multi = MultiFile::new(files(&["a.txt", "bad.txt", "c.txt", "bad2.txt"]));

    let result = bridge.upload_multi_file(multi).await.unwrap();

    let names: Vec<&str> = result.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["a.txt", "bad.txt", "c.txt", "bad2.txt"]);
    assert!(result.files[0].is_ok());
    assert!(result.files[2].is_ok());

    let failed = &result.files[1];
    assert_eq!(failed.path.to_str(), Some("/data/bad.txt"));
    assert_eq!(
        failed.error.as_ref().unwrap().code(),
        ErrorCode::FileOperationFailed
    );
    assert_eq!(result.failed_count(), 2);

    let err = result.error().unwrap();
    assert_eq!(err.code(), ErrorCode::IncompleteMultiFileUpload);
    assert!(result.into_result().is_err());
}

#[tokio::test]
async fn global_options_never_override_file_options() {
    let bridge = RecordingBridge::new(BridgeConfig::new("s3"));
    let mut list = files(&["a.txt", "b.txt"]);
    list[0].options.insert("acl".to_string(), "private".into());

    let multi = MultiFile::new(list)
        .with_global_option("acl", "public-read")
        .with_global_option("content-type", "text/plain");

    let result = bridge.upload_multi_file(multi).await.unwrap();
    assert!(result.error().is_none());

    let first = bridge.seen_options("a.txt");
    assert_eq!(first["acl"], "private");
    assert_eq!(first["content-type"], "text/plain");

    let second = bridge.seen_options("b.txt");
    assert_eq!(second["acl"], "public-read");
}

#[tokio::test]
async fn async_mode_bounds_concurrency_and_keeps_order() {
    let config = BridgeConfig::new("s3").with_async(true, 2);
    let bridge = RecordingBridge::new(config).with_delay(Duration::from_millis(200));
    let names = ["a", "bb", "ccc", "dddd", "eeeee", "ffffff"];

    let result = bridge.upload_multi_file(MultiFile::new(files(&names))).await.unwrap();

    let got: Vec<&str> = result.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(got, names);
    let peak = bridge.peak.load(Ordering::SeqCst);
    assert!(peak <= 2, "peak concurrency was {}", peak);
    assert!(peak >= 2, "uploads never overlapped");
}

#[tokio::test]
async fn sequential_mode_runs_one_at_a_time() {
    let bridge = RecordingBridge::new(BridgeConfig::new("s3")).with_delay(Duration::from_millis(20));

    bridge
        .upload_multi_file(MultiFile::new(files(&["a", "b", "c"])))
        .await
        .unwrap();

    assert_eq!(bridge.peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn invalid_batches_fail_fast() {
    let bridge = RecordingBridge::new(BridgeConfig::new("s3"));

    let err = bridge
        .upload_multi_file(MultiFile::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidParameters);

    let multi = MultiFile::new(vec![File::from_path("/data/a.txt"), File::default()]);
    let err = bridge.upload_multi_file(multi).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidParameters);
    assert!(bridge.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn disconnected_bridge_rejects_batches() {
    let mut bridge = RecordingBridge::new(BridgeConfig::new("s3"));
    bridge.disconnect().await.unwrap();
    bridge.disconnect().await.unwrap();
    assert!(!bridge.is_connected());

    let err = bridge
        .upload_multi_file(MultiFile::new(files(&["a.txt"])))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ClientError);
    assert!(bridge.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn upload_request_dispatches_single_and_batch() {
    let bridge = RecordingBridge::new(BridgeConfig::new("s3"));

    let single = bridge
        .upload(UploadRequest::from(File::from_path("/data/one.txt")))
        .await
        .unwrap();
    assert_eq!(single.len(), 1);

    let err = bridge
        .upload(UploadRequest::from(File::from_path("/data/bad.txt")))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::FileOperationFailed);

    let batch = bridge
        .upload(UploadRequest::from(MultiFile::new(files(&["x", "bad"]))))
        .await
        .unwrap();
    assert_eq!(batch.len(), 2);
    assert_eq!(batch.failed_count(), 1);
}

#[tokio::test]
async fn folder_upload_is_a_no_op() {
    let bridge = RecordingBridge::new(BridgeConfig::new("s3"));
    let uploaded = bridge
        .upload_folder(std::path::Path::new("/data"))
        .await
        .unwrap();
    assert!(uploaded.is_empty());
}
