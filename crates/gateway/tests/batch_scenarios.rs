//! End-to-end batch behavior against an in-memory uploader.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use mediadrop_core::{ErrorKind, MediaFile, ProviderKind, UploadRequest, UploadResult};
use mediadrop_gateway::{
    EditorBridge, EditorError, EditorSink, ErrorReporter, Insertion, MediaBus, MediaEvent,
    MediaEventKind, Notifier, PasteBatch, PastedFile, Settings, SettingsStore, UploadService,
    upload_batch,
};
use mediadrop_provider::{ErrorClassifier, UploadError, Uploader};
use parking_lot::Mutex;

struct CountingUploader {
    configured: bool,
    failing: HashSet<String>,
    uploads: AtomicUsize,
}

impl CountingUploader {
    fn new(configured: bool) -> Self {
        Self {
            configured,
            failing: HashSet::new(),
            uploads: AtomicUsize::new(0),
        }
    }

    fn failing_on(mut self, name: &str) -> Self {
        self.failing.insert(name.to_owned());
        self
    }

    fn calls(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

impl Uploader for CountingUploader {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "counting"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Bunny
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn upload(&self, request: UploadRequest) -> Result<UploadResult, UploadError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        let name = request.file().name.clone();
        if self.failing.contains(&name) {
            tokio::time::sleep(Duration::from_millis(5)).await;
            return Err(UploadError::Connection("connection reset by peer".into()));
        }
        Ok(UploadResult::new(self.get_url(&name, None), name))
    }

    async fn delete(&self, _public_id: &str) -> Result<(), UploadError> {
        Ok(())
    }

    fn get_url(&self, public_id: &str, _transformation: Option<&str>) -> String {
        format!("https://cdn.test/{public_id}")
    }
}

fn image(name: &str) -> PastedFile {
    PastedFile::new(MediaFile::new(name, "image/png", b"\x89PNG".to_vec()))
}

fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<MediaEvent>) -> Vec<MediaEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn filters_non_media_and_ignored_before_uploading() {
    let bus = MediaBus::new();
    let (_ok, mut uploaded) = bus.subscribe_channel(MediaEventKind::MediaUploaded);
    let (_err, mut failed) = bus.subscribe_channel(MediaEventKind::MediaUploadError);
    let uploader = CountingUploader::new(true);

    let batch = PasteBatch::new(vec![
        PastedFile::new(MediaFile::new("notes.txt", "text/plain", b"hi".to_vec())),
        image("secret.png").in_document("Private/diary.md"),
        image("cat.png").in_document("Blog/post.md"),
    ]);
    let ignored = vec!["Private".to_owned()];

    let report = upload_batch(&uploader, batch, &ignored, &ErrorClassifier::new(), &bus).await;

    assert_eq!(uploader.calls(), 1);
    assert_eq!(report.uploaded, 1);
    assert_eq!(report.skipped_non_media, 1);
    assert_eq!(report.skipped_ignored, 1);

    let events = drain(&mut uploaded);
    assert_eq!(events.len(), 1);
    let MediaEvent::MediaUploaded(media) = &events[0] else {
        panic!("expected an upload event");
    };
    assert_eq!(media.file_name, "cat.png");
    assert_eq!(media.url, "https://cdn.test/cat.png");
    assert_eq!(media.document_path.as_deref(), Some("Blog/post.md"));
    assert!(drain(&mut failed).is_empty());
}

#[tokio::test]
async fn unconfigured_provider_short_circuits_batch() {
    let bus = MediaBus::new();
    let (_ok, mut uploaded) = bus.subscribe_channel(MediaEventKind::MediaUploaded);
    let (_err, mut failed) = bus.subscribe_channel(MediaEventKind::MediaUploadError);
    let uploader = CountingUploader::new(false);

    let batch = PasteBatch::new(vec![image("a.png"), image("b.png")]);
    let report = upload_batch(&uploader, batch, &[], &ErrorClassifier::new(), &bus).await;

    assert_eq!(uploader.calls(), 0);
    assert!(report.not_configured);
    assert!(drain(&mut uploaded).is_empty());

    let events = drain(&mut failed);
    assert_eq!(events.len(), 1);
    let MediaEvent::MediaUploadError(failure) = &events[0] else {
        panic!("expected an error event");
    };
    assert_eq!(failure.file_name, "unknown");
    assert_eq!(failure.error.kind, ErrorKind::Config);
}

#[tokio::test]
async fn filtered_out_batch_skips_configuration_check() {
    let bus = MediaBus::new();
    let (_err, mut failed) = bus.subscribe_channel(MediaEventKind::MediaUploadError);
    let uploader = CountingUploader::new(false);

    let batch = PasteBatch::new(vec![PastedFile::new(MediaFile::new(
        "notes.txt",
        "text/plain",
        b"hi".to_vec(),
    ))]);
    let report = upload_batch(&uploader, batch, &[], &ErrorClassifier::new(), &bus).await;

    assert!(!report.not_configured);
    assert!(drain(&mut failed).is_empty());
}

#[tokio::test]
async fn one_failure_does_not_suppress_siblings() {
    let bus = MediaBus::new();
    let (_ok, mut uploaded) = bus.subscribe_channel(MediaEventKind::MediaUploaded);
    let (_err, mut failed) = bus.subscribe_channel(MediaEventKind::MediaUploadError);
    let uploader = CountingUploader::new(true).failing_on("bad.png");

    let batch = PasteBatch::new(vec![image("good.png"), image("bad.png")]);
    let report = upload_batch(&uploader, batch, &[], &ErrorClassifier::new(), &bus).await;

    assert_eq!(uploader.calls(), 2);
    assert_eq!((report.uploaded, report.failed), (1, 1));

    let successes = drain(&mut uploaded);
    assert_eq!(successes.len(), 1);
    let MediaEvent::MediaUploaded(media) = &successes[0] else {
        panic!("expected an upload event");
    };
    assert_eq!(media.file_name, "good.png");

    let failures = drain(&mut failed);
    assert_eq!(failures.len(), 1);
    let MediaEvent::MediaUploadError(failure) = &failures[0] else {
        panic!("expected an error event");
    };
    assert_eq!(failure.file_name, "bad.png");
    assert_eq!(failure.error.kind, ErrorKind::Network);
}

#[tokio::test]
async fn every_failing_file_gets_its_own_event() {
    let bus = MediaBus::new();
    let (_err, mut failed) = bus.subscribe_channel(MediaEventKind::MediaUploadError);
    let uploader = CountingUploader::new(true)
        .failing_on("a.png")
        .failing_on("b.png");

    let batch = PasteBatch::new(vec![image("a.png"), image("b.png")]);
    let report = upload_batch(&uploader, batch, &[], &ErrorClassifier::new(), &bus).await;

    assert_eq!(report.failed, 2);
    let mut names: Vec<String> = drain(&mut failed)
        .into_iter()
        .filter_map(|event| match event {
            MediaEvent::MediaUploadError(failure) => Some(failure.file_name),
            _ => None,
        })
        .collect();
    names.sort();
    assert_eq!(names, vec!["a.png", "b.png"]);
}

struct RecordingNotifier(Mutex<Vec<String>>);

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.0.lock().push(message.to_owned());
    }
}

#[tokio::test]
async fn reporter_notifies_once_per_error() {
    let bus = MediaBus::new();
    let notifier = Arc::new(RecordingNotifier(Mutex::new(Vec::new())));
    let _reporter = ErrorReporter::attach(&bus, notifier.clone(), ErrorClassifier::new());
    let uploader = CountingUploader::new(false);

    upload_batch(
        &uploader,
        PasteBatch::new(vec![image("a.png"), image("b.png")]),
        &[],
        &ErrorClassifier::new(),
        &bus,
    )
    .await;

    let messages = notifier.0.lock().clone();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].ends_with("Check your provider settings."));
}

struct RejectingSink;

impl EditorSink for RejectingSink {
    fn insert(&self, _insertion: &Insertion) -> Result<(), EditorError> {
        Err(EditorError("document is read-only".into()))
    }
}

struct RecordingSink(Mutex<Vec<Insertion>>);

impl EditorSink for RecordingSink {
    fn insert(&self, insertion: &Insertion) -> Result<(), EditorError> {
        self.0.lock().push(insertion.clone());
        Ok(())
    }
}

#[tokio::test]
async fn uploaded_files_reach_the_editor() {
    let bus = MediaBus::new();
    let sink = Arc::new(RecordingSink(Mutex::new(Vec::new())));
    let _bridge = EditorBridge::attach(&bus, sink.clone(), ErrorClassifier::new());
    let uploader = CountingUploader::new(true);

    upload_batch(
        &uploader,
        PasteBatch::new(vec![image("cat.png")]),
        &[],
        &ErrorClassifier::new(),
        &bus,
    )
    .await;

    let inserted = sink.0.lock().clone();
    assert_eq!(inserted.len(), 1);
    assert_eq!(inserted[0].markup, "![cat.png](https://cdn.test/cat.png)");
}

#[tokio::test]
async fn editor_failure_becomes_editor_error() {
    let bus = MediaBus::new();
    let (_err, mut failed) = bus.subscribe_channel(MediaEventKind::MediaUploadError);
    let _bridge = EditorBridge::attach(&bus, Arc::new(RejectingSink), ErrorClassifier::new());
    let uploader = CountingUploader::new(true);

    upload_batch(
        &uploader,
        PasteBatch::new(vec![image("cat.png")]),
        &[],
        &ErrorClassifier::new(),
        &bus,
    )
    .await;

    let failures = drain(&mut failed);
    assert_eq!(failures.len(), 1);
    let MediaEvent::MediaUploadError(failure) = &failures[0] else {
        panic!("expected an error event");
    };
    assert_eq!(failure.file_name, "cat.png");
    assert_eq!(failure.error.kind, ErrorKind::Editor);
    assert_eq!(
        failure.error.original_error.as_deref(),
        Some("document is read-only")
    );
}

#[tokio::test]
async fn pasted_batch_flows_through_attached_service() {
    let bus = MediaBus::new();
    let store = Arc::new(SettingsStore::new(
        Settings::default().with_provider("cloudinary"),
        bus.clone(),
    ));
    let service = Arc::new(UploadService::new(store, ErrorClassifier::new()));
    let _subs = service.attach();
    let (_err, mut failed) = bus.subscribe_channel(MediaEventKind::MediaUploadError);

    bus.publish(&MediaEvent::PasteDetected(PasteBatch::new(vec![image("cat.png")])));

    let event = tokio::time::timeout(Duration::from_secs(5), failed.recv())
        .await
        .expect("error event in time")
        .expect("channel open");
    let MediaEvent::MediaUploadError(failure) = event else {
        panic!("expected an error event");
    };
    assert_eq!(failure.file_name, "unknown");
    assert_eq!(failure.error.kind, ErrorKind::Config);
}
