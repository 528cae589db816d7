use bos_wagon::bos;
use bos_wagon::bos::object::ObjectMeta;
use bos_wagon::config::WagonConfig;
use bos_wagon::memory::{MemoryConnector, MemoryStorage};
use bos_wagon::storage::{ObjectPage, ObjectReader, ObjectStorage, PutRequest, StorageConnector};
use bos_wagon::wagon::{
    AuthenticationInfo, BosWagon, Error, Repository, SessionEvent, SessionEventType,
    SessionListener, TransferEvent, TransferEventType, TransferListener,
};
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use time::{Duration, OffsetDateTime};
use tokio::io::{AsyncRead, ReadBuf};

const REPO_URL: &str = "bos://bj.bcebos.com/bucket/repo/base";

fn auth() -> AuthenticationInfo {
    AuthenticationInfo::new("ak", "sk")
}

fn connected_wagon(storage: &MemoryStorage) -> BosWagon {
    let mut wagon =
        BosWagon::with_connector(WagonConfig::default(), MemoryConnector::new(storage.clone()));
    wagon
        .connect(Repository::new("test", REPO_URL).unwrap(), &auth())
        .unwrap();
    wagon
}

#[derive(Default)]
struct TransferRecorder {
    events: Mutex<Vec<TransferEventType>>,
    bytes: Mutex<usize>,
}

impl TransferListener for TransferRecorder {
    fn transfer_initiated(&self, event: &TransferEvent<'_>) {
        self.events.lock().unwrap().push(event.event_type);
    }
    fn transfer_started(&self, event: &TransferEvent<'_>) {
        self.events.lock().unwrap().push(event.event_type);
    }
    fn transfer_progress(&self, _event: &TransferEvent<'_>, buffer: &[u8]) {
        *self.bytes.lock().unwrap() += buffer.len();
    }
    fn transfer_completed(&self, event: &TransferEvent<'_>) {
        self.events.lock().unwrap().push(event.event_type);
    }
    fn transfer_error(&self, event: &TransferEvent<'_>) {
        assert!(event.error.is_some());
        self.events.lock().unwrap().push(event.event_type);
    }
}

#[derive(Default)]
struct SessionRecorder {
    events: Mutex<Vec<SessionEventType>>,
}

impl SessionRecorder {
    fn push(&self, event: &SessionEvent) {
        self.events.lock().unwrap().push(event.event_type);
    }
}

impl SessionListener for SessionRecorder {
    fn session_opening(&self, event: &SessionEvent) {
        self.push(event);
    }
    fn session_opened(&self, event: &SessionEvent) {
        self.push(event);
    }
    fn session_logged_in(&self, event: &SessionEvent) {
        self.push(event);
    }
    fn session_disconnecting(&self, event: &SessionEvent) {
        self.push(event);
    }
    fn session_logged_off(&self, event: &SessionEvent) {
        self.push(event);
    }
    fn session_disconnected(&self, event: &SessionEvent) {
        self.push(event);
    }
}

#[tokio::test]
async fn put_get_round_trip_with_events() {
    let storage = MemoryStorage::default();
    let mut wagon = connected_wagon(&storage);
    let recorder = Arc::new(TransferRecorder::default());
    let listener: Arc<dyn TransferListener> = recorder.clone();
    wagon.add_transfer_listener(listener.clone());
    assert!(wagon.has_transfer_listener(&listener));

    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("lib-1.0.jar");
    let data = b"not really a jar".repeat(1000);
    std::fs::write(&source, &data).unwrap();

    assert!(!wagon.resource_exists("org/acme/lib-1.0.jar").await);
    wagon.put(&source, "org/acme/lib-1.0.jar").await.unwrap();
    assert!(wagon.resource_exists("org/acme/lib-1.0.jar").await);
    assert_eq!(
        storage.object("repo/base/org/acme/lib-1.0.jar").unwrap(),
        data
    );

    let destination = dir.path().join("download/lib-1.0.jar");
    wagon
        .get("/org/acme/lib-1.0.jar", &destination)
        .await
        .unwrap();
    assert_eq!(std::fs::read(&destination).unwrap(), data);

    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec![
            TransferEventType::Initiated,
            TransferEventType::Started,
            TransferEventType::Completed,
            TransferEventType::Initiated,
            TransferEventType::Started,
            TransferEventType::Completed,
        ]
    );
    assert_eq!(*recorder.bytes.lock().unwrap(), data.len() * 2);

    wagon.remove_transfer_listener(&listener);
    assert!(!wagon.has_transfer_listener(&listener));
}

#[tokio::test]
async fn get_missing_resource_transfers_nothing() {
    let storage = MemoryStorage::default();
    let mut wagon = connected_wagon(&storage);
    let recorder = Arc::new(TransferRecorder::default());
    wagon.add_transfer_listener(recorder.clone());

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("missing.jar");
    wagon.get("missing.jar", &destination).await.unwrap();

    assert!(!destination.exists());
    assert_eq!(*recorder.bytes.lock().unwrap(), 0);
    assert_eq!(
        recorder.events.lock().unwrap().last(),
        Some(&TransferEventType::Completed)
    );
}

#[tokio::test]
async fn put_failure_is_reported_and_returned() {
    let storage = MemoryStorage::default();
    let mut wagon = connected_wagon(&storage);
    let recorder = Arc::new(TransferRecorder::default());
    wagon.add_transfer_listener(recorder.clone());

    let err = wagon
        .put(Path::new("/no/such/lib.jar"), "lib.jar")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TransferFailed { .. }));
    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec![
            TransferEventType::Initiated,
            TransferEventType::Started,
            TransferEventType::Error,
        ]
    );
}

#[tokio::test]
async fn get_if_newer_compares_timestamps() {
    let storage = MemoryStorage::default();
    let modified = OffsetDateTime::now_utc() - Duration::hours(1);
    storage
        .insert("repo/base/a/maven-metadata.xml", &b"<metadata/>"[..], modified)
        .unwrap();
    let wagon = connected_wagon(&storage);
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("maven-metadata.xml");

    assert!(
        !wagon
            .get_if_newer("a/maven-metadata.xml", &destination, modified)
            .await
            .unwrap()
    );
    assert!(!destination.exists());

    assert!(
        wagon
            .get_if_newer(
                "a/maven-metadata.xml",
                &destination,
                modified - Duration::seconds(1)
            )
            .await
            .unwrap()
    );
    assert_eq!(std::fs::read(&destination).unwrap(), b"<metadata/>");

    assert!(matches!(
        wagon
            .get_if_newer("a/other.xml", &destination, modified)
            .await,
        Err(Error::ResourceDoesNotExist(_))
    ));
}

#[tokio::test]
async fn put_directory_to_repository_root() {
    let storage = MemoryStorage::default();
    let wagon = connected_wagon(&storage);

    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("org/acme/1.0")).unwrap();
    std::fs::write(dir.path().join("org/acme/1.0/acme-1.0.jar"), b"jar").unwrap();
    std::fs::write(dir.path().join("org/acme/1.0/acme-1.0.pom"), b"pom").unwrap();
    std::fs::write(dir.path().join("index.txt"), b"index").unwrap();

    wagon.put_directory(dir.path(), ".").await.unwrap();
    assert_eq!(
        storage.keys(),
        vec![
            "repo/base/index.txt",
            "repo/base/org/acme/1.0/acme-1.0.jar",
            "repo/base/org/acme/1.0/acme-1.0.pom",
        ]
    );

    wagon.put_directory(dir.path(), "./mirror").await.unwrap();
    wagon.put_directory(dir.path(), "copy/").await.unwrap();
    let keys = storage.keys();
    assert!(keys.contains(&"repo/base/mirror/index.txt".to_owned()));
    assert!(keys.contains(&"repo/base/copy/org/acme/1.0/acme-1.0.pom".to_owned()));
    assert_eq!(keys.len(), 9);
}

#[tokio::test]
async fn put_directory_requires_a_directory() {
    let wagon = connected_wagon(&MemoryStorage::default());
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("file.txt");
    std::fs::write(&file, b"x").unwrap();

    assert!(matches!(
        wagon.put_directory(&file, ".").await,
        Err(Error::ResourceDoesNotExist(_))
    ));
    assert!(matches!(
        wagon.put_directory(&dir.path().join("nope"), ".").await,
        Err(Error::ResourceDoesNotExist(_))
    ));
}

#[tokio::test]
async fn get_file_list_synthesizes_folders() {
    let storage = MemoryStorage::new(2);
    for key in [
        "repo/base/a/x.jar",
        "repo/base/a/b/y.jar",
        "repo/base/c.pom",
        "repo/base2/ignored.jar",
    ] {
        storage.insert(key, &b"x"[..], OffsetDateTime::now_utc()).unwrap();
    }
    let wagon = connected_wagon(&storage);

    let mut all = wagon.get_file_list("").await.unwrap();
    all.sort();
    assert_eq!(all, vec!["a/", "a/b/", "a/b/y.jar", "a/x.jar", "c.pom"]);

    assert_eq!(
        wagon.get_file_list("/a/").await.unwrap(),
        vec!["b/y.jar", "x.jar", "b/"]
    );

    assert!(matches!(
        wagon.get_file_list("empty").await,
        Err(Error::ResourceDoesNotExist(_))
    ));
}

#[tokio::test]
async fn session_events_are_fired_in_order() {
    let storage = MemoryStorage::default();
    let mut wagon =
        BosWagon::with_connector(WagonConfig::default(), MemoryConnector::new(storage));
    let recorder = Arc::new(SessionRecorder::default());
    let listener: Arc<dyn SessionListener> = recorder.clone();
    wagon.add_session_listener(listener.clone());
    wagon.add_session_listener(listener.clone());
    assert!(wagon.has_session_listener(&listener));

    wagon
        .connect(Repository::new("test", REPO_URL).unwrap(), &auth())
        .unwrap();
    assert!(wagon.is_connected());
    assert_eq!(wagon.repository().map(Repository::id), Some("test"));
    wagon.disconnect();
    assert!(!wagon.is_connected());

    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec![
            SessionEventType::Opening,
            SessionEventType::LoggedIn,
            SessionEventType::Opened,
            SessionEventType::Disconnecting,
            SessionEventType::LoggedOff,
            SessionEventType::Disconnected,
        ]
    );

    wagon.remove_session_listener(&listener);
    assert!(!wagon.has_session_listener(&listener));
}

#[tokio::test]
async fn disconnect_before_connect_is_safe() {
    let mut wagon = BosWagon::with_connector(WagonConfig::default(), MemoryConnector::default());
    wagon.disconnect();
    wagon.disconnect();

    assert!(!wagon.resource_exists("a.jar").await);
    assert!(matches!(
        wagon.get("a.jar", Path::new("a.jar")).await,
        Err(Error::NotConnected)
    ));
    assert!(matches!(
        wagon.get_file_list("").await,
        Err(Error::NotConnected)
    ));
}

#[test]
fn connect_validates_repository_and_credentials() {
    let mut wagon = BosWagon::with_connector(WagonConfig::default(), MemoryConnector::default());

    assert!(matches!(
        wagon.connect(
            Repository::new("test", "bos://bj.bcebos.com/bucket").unwrap(),
            &auth()
        ),
        Err(Error::Configuration(_))
    ));
    assert!(matches!(
        wagon.connect(
            Repository::new("test", REPO_URL).unwrap(),
            &AuthenticationInfo::new("ak", "")
        ),
        Err(Error::Authentication { .. })
    ));
    assert!(!wagon.is_connected());
}

/// 返回`data`之后连接断开
struct InterruptedReader {
    data: &'static [u8],
}

impl AsyncRead for InterruptedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        if self.data.is_empty() {
            return Poll::Ready(Err(std::io::Error::other("connection reset by peer")));
        }
        let n = self.data.len().min(buf.remaining());
        buf.put_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Poll::Ready(Ok(()))
    }
}

struct InterruptedStorage;

#[async_trait::async_trait]
impl ObjectStorage for InterruptedStorage {
    async fn put_object(&self, _key: &str, _request: PutRequest) -> Result<(), bos::Error> {
        Ok(())
    }

    async fn get_object(&self, _key: &str) -> Result<ObjectReader, bos::Error> {
        Ok(Box::new(InterruptedReader {
            data: b"first half of a jar",
        }))
    }

    async fn get_object_meta(&self, key: &str) -> Result<ObjectMeta, bos::Error> {
        Err(bos::Error::NotFound(key.to_owned()))
    }

    async fn list_objects(
        &self,
        _prefix: &str,
        _marker: Option<&str>,
    ) -> Result<ObjectPage, bos::Error> {
        Ok(ObjectPage::default())
    }
}

struct InterruptedConnector;

impl StorageConnector for InterruptedConnector {
    fn connect(
        &self,
        _bucket: &str,
        _auth: &AuthenticationInfo,
        _endpoint: &str,
    ) -> Result<Box<dyn ObjectStorage>, bos::Error> {
        Ok(Box::new(InterruptedStorage))
    }
}

fn interrupted_wagon(config: WagonConfig) -> (BosWagon, Arc<TransferRecorder>) {
    let mut wagon = BosWagon::with_connector(config, InterruptedConnector);
    wagon
        .connect(Repository::new("test", REPO_URL).unwrap(), &auth())
        .unwrap();
    let recorder = Arc::new(TransferRecorder::default());
    wagon.add_transfer_listener(recorder.clone());
    (wagon, recorder)
}

#[tokio::test]
async fn interrupted_download_is_swallowed_by_default() {
    let (wagon, recorder) = interrupted_wagon(WagonConfig::default());
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("lib.jar");

    wagon.get("lib.jar", &destination).await.unwrap();

    assert!(!destination.exists());
    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec![
            TransferEventType::Initiated,
            TransferEventType::Started,
            TransferEventType::Completed,
        ]
    );
}

#[tokio::test]
async fn interrupted_download_fails_in_strict_mode() {
    let (wagon, recorder) = interrupted_wagon(WagonConfig::builder().strict_get(true).build());
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("lib.jar");

    let err = wagon.get("lib.jar", &destination).await.unwrap_err();

    assert!(matches!(err, Error::TransferFailed { source: Some(_), .. }));
    assert!(!destination.exists());
    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec![
            TransferEventType::Initiated,
            TransferEventType::Started,
            TransferEventType::Error,
        ]
    );
}

#[test]
fn failed_reconnect_forgets_previous_repository() {
    let mut wagon = connected_wagon(&MemoryStorage::default());
    assert_eq!(wagon.repository().map(Repository::id), Some("test"));

    let err = wagon
        .connect(
            Repository::new("second", REPO_URL).unwrap(),
            &AuthenticationInfo::new("", "sk"),
        )
        .unwrap_err();
    assert!(matches!(err, Error::Authentication { .. }));
    assert!(!wagon.is_connected());
    assert!(wagon.repository().is_none());
}
