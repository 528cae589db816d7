//! 需要真实的bos账号，复制`tests/bos/config.sample.toml`为`tests/bos/config.toml`后运行：
//! `cargo test --test bos -- --ignored`

use bos_wagon::bos;
use bos_wagon::bos::object::PutObjectBody;
use bos_wagon::config::WagonConfig;
use bos_wagon::credentials::{Credentials, StaticCredentialsProvider};
use bos_wagon::wagon::{AuthenticationInfo, BosWagon, Repository};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize, Debug)]
pub struct BosConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint: String,
    pub bucket: String,
    pub base_directory: String,
}

impl BosConfig {
    pub fn get_conf() -> Self {
        let file_str = std::fs::read_to_string("tests/bos/config.toml").unwrap();
        toml::from_str(&file_str).unwrap()
    }
}

fn get_bos_client(conf: &BosConfig) -> bos::Client {
    let creds = Credentials::try_new(&conf.access_key_id, &conf.secret_access_key).unwrap();
    bos::Client::builder()
        .credentials_provider(Arc::new(StaticCredentialsProvider::new(creds)))
        .endpoint(conf.endpoint.as_str())
        .bucket(conf.bucket.as_str())
        .build()
}

#[tokio::test]
#[ignore]
async fn object_lifecycle_test() {
    let conf = BosConfig::get_conf();
    let client = get_bos_client(&conf);
    let key = format!("{}/bos-wagon-test/hello.txt", conf.base_directory.trim_matches('/'));

    let res = client
        .put_object()
        .content_type("text/plain")
        .build()
        .send(&key, PutObjectBody::Bytes(b"hello bos".to_vec()))
        .await
        .unwrap();
    println!("put: {:#?}", res);

    let meta = client.head_object(&key).await.unwrap();
    assert_eq!(meta.content_length, 9);

    let (data, _) = client.get_object_bytes(&key).await.unwrap();
    assert_eq!(&data[..], b"hello bos");

    let list = client
        .list_objects()
        .prefix(&format!("{}/bos-wagon-test/", conf.base_directory.trim_matches('/')))
        .build()
        .send()
        .await
        .unwrap();
    assert!(list.contents.iter().any(|c| c.key == key));

    client.delete_object(&key).await.unwrap();
    let err = client.head_object(&key).await.unwrap_err();
    assert!(err.is_not_found(), "{err}");
}

#[tokio::test]
#[ignore]
async fn wagon_put_and_list_test() {
    let conf = BosConfig::get_conf();
    let url = format!(
        "bos://{}/{}/{}",
        conf.endpoint.trim_start_matches("https://"),
        conf.bucket,
        conf.base_directory.trim_matches('/')
    );
    let mut wagon = BosWagon::new(WagonConfig::default());
    wagon
        .connect(
            Repository::new("live", &url).unwrap(),
            &AuthenticationInfo::new(&conf.access_key_id, &conf.secret_access_key),
        )
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("lib.jar");
    std::fs::write(&source, b"live test").unwrap();
    wagon
        .put(&source, "bos-wagon-test/org/acme/lib.jar")
        .await
        .unwrap();
    assert!(wagon.resource_exists("bos-wagon-test/org/acme/lib.jar").await);

    let entries = wagon.get_file_list("bos-wagon-test").await.unwrap();
    println!("entries: {:#?}", entries);
    assert!(entries.contains(&"org/".to_owned()));
    assert!(entries.contains(&"org/acme/lib.jar".to_owned()));

    let destination = dir.path().join("download/lib.jar");
    wagon
        .get("bos-wagon-test/org/acme/lib.jar", &destination)
        .await
        .unwrap();
    assert_eq!(std::fs::read(&destination).unwrap(), b"live test");
    wagon.disconnect();

    let client = get_bos_client(&conf);
    let key = format!(
        "{}/bos-wagon-test/org/acme/lib.jar",
        conf.base_directory.trim_matches('/')
    );
    client.delete_object(&key).await.unwrap();
}
