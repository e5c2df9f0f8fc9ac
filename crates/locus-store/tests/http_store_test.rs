//! HTTP backend tests against an in-process file server.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::extract::Path as AxumPath;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tempfile::TempDir;

use locus_core::config::HttpConfig;
use locus_store::http::HttpStore;
use locus_store::ObjectStore;

/// Serve a directory's files over HTTP on an ephemeral port.
async fn serve_dir(dir: PathBuf) -> SocketAddr {
    let app = Router::new().route(
        "/*path",
        get(move |AxumPath(path): AxumPath<String>| {
            let dir = dir.clone();
            async move {
                match tokio::fs::read(dir.join(&path)).await {
                    Ok(bytes) => bytes.into_response(),
                    Err(_) => StatusCode::NOT_FOUND.into_response(),
                }
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

fn store_for(addr: SocketAddr) -> HttpStore {
    HttpStore::new(&HttpConfig {
        base_url: format!("http://{addr}/"),
        index_file: "index.txt".to_string(),
    })
    .unwrap()
}

#[tokio::test]
async fn lists_the_keys_published_in_the_index() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("index.txt"),
        "# comment\na.gpkg\n\nb.gpkg\nnotes.txt\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("a.gpkg"), b"aa").unwrap();
    std::fs::write(dir.path().join("b.gpkg"), b"bb").unwrap();

    let addr = serve_dir(dir.path().to_path_buf()).await;
    let store = store_for(addr);

    let mut keys: Vec<String> = store
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.key)
        .collect();
    keys.sort();
    assert_eq!(keys, vec!["a.gpkg", "b.gpkg"]);
}

#[tokio::test]
async fn a_missing_index_is_an_empty_backend() {
    let dir = TempDir::new().unwrap();
    let addr = serve_dir(dir.path().to_path_buf()).await;
    let store = store_for(addr);

    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn downloads_fetch_relative_to_the_base_url() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("index.txt"), "a.gpkg\n").unwrap();
    std::fs::write(dir.path().join("a.gpkg"), b"payload").unwrap();

    let addr = serve_dir(dir.path().to_path_buf()).await;
    let store = store_for(addr);

    let target_dir = TempDir::new().unwrap();
    let target = target_dir.path().join("cache/a.gpkg");
    store.download("a.gpkg", &target).await.unwrap();
    assert_eq!(std::fs::read(&target).unwrap(), b"payload");

    assert!(store.exists("a.gpkg").await.unwrap());
    assert!(!store.exists("missing.gpkg").await.unwrap());
    assert_eq!(store.reader("a.gpkg").await.unwrap().as_ref(), b"payload");

    assert!(store.download("missing.gpkg", &target).await.is_err());
}
