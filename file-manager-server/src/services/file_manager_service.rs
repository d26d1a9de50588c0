use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::web::Data;
use actix_web::{delete, get, post, web, HttpResponse};
use blob_store::{CancellationToken, ContentProvider, FileName, StreamInfo};
use bytes::{Bytes, BytesMut};
use futures_util::TryStreamExt;
use serde::Deserialize;
use validator::Validate;

use crate::errors::{FileManagerErr, UploadErr};

pub const APP_OCTET_STREAM: &str = "application/octet-stream";
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

pub struct AppState {
    pub(crate) provider: Arc<dyn ContentProvider<FileName>>,
    pub(crate) shutdown: CancellationToken,
    pub(crate) max_upload_bytes: usize,
}

impl AppState {
    /// Per-request token, cancelled together with the whole server.
    fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}

#[derive(Deserialize, Validate)]
pub struct FileNameQuery {
    #[serde(rename = "fileName", default)]
    #[validate(length(min = 1))]
    file_name: String,
}

impl FileNameQuery {
    fn key(&self) -> Result<FileName, FileManagerErr> {
        self.validate()?;
        FileName::new(self.file_name.as_str()).map_err(FileManagerErr::Content)
    }
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(store)
        .service(exists)
        .service(get_file)
        .service(delete_file)
        .service(get_hash);
}

/// Pulls the first part that carries a file name out of the multipart body.
async fn read_upload(payload: &mut Multipart, limit: usize) -> Result<(String, Bytes), UploadErr> {
    while let Some(mut field) = payload.try_next().await? {
        let file_name = match field.content_disposition().get_filename() {
            Some(name) => name.to_string(),
            None => continue,
        };
        let mut data = BytesMut::new();
        while let Some(chunk) = field.try_next().await? {
            if data.len() + chunk.len() > limit {
                return Err(UploadErr::TooLarge(limit));
            }
            data.extend_from_slice(&chunk);
        }
        return Ok((file_name, data.freeze()));
    }
    Err(UploadErr::MissingFile)
}

#[post("/FileManager")]
async fn store(
    mut payload: Multipart,
    shared_state: Data<AppState>,
) -> Result<HttpResponse, FileManagerErr> {
    let (file_name, data) = read_upload(&mut payload, shared_state.max_upload_bytes).await?;
    let key = FileName::new(file_name).map_err(UploadErr::Store)?;
    let size = data.len();

    shared_state.provider
        .store(&key, StreamInfo::from_bytes(data), &shared_state.request_token())
        .await
        .into_result()
        .map_err(UploadErr::Store)?;

    tracing::info!("Stored {} ({} bytes)", key, size);
    Ok(HttpResponse::Ok().content_type(TEXT_PLAIN).body("File uploaded successfully."))
}

#[get("/FileManager")]
async fn exists(
    query: web::Query<FileNameQuery>,
    shared_state: Data<AppState>,
) -> Result<HttpResponse, FileManagerErr> {
    let key = query.key()?;
    let found = shared_state.provider
        .exists(&key, &shared_state.request_token())
        .await
        .into_result()
        .map_err(FileManagerErr::Content)?;

    let message = if found { "The file exists." } else { "The file does not exists." };
    Ok(HttpResponse::Ok().content_type(TEXT_PLAIN).body(message))
}

#[get("/FileManager/Get")]
async fn get_file(
    query: web::Query<FileNameQuery>,
    shared_state: Data<AppState>,
) -> Result<HttpResponse, FileManagerErr> {
    let key = query.key()?;
    let data = shared_state.provider
        .get_bytes(&key, &shared_state.request_token())
        .await
        .into_result()
        .map_err(FileManagerErr::Content)?;

    Ok(HttpResponse::Ok()
        .content_type(APP_OCTET_STREAM)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(key.to_string())],
        })
        .body(data))
}

#[delete("/FileManager")]
async fn delete_file(
    query: web::Query<FileNameQuery>,
    shared_state: Data<AppState>,
) -> Result<HttpResponse, FileManagerErr> {
    let key = query.key()?;
    shared_state.provider
        .delete(&key, &shared_state.request_token())
        .await
        .into_result()
        .map_err(FileManagerErr::Content)?;

    tracing::info!("Deleted {}", key);
    Ok(HttpResponse::Ok().content_type(TEXT_PLAIN).body("The file is deleted."))
}

#[get("/FileManager/GetHash")]
async fn get_hash(
    query: web::Query<FileNameQuery>,
    shared_state: Data<AppState>,
) -> Result<HttpResponse, FileManagerErr> {
    let key = query.key()?;
    shared_state.provider
        .get_hash(&key, &shared_state.request_token())
        .await
        .into_result()
        .map_err(FileManagerErr::Content)
        .map(|hash| HttpResponse::Ok().content_type(TEXT_PLAIN).body(hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, App};
    use blob_store::{FileContentProvider, LocalFileBlobStore};
    use std::path::Path;
    use tempfile::tempdir;

    const BOUNDARY: &str = "file-manager-test-boundary";

    fn app_state(dir: &Path, max_upload_bytes: usize) -> (Data<AppState>, CancellationToken) {
        let provider = Arc::new(FileContentProvider::new(LocalFileBlobStore::new(dir)));
        let shutdown = CancellationToken::new();
        let state = Data::new(AppState { provider, shutdown: shutdown.clone(), max_upload_bytes });
        (state, shutdown)
    }

    fn multipart(file_name: Option<&str>, content: &[u8]) -> test::TestRequest {
        let disposition = match file_name {
            Some(name) => format!("form-data; name=\"file\"; filename=\"{}\"", name),
            None => "form-data; name=\"note\"".to_string(),
        };
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        test::TestRequest::post()
            .uri("/FileManager")
            .insert_header((header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}")))
            .set_payload(body)
    }

    #[actix_web::test]
    async fn test_upload_exists_get_hash_delete() {
        let temp_dir = tempdir().unwrap();
        let (state, _) = app_state(temp_dir.path(), 1024);
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let resp = test::call_service(&app, multipart(Some("a.txt"), b"hello").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "File uploaded successfully.");
        assert_eq!(std::fs::read(temp_dir.path().join("a.txt")).unwrap(), b"hello");

        let req = test::TestRequest::get().uri("/FileManager?fileName=a.txt").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "The file exists.");

        let req = test::TestRequest::get().uri("/FileManager/Get?fileName=a.txt").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), APP_OCTET_STREAM);
        let disposition = resp.headers().get(header::CONTENT_DISPOSITION).unwrap().to_str().unwrap().to_string();
        assert!(disposition.starts_with("attachment"));
        assert!(disposition.contains("filename=\"a.txt\""));
        assert_eq!(test::read_body(resp).await, "hello");

        let req = test::TestRequest::get().uri("/FileManager/GetHash?fileName=a.txt").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "5d41402abc4b2a76b9719d911017c592");

        let req = test::TestRequest::delete().uri("/FileManager?fileName=a.txt").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "The file is deleted.");

        let req = test::TestRequest::get().uri("/FileManager?fileName=a.txt").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(test::read_body(resp).await, "The file does not exists.");
    }

    #[actix_web::test]
    async fn test_missing_file_operations_fail() {
        let temp_dir = tempdir().unwrap();
        let (state, _) = app_state(temp_dir.path(), 1024);
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        for req in [
            test::TestRequest::get().uri("/FileManager/Get?fileName=missing.txt"),
            test::TestRequest::get().uri("/FileManager/GetHash?fileName=missing.txt"),
            test::TestRequest::delete().uri("/FileManager?fileName=missing.txt"),
        ] {
            let resp = test::call_service(&app, req.to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(test::read_body(resp).await, "Error.");
        }
    }

    #[actix_web::test]
    async fn test_missing_or_empty_file_name() {
        let temp_dir = tempdir().unwrap();
        let (state, _) = app_state(temp_dir.path(), 1024);
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        for uri in ["/FileManager", "/FileManager?fileName=", "/FileManager/GetHash"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(test::read_body(resp).await, "Error.");
        }
    }

    #[actix_web::test]
    async fn test_rejected_uploads() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path().join("root");
        std::fs::create_dir(&root).unwrap();
        let (state, _) = app_state(&root, 8);
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let requests = [
            multipart(None, b"no file here"),
            multipart(Some("big.bin"), b"more than eight bytes"),
            multipart(Some("../escape.txt"), b"x"),
        ];
        for req in requests {
            let resp = test::call_service(&app, req.to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(test::read_body(resp).await, "Error in file upload.");
        }
        assert!(!temp_dir.path().join("escape.txt").exists());
        assert!(!root.join("big.bin").exists());
    }

    #[actix_web::test]
    async fn test_shutdown_cancels_requests() {
        let temp_dir = tempdir().unwrap();
        let (state, shutdown) = app_state(temp_dir.path(), 1024);
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;
        shutdown.cancel();

        let req = test::TestRequest::get().uri("/FileManager?fileName=a.txt").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
