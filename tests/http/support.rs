use std::io::Cursor;
use std::time::Duration;

use bookshelf::http::{self, AppState};
use bookshelf::{Config, InMemoryStore, RecordStore};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde_json::{json, Value};
use tempfile::TempDir;

pub const PASSWORD: &str = "correct horse";

pub struct TestServer<S = InMemoryStore> {
    pub base: String,
    pub client: Client,
    pub store: S,
    // Removed when the server handle is dropped.
    pub uploads: TempDir,
}

fn test_config(uploads: &TempDir) -> Config {
    Config {
        bind_addr: "127.0.0.1".into(),
        port: 0,
        public_url: "http://cdn.test".into(),
        jwt_secret: "integration-secret".into(),
        token_ttl: Duration::from_secs(60 * 60),
        uploads_dir: uploads.path().to_path_buf(),
        data_file: None,
        bcrypt_cost: 4,
        image_max_width: 64,
    }
}

/// Bind to port 0 and return a handle with the actual address.
pub async fn start_server() -> TestServer {
    start_server_with(InMemoryStore::new()).await
}

pub async fn start_server_with<S: RecordStore + Clone + 'static>(store: S) -> TestServer<S> {
    let uploads = tempfile::tempdir().unwrap();
    let state = AppState::new(store.clone(), test_config(&uploads));

    let app = http::router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base: format!("http://{addr}"),
        client: Client::new(),
        store,
        uploads,
    }
}

impl<S> TestServer<S> {
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    pub async fn signup(&self, email: &str) -> Response {
        self.client
            .post(self.url("/api/auth/signup"))
            .json(&json!({ "email": email, "password": PASSWORD }))
            .send()
            .await
            .unwrap()
    }

    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap()
    }

    /// Sign up and log in, returning `(user_id, token)`.
    pub async fn user(&self, email: &str) -> (String, String) {
        assert_eq!(self.signup(email).await.status(), 200);
        let body: Value = self.login(email, PASSWORD).await.json().await.unwrap();
        (
            body["userId"].as_str().unwrap().to_string(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    pub async fn post_book(&self, token: &str, book: Value, image: Option<Vec<u8>>) -> Response {
        self.client
            .post(self.url("/api/books"))
            .bearer_auth(token)
            .multipart(book_form(&book, image))
            .send()
            .await
            .unwrap()
    }

    pub async fn put_book(
        &self,
        token: &str,
        id: &str,
        patch: Value,
        image: Option<Vec<u8>>,
    ) -> Response {
        self.client
            .put(self.url(&format!("/api/books/{id}")))
            .bearer_auth(token)
            .multipart(book_form(&patch, image))
            .send()
            .await
            .unwrap()
    }

    pub async fn rate(&self, token: &str, id: &str, rating: i64) -> Response {
        self.client
            .post(self.url(&format!("/api/books/{id}/rating")))
            .bearer_auth(token)
            .json(&json!({ "userId": "ignored", "rating": rating }))
            .send()
            .await
            .unwrap()
    }

    pub async fn books(&self) -> Vec<Value> {
        let resp = self.client.get(self.url("/api/books")).send().await.unwrap();
        assert_eq!(resp.status(), 200);
        resp.json().await.unwrap()
    }

    pub async fn book(&self, id: &str) -> Response {
        self.client
            .get(self.url(&format!("/api/books/{id}")))
            .send()
            .await
            .unwrap()
    }

    /// Create a book and return its id, looked up by title.
    pub async fn create_book(&self, token: &str, title: &str) -> String {
        let resp = self.post_book(token, dune(title), None).await;
        assert_eq!(resp.status(), 200);

        self.books()
            .await
            .into_iter()
            .find(|b| b["title"] == title)
            .and_then(|b| b["_id"].as_str().map(str::to_string))
            .unwrap()
    }
}

fn book_form(book: &Value, image: Option<Vec<u8>>) -> Form {
    let form = Form::new().text("book", book.to_string());
    match image {
        Some(bytes) => form.part(
            "image",
            Part::bytes(bytes)
                .file_name("My Cover.png")
                .mime_str("image/png")
                .unwrap(),
        ),
        None => form,
    }
}

pub fn dune(title: &str) -> Value {
    json!({
        "title": title,
        "author": "Herbert",
        "year": 1965,
        "genre": "SciFi",
    })
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([10, 120, 200]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}
