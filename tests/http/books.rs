use serde_json::{json, Value};

use crate::support::{dune, png, start_server};

#[tokio::test]
async fn create_list_and_get() {
    let server = start_server().await;
    let (user_id, token) = server.user("ann@example.com").await;

    let resp = server.post_book(&token, dune("Dune"), None).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Book posted");

    let books = server.books().await;
    assert_eq!(books.len(), 1);
    let book = &books[0];
    assert_eq!(book["title"], "Dune");
    assert_eq!(book["author"], "Herbert");
    assert_eq!(book["year"], 1965);
    assert_eq!(book["userId"], user_id.as_str());
    assert_eq!(book["imageUrl"], "");
    assert_eq!(book["ratings"], json!([]));
    assert!(book.get("averageRating").is_none());

    let id = book["_id"].as_str().unwrap();
    let resp = server.book(id).await;
    assert_eq!(resp.status(), 200);
    let fetched: Value = resp.json().await.unwrap();
    assert_eq!(&fetched, book);
}

#[tokio::test]
async fn owner_comes_from_the_token() {
    let server = start_server().await;
    let (user_id, token) = server.user("ann@example.com").await;

    let mut book = dune("Dune");
    book["userId"] = json!("someone-else");
    book["averageRating"] = json!(5);
    book["year"] = json!("1965");
    assert_eq!(server.post_book(&token, book, None).await.status(), 200);

    let books = server.books().await;
    assert_eq!(books[0]["userId"], user_id.as_str());
    assert_eq!(books[0]["year"], 1965);
    assert!(books[0].get("averageRating").is_none());
}

#[tokio::test]
async fn cover_is_stored_as_webp_and_served() {
    let server = start_server().await;
    let (_, token) = server.user("ann@example.com").await;

    let resp = server
        .post_book(&token, dune("Dune"), Some(png(200, 100)))
        .await;
    assert_eq!(resp.status(), 200);

    let books = server.books().await;
    let url = books[0]["imageUrl"].as_str().unwrap();
    assert!(url.starts_with("http://cdn.test/images/"), "{url}");
    assert!(url.ends_with("-my_cover.png.webp"), "{url}");

    let file = url.rsplit('/').next().unwrap();
    assert!(server.uploads.path().join(file).exists());

    let resp = server
        .client
        .get(server.url(&format!("/images/{file}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let bytes = resp.bytes().await.unwrap();
    assert_eq!(&bytes[..4], b"RIFF");
    assert_eq!(&bytes[8..12], b"WEBP");

    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!(decoded.width(), 64);
}

#[tokio::test]
async fn undecodable_cover_is_a_server_error() {
    let server = start_server().await;
    let (_, token) = server.user("ann@example.com").await;

    let resp = server
        .post_book(&token, dune("Dune"), Some(b"not an image".to_vec()))
        .await;
    assert_eq!(resp.status(), 500);
    assert_eq!(resp.text().await.unwrap(), "Something went wrong");
    assert!(server.books().await.is_empty());
}

#[tokio::test]
async fn bad_payloads_are_rejected() {
    let server = start_server().await;
    let (_, token) = server.user("ann@example.com").await;

    let resp = server
        .client
        .post(server.url("/api/books"))
        .bearer_auth(&token)
        .multipart(reqwest::multipart::Form::new().text("book", "{oops"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.text().await.unwrap(), "Malformed book payload");

    let resp = server
        .client
        .post(server.url("/api/books"))
        .bearer_auth(&token)
        .multipart(reqwest::multipart::Form::new().text("other", "x"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.text().await.unwrap(), "Missing book field");

    let resp = server
        .client
        .post(server.url("/api/books"))
        .bearer_auth(&token)
        .json(&dune("Dune"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn unknown_book_is_not_found() {
    let server = start_server().await;
    let (_, token) = server.user("ann@example.com").await;

    let resp = server.book("missing").await;
    assert_eq!(resp.status(), 404);
    assert_eq!(resp.text().await.unwrap(), "Book not found");

    let resp = server.put_book(&token, "missing", dune("X"), None).await;
    assert_eq!(resp.status(), 404);

    let resp = server
        .client
        .delete(server.url("/api/books/missing"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn owner_updates_only_provided_fields() {
    let server = start_server().await;
    let (_, token) = server.user("ann@example.com").await;
    let id = server.create_book(&token, "Dune").await;

    let resp = server
        .put_book(
            &token,
            &id,
            json!({ "title": "Dune Messiah", "author": "", "year": 0 }),
            Some(png(10, 10)),
        )
        .await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "Book updated");

    let book: Value = server.book(&id).await.json().await.unwrap();
    assert_eq!(book["title"], "Dune Messiah");
    assert_eq!(book["author"], "Herbert");
    assert_eq!(book["year"], 1965);
    assert_eq!(book["genre"], "SciFi");
    assert!(book["imageUrl"]
        .as_str()
        .unwrap()
        .starts_with("http://cdn.test/images/"));
}

#[tokio::test]
async fn non_owner_cannot_update_or_delete() {
    let server = start_server().await;
    let (_, owner) = server.user("ann@example.com").await;
    let (_, other) = server.user("bob@example.com").await;
    let id = server.create_book(&owner, "Dune").await;
    let before: Value = server.book(&id).await.json().await.unwrap();

    let resp = server
        .put_book(&other, &id, json!({ "title": "Hijacked" }), None)
        .await;
    assert_eq!(resp.status(), 403);

    let resp = server
        .client
        .delete(server.url(&format!("/api/books/{id}")))
        .bearer_auth(&other)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let after: Value = server.book(&id).await.json().await.unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn owner_deletes_book() {
    let server = start_server().await;
    let (_, token) = server.user("ann@example.com").await;
    let id = server.create_book(&token, "Dune").await;

    let resp = server
        .client
        .delete(server.url(&format!("/api/books/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "Book deleted");

    assert_eq!(server.book(&id).await.status(), 404);
    assert!(server.books().await.is_empty());
}
