use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::json;

use bookstore_server::models::{Book, User};

use crate::common::{to_json, TestApp};

struct Fixture {
    app: TestApp,
    user: User,
    token: String,
    book_1: Book,
    book_2: Book,
    book_3: Book,
    book_4: Book,
}

async fn setup() -> Fixture {
    let app = TestApp::new().await;
    let (user, token) = app.create_user("testuser", false).await;
    let book_1 = app
        .create_book("Test Book 1", "25.00", "Author 1", Some(&user))
        .await;
    let book_2 = app.create_book("Test Book 2", "50.00", "Author 2", None).await;
    let book_3 = app.create_book("Test Book 3", "100.00", "Author 3", None).await;
    let book_4 = app
        .create_book("Test Book Author 1", "150.00", "Author 4", None)
        .await;

    Fixture {
        app,
        user,
        token,
        book_1,
        book_2,
        book_3,
        book_4,
    }
}

fn update_body(book: &Book, price: i64) -> serde_json::Value {
    json!({
        "name": book.name,
        "price": price,
        "author_name": book.author_name,
    })
}

#[tokio::test]
async fn test_get() {
    let f = setup().await;

    let (status, body) = f.app.get("/books/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        to_json(&vec![&f.book_1, &f.book_2, &f.book_3, &f.book_4])
    );
    assert_eq!(body[0]["price"], "25.00");
    assert_eq!(body[0]["owner"], f.user.id);
    assert_eq!(body[0]["owner_name"], "testuser");
    assert_eq!(body[1]["owner"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_get_without_trailing_slash() {
    let f = setup().await;

    let (with_slash, _) = f.app.get("/books/", None).await;
    let (status, body) = f.app.get("/books", None).await;

    assert_eq!(with_slash, StatusCode::OK);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(|b| b.len()), Some(4));
}

#[tokio::test]
async fn test_get_filter() {
    let f = setup().await;

    let (status, body) = f.app.get("/books/?price=50", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, to_json(&vec![&f.book_2]));

    let (_, body) = f.app.get("/books/?price=50.00", None).await;
    assert_eq!(body, to_json(&vec![&f.book_2]));

    let (_, body) = f.app.get("/books/?price=51", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_get_filter_invalid_price() {
    let f = setup().await;

    let (status, body) = f.app.get("/books/?price=fifty", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid");
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_get_filter_price_with_extra_decimals() {
    let f = setup().await;

    let (status, body) = f.app.get("/books/?price=50.004", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid");
    assert!(body["fields"]["price"].is_array());

    let (status, body) = f.app.get("/books/?price=50.000", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, to_json(&vec![&f.book_2]));
}

#[tokio::test]
async fn test_get_search() {
    let f = setup().await;

    let (status, body) = f.app.get("/books/?search=Author+1", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, to_json(&vec![&f.book_1, &f.book_4]));
}

#[tokio::test]
async fn test_get_search_is_case_insensitive() {
    let f = setup().await;

    let (_, body) = f.app.get("/books/?search=author%203", None).await;
    assert_eq!(body, to_json(&vec![&f.book_3]));

    let (_, body) = f.app.get("/books/?search=100%25", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_get_search_non_ascii() {
    let f = setup().await;
    let eclair = f
        .app
        .create_book("Éclair Stories", "12.00", "Jürgen Ölberg", None)
        .await;

    let (status, body) = f.app.get("/books/?search=%C3%89clair", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, to_json(&vec![&eclair]));

    let (_, body) = f.app.get("/books/?search=%C3%A9CLAIR", None).await;
    assert_eq!(body, to_json(&vec![&eclair]));

    let (_, body) = f.app.get("/books/?search=%C3%B6lberg", None).await;
    assert_eq!(body, to_json(&vec![&eclair]));
}

#[tokio::test]
async fn test_get_search_after_rename() {
    let f = setup().await;

    let (status, _) = f
        .app
        .send(
            Method::PATCH,
            &format!("/books/{}/", f.book_1.id),
            Some(&f.token),
            Some(json!({"name": "Ünderground"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = f.app.get("/books/?search=%C3%BCnder", None).await;
    assert_eq!(body, to_json(&vec![&f.app.book(f.book_1.id).await]));
}

#[tokio::test]
async fn test_get_ordering() {
    let f = setup().await;

    let (status, body) = f.app.get("/books/?ordering=-price", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        to_json(&vec![&f.book_4, &f.book_3, &f.book_2, &f.book_1])
    );

    let (_, body) = f.app.get("/books/?ordering=author_name", None).await;
    assert_eq!(
        body,
        to_json(&vec![&f.book_1, &f.book_2, &f.book_3, &f.book_4])
    );
}

#[tokio::test]
async fn test_get_unknown_ordering_is_ignored() {
    let f = setup().await;

    let (status, body) = f.app.get("/books/?ordering=50", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        to_json(&vec![&f.book_1, &f.book_2, &f.book_3, &f.book_4])
    );
}

#[tokio::test]
async fn test_get_filter_search_and_ordering_combined() {
    let f = setup().await;
    let extra = f
        .app
        .create_book("Another Author 1 book", "25.00", "Someone", None)
        .await;

    let (_, body) = f
        .app
        .get("/books/?price=25&search=Author+1&ordering=-id", None)
        .await;

    assert_eq!(body, to_json(&vec![&extra, &f.book_1]));
}

#[tokio::test]
async fn test_retrieve() {
    let f = setup().await;

    let (status, body) = f.app.get(&format!("/books/{}/", f.book_3.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, to_json(&f.book_3));

    let (status, body) = f.app.get("/books/9999/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_invalid_token_is_rejected_on_read() {
    let f = setup().await;

    let (status, body) = f.app.get("/books/", Some("not-a-token")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "authentication_failed");
}

#[tokio::test]
async fn test_create() {
    let f = setup().await;
    assert_eq!(f.app.book_count().await, 4);

    let (status, body) = f
        .app
        .send(
            Method::POST,
            "/books/",
            Some(&f.token),
            Some(json!({
                "name": "Programming in Python 3",
                "price": 150,
                "author_name": "Mark Summer",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(f.app.book_count().await, 5);
    assert_eq!(body["price"], "150.00");
    assert_eq!(body["owner"], f.user.id);

    let created = f.app.book(body["id"].as_i64().unwrap()).await;
    assert_eq!(created.owner, Some(f.user.id));
    assert_eq!(created.name, "Programming in Python 3");
    assert_eq!(body, to_json(&created));
}

#[tokio::test]
async fn test_create_anonymous() {
    let f = setup().await;

    let (status, body) = f
        .app
        .send(
            Method::POST,
            "/books/",
            None,
            Some(json!({"name": "Anonymous", "price": 10, "author_name": "Nobody"})),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "not_authenticated");
    assert_eq!(f.app.book_count().await, 4);
}

#[tokio::test]
async fn test_create_invalid_price() {
    let f = setup().await;

    let (status, body) = f
        .app
        .send(
            Method::POST,
            "/books/",
            Some(&f.token),
            Some(json!({"name": "Cheap", "price": "-1", "author_name": "Someone"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid");
    assert!(body["fields"]["price"].is_array());

    let (status, _) = f
        .app
        .send(
            Method::POST,
            "/books/",
            Some(&f.token),
            Some(json!({"name": "Precise", "price": "1.005", "author_name": "Someone"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(f.app.book_count().await, 4);
}

#[tokio::test]
async fn test_create_malformed_body() {
    let f = setup().await;

    let (status, body) = f
        .app
        .send(
            Method::POST,
            "/books/",
            Some(&f.token),
            Some(json!({"name": "No price", "author_name": "Someone"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid");
    assert!(body["detail"].is_string());
    assert_eq!(f.app.book_count().await, 4);
}

#[tokio::test]
async fn test_create_with_token_of_deleted_user() {
    let f = setup().await;
    let (gone, token) = f.app.create_user("gone", false).await;
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(gone.id)
        .execute(&f.app.repository.pool)
        .await
        .unwrap();

    let (status, body) = f
        .app
        .send(
            Method::POST,
            "/books/",
            Some(&token),
            Some(json!({"name": "Orphan", "price": "5.00", "author_name": "Someone"})),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "authentication_failed");
    assert_eq!(f.app.book_count().await, 4);
}

#[tokio::test]
async fn test_update() {
    let f = setup().await;

    let (status, body) = f
        .app
        .send(
            Method::PUT,
            &format!("/books/{}/", f.book_1.id),
            Some(&f.token),
            Some(update_body(&f.book_1, 50)),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], "50.00");
    assert_eq!(f.app.book(f.book_1.id).await.price, Decimal::from(50));
}

#[tokio::test]
async fn test_update_not_owner() {
    let f = setup().await;
    let (_, token_2) = f.app.create_user("testuser2", false).await;

    let (status, body) = f
        .app
        .send(
            Method::PUT,
            &format!("/books/{}/", f.book_1.id),
            Some(&token_2),
            Some(update_body(&f.book_1, 50)),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body,
        json!({
            "detail": "You do not have permission to perform this action.",
            "code": "permission_denied",
        })
    );
    assert_eq!(f.app.book(f.book_1.id).await.price, Decimal::from(25));
}

#[tokio::test]
async fn test_update_not_owner_but_staff() {
    let f = setup().await;
    let (_, staff_token) = f.app.create_user("testuser2", true).await;

    let (status, _) = f
        .app
        .send(
            Method::PUT,
            &format!("/books/{}/", f.book_1.id),
            Some(&staff_token),
            Some(update_body(&f.book_1, 50)),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let book = f.app.book(f.book_1.id).await;
    assert_eq!(book.price, Decimal::from(50));
    assert_eq!(book.owner, Some(f.user.id));
}

#[tokio::test]
async fn test_staff_change_applies_to_issued_token() {
    let f = setup().await;
    let (user_2, token_2) = f.app.create_user("testuser2", false).await;
    let set_staff = |is_staff: bool| {
        sqlx::query("UPDATE users SET is_staff = ? WHERE id = ?")
            .bind(is_staff)
            .bind(user_2.id)
            .execute(&f.app.repository.pool)
    };

    set_staff(true).await.unwrap();
    let (status, _) = f
        .app
        .send(
            Method::PUT,
            &format!("/books/{}/", f.book_1.id),
            Some(&token_2),
            Some(update_body(&f.book_1, 50)),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(f.app.book(f.book_1.id).await.price, Decimal::from(50));

    set_staff(false).await.unwrap();
    let (status, _) = f
        .app
        .send(
            Method::DELETE,
            &format!("/books/{}/", f.book_1.id),
            Some(&token_2),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(f.app.book_count().await, 4);
}

#[tokio::test]
async fn test_update_unowned_book() {
    let f = setup().await;

    let (status, _) = f
        .app
        .send(
            Method::PUT,
            &format!("/books/{}/", f.book_2.id),
            Some(&f.token),
            Some(update_body(&f.book_2, 10)),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(f.app.book(f.book_2.id).await.price, Decimal::from(50));
}

#[tokio::test]
async fn test_update_missing_book() {
    let f = setup().await;

    let (status, _) = f
        .app
        .send(
            Method::PUT,
            "/books/9999/",
            Some(&f.token),
            Some(update_body(&f.book_1, 50)),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_partial_update() {
    let f = setup().await;

    let (status, body) = f
        .app
        .send(
            Method::PATCH,
            &format!("/books/{}/", f.book_1.id),
            Some(&f.token),
            Some(json!({"name": "Renamed"})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Renamed");
    let book = f.app.book(f.book_1.id).await;
    assert_eq!(book.name, "Renamed");
    assert_eq!(book.price, Decimal::from(25));
    assert_eq!(book.author_name, "Author 1");
}

#[tokio::test]
async fn test_delete() {
    let f = setup().await;
    assert_eq!(f.app.book_count().await, 4);

    let (status, body) = f
        .app
        .send(
            Method::DELETE,
            &format!("/books/{}/", f.book_1.id),
            Some(&f.token),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, serde_json::Value::Null);
    assert_eq!(f.app.book_count().await, 3);
}

#[tokio::test]
async fn test_delete_not_owner() {
    let f = setup().await;
    let (_, token_2) = f.app.create_user("testuser2", false).await;

    let (status, body) = f
        .app
        .send(
            Method::DELETE,
            &format!("/books/{}/", f.book_1.id),
            Some(&token_2),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "permission_denied");
    assert_eq!(f.app.book_count().await, 4);
}

#[tokio::test]
async fn test_delete_not_owner_but_staff() {
    let f = setup().await;
    let (_, staff_token) = f.app.create_user("testuser2", true).await;

    let (status, _) = f
        .app
        .send(
            Method::DELETE,
            &format!("/books/{}/", f.book_1.id),
            Some(&staff_token),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(f.app.book_count().await, 3);
}

#[tokio::test]
async fn test_delete_anonymous() {
    let f = setup().await;

    let (status, _) = f
        .app
        .send(
            Method::DELETE,
            &format!("/books/{}/", f.book_1.id),
            None,
            None,
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(f.app.book_count().await, 4);
}
