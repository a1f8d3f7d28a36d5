//! End-to-end flows against live PostgreSQL and Redis
//!
//! Run with `cargo test -- --ignored` when `DATABASE_URL` and `REDIS_URL`
//! point at disposable instances.

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, init_pool, run_migrations},
};
use foodgram_api::{
    AppState, MIGRATOR,
    config::Settings,
    create_router, messages,
    models::user::CreateUserRequest,
    repositories::{UserRepository, unique_user_field},
};
use serde_json::{Value, json};
use serial_test::serial;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

const PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

struct Harness {
    app: Router,
    pool: PgPool,
}

struct Reply {
    status: StatusCode,
    bytes: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap_or(Value::Null)
    }

    fn text(&self) -> String {
        String::from_utf8(self.bytes.clone()).unwrap()
    }
}

async fn harness() -> Harness {
    let pool = init_pool(&DatabaseConfig::from_env().unwrap()).await.unwrap();
    run_migrations(&pool, &MIGRATOR).await.unwrap();
    let redis_pool = RedisPool::new(&RedisConfig::from_env().unwrap()).unwrap();

    let settings = Settings {
        listen_addr: "127.0.0.1:0".to_string(),
        media_root: std::env::temp_dir().join("foodgram-flow-tests"),
        page_size: 6,
        max_page_size: 100,
        cooking_time_min: 1,
        ingredient_amount_min: 1,
        jwt_secret: "flow-test-secret".to_string(),
        token_ttl_seconds: 3600,
    };

    Harness {
        app: create_router(AppState::new(settings, pool.clone(), redis_pool)),
        pool,
    }
}

impl Harness {
    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Token {token}"));
        }
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self.app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();
        Reply { status, bytes }
    }

    /// Register a fresh user and log them in
    async fn user(&self) -> (i64, String) {
        let name = format!("cook{}", &Uuid::new_v4().simple().to_string()[..12]);
        let email = format!("{name}@example.com");

        let created = self
            .call(
                Method::POST,
                "/api/users/",
                None,
                Some(json!({
                    "email": email,
                    "username": name,
                    "first_name": "Anna",
                    "last_name": "Smith",
                    "password": "s3cret-pass"
                })),
            )
            .await;
        assert_eq!(created.status, StatusCode::CREATED);
        let id = created.json()["id"].as_i64().unwrap();

        let login = self
            .call(
                Method::POST,
                "/api/auth/token/login/",
                None,
                Some(json!({ "email": email, "password": "s3cret-pass" })),
            )
            .await;
        assert_eq!(login.status, StatusCode::OK);
        let token = login.json()["auth_token"].as_str().unwrap().to_string();

        (id, token)
    }

    async fn tag_id(&self) -> i64 {
        sqlx::query_scalar("SELECT id FROM tags ORDER BY id LIMIT 1")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    async fn ingredient(&self, name: &str, unit: &str) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2) RETURNING id",
        )
        .bind(name)
        .bind(unit)
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }

    async fn recipe(&self, token: &str, name: &str, ingredients: Value) -> i64 {
        let reply = self
            .call(
                Method::POST,
                "/api/recipes/",
                Some(token),
                Some(recipe_payload(name, self.tag_id().await, ingredients)),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.text());
        reply.json()["id"].as_i64().unwrap()
    }

    async fn tag_by_slug(&self, slug: &str) -> i64 {
        sqlx::query_scalar("SELECT id FROM tags WHERE slug = $1")
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    async fn recipe_links(&self, id: i64) -> (Vec<i64>, Vec<(i64, i32)>) {
        let tags = sqlx::query_scalar("SELECT tag_id FROM recipe_tags WHERE recipe_id = $1 ORDER BY tag_id")
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .unwrap();
        let ingredients = sqlx::query_as(
            "SELECT ingredient_id, amount FROM recipe_ingredients WHERE recipe_id = $1 ORDER BY ingredient_id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .unwrap();
        (tags, ingredients)
    }

    async fn cart_size(&self, user: i64) -> i64 {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM shopping_cart_recipes r \
             JOIN shopping_carts c ON c.id = r.cart_id WHERE c.user_id = $1",
        )
        .bind(user)
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }

    async fn recipes_named(&self, name: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE name = $1")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

fn recipe_payload(name: &str, tag: i64, ingredients: Value) -> Value {
    json!({
        "name": name,
        "text": "Mix everything.",
        "image": PNG,
        "cooking_time": 15,
        "tags": [tag],
        "ingredients": ingredients
    })
}

fn unique(prefix: &str) -> String {
    format!("{prefix} {}", Uuid::new_v4().simple())
}

#[tokio::test]
#[serial]
#[ignore = "requires running PostgreSQL and Redis instances"]
async fn test_recipe_round_trip() {
    let h = harness().await;
    let (author, token) = h.user().await;
    let flour = h.ingredient("Flour", "g").await;

    let id = h
        .recipe(&token, &unique("Bread"), json!([{ "id": flour, "amount": 500 }]))
        .await;

    let reply = h.call(Method::GET, &format!("/api/recipes/{id}/"), None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    let recipe = reply.json();
    assert_eq!(recipe["author"]["id"], author);

    let tag = h.tag_id().await;
    let (name, slug): (String, String) = sqlx::query_as("SELECT name, slug FROM tags WHERE id = $1")
        .bind(tag)
        .fetch_one(&h.pool)
        .await
        .unwrap();
    let tags = recipe["tags"].as_array().unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0]["id"], tag);
    assert_eq!(tags[0]["name"], name.as_str());
    assert_eq!(tags[0]["slug"], slug.as_str());

    assert_eq!(recipe["ingredients"].as_array().unwrap().len(), 1);
    assert_eq!(recipe["ingredients"][0]["id"], flour);
    assert_eq!(recipe["ingredients"][0]["name"], "Flour");
    assert_eq!(recipe["ingredients"][0]["amount"], 500);
    assert_eq!(recipe["ingredients"][0]["measurement_unit"], "g");
    assert_eq!(recipe["is_favorited"], false);
    assert!(recipe["image"].as_str().unwrap().starts_with("/media/recipes/images/"));
}

#[tokio::test]
#[serial]
#[ignore = "requires running PostgreSQL and Redis instances"]
async fn test_rejected_recipes_leave_no_rows() {
    let h = harness().await;
    let (_, token) = h.user().await;
    let tag = h.tag_id().await;
    let sugar = h.ingredient("Sugar", "g").await;

    let name = unique("Too quick");
    let mut payload = recipe_payload(&name, tag, json!([{ "id": sugar, "amount": 5 }]));
    payload["cooking_time"] = json!(0);
    let reply = h.call(Method::POST, "/api/recipes/", Some(&token), Some(payload)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["cooking_time"][0], messages::cooking_time_too_low(1));
    assert_eq!(h.recipes_named(&name).await, 0);

    let name = unique("Twice tagged");
    let mut payload = recipe_payload(&name, tag, json!([{ "id": sugar, "amount": 5 }]));
    payload["tags"] = json!([tag, tag]);
    let reply = h.call(Method::POST, "/api/recipes/", Some(&token), Some(payload)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(h.recipes_named(&name).await, 0);

    let name = unique("Twice sugared");
    let payload = recipe_payload(
        &name,
        tag,
        json!([{ "id": sugar, "amount": 5 }, { "id": sugar, "amount": 3 }]),
    );
    let reply = h.call(Method::POST, "/api/recipes/", Some(&token), Some(payload)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(h.recipes_named(&name).await, 0);
}

#[tokio::test]
#[serial]
#[ignore = "requires running PostgreSQL and Redis instances"]
async fn test_only_the_author_may_edit() {
    let h = harness().await;
    let (_, author_token) = h.user().await;
    let (_, other_token) = h.user().await;
    let salt = h.ingredient("Salt", "g").await;

    let id = h
        .recipe(&author_token, &unique("Soup"), json!([{ "id": salt, "amount": 2 }]))
        .await;
    let payload = recipe_payload(&unique("Stolen soup"), h.tag_id().await, json!([{ "id": salt, "amount": 2 }]));

    let reply = h
        .call(Method::PATCH, &format!("/api/recipes/{id}/"), Some(&other_token), Some(payload.clone()))
        .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = h
        .call(Method::PUT, &format!("/api/recipes/{id}/"), Some(&author_token), Some(payload))
        .await;
    assert_eq!(reply.status, StatusCode::OK);

    let reply = h
        .call(Method::DELETE, &format!("/api/recipes/{id}/"), Some(&other_token), None)
        .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(h.recipe_links(id).await.1, vec![(salt, 2)]);
}

#[tokio::test]
#[serial]
#[ignore = "requires running PostgreSQL and Redis instances"]
async fn test_update_replaces_links_and_rejected_update_changes_nothing() {
    let h = harness().await;
    let (_, token) = h.user().await;
    let breakfast = h.tag_by_slug("breakfast").await;
    let dinner = h.tag_by_slug("dinner").await;
    let milk = h.ingredient("Milk", "ml").await;
    let oats = h.ingredient("Oats", "g").await;
    let honey = h.ingredient("Honey", "g").await;

    let original = unique("Porridge");
    let id = h
        .recipe(
            &token,
            &original,
            json!([{ "id": milk, "amount": 200 }, { "id": oats, "amount": 50 }]),
        )
        .await;
    let uri = format!("/api/recipes/{id}/");

    let renamed = unique("Honey porridge");
    let mut payload = recipe_payload(&renamed, breakfast, json!([{ "id": honey, "amount": 10 }]));
    payload["tags"] = json!([breakfast, dinner]);
    let reply = h.call(Method::PUT, &uri, Some(&token), Some(payload)).await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.text());

    let mut expected_tags = vec![breakfast, dinner];
    expected_tags.sort();
    let (tags, ingredients) = h.recipe_links(id).await;
    assert_eq!(tags, expected_tags);
    assert_eq!(ingredients, vec![(honey, 10)]);

    let mut rejected = recipe_payload(&unique("Broken"), breakfast, json!([{ "id": milk, "amount": 1 }]));
    rejected["tags"] = json!([dinner, dinner]);
    let reply = h.call(Method::PUT, &uri, Some(&token), Some(rejected)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["tags"][0], messages::TAGS_NOT_UNIQUE);

    let missing_ingredient = recipe_payload(&unique("Ghost"), breakfast, json!([{ "id": 0, "amount": 1 }]));
    let reply = h.call(Method::PUT, &uri, Some(&token), Some(missing_ingredient)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = h.call(Method::GET, &uri, None, None).await;
    assert_eq!(reply.json()["name"], renamed.as_str());
    assert_eq!(h.recipe_links(id).await, (expected_tags, vec![(honey, 10)]));
    assert_eq!(h.recipes_named(&original).await, 0);
}

#[tokio::test]
#[serial]
#[ignore = "requires running PostgreSQL and Redis instances"]
async fn test_unsubscribe_requires_a_subscription() {
    let h = harness().await;
    let (me, token) = h.user().await;
    let (author, _) = h.user().await;

    let own = h
        .call(Method::DELETE, &format!("/api/users/{me}/subscribe/"), Some(&token), None)
        .await;
    assert_eq!(own.status, StatusCode::BAD_REQUEST);
    assert_eq!(own.json(), json!({ "errors": messages::UNSUBSCRIBE_NOT_SUBSCRIBED }));

    let uri = format!("/api/users/{author}/subscribe/");
    let never = h.call(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(never.status, StatusCode::BAD_REQUEST);
    assert_eq!(never.json(), json!({ "errors": messages::UNSUBSCRIBE_NOT_SUBSCRIBED }));

    assert_eq!(h.call(Method::GET, &uri, Some(&token), None).await.status, StatusCode::CREATED);
    assert_eq!(h.call(Method::DELETE, &uri, Some(&token), None).await.status, StatusCode::NO_CONTENT);

    let again = h.call(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(again.json(), json!({ "errors": messages::UNSUBSCRIBE_NOT_SUBSCRIBED }));

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE user_id = $1")
        .bind(me)
        .fetch_one(&h.pool)
        .await
        .unwrap();
    assert_eq!(rows, 0);
}

#[tokio::test]
#[serial]
#[ignore = "requires running PostgreSQL and Redis instances"]
async fn test_removing_a_recipe_not_in_the_cart_is_rejected() {
    let h = harness().await;
    let (user, token) = h.user().await;
    let bean = h.ingredient("Bean", "g").await;
    let kept = h.recipe(&token, &unique("Chili"), json!([{ "id": bean, "amount": 300 }])).await;
    let absent = h.recipe(&token, &unique("Salad"), json!([{ "id": bean, "amount": 50 }])).await;

    let added = h
        .call(Method::GET, &format!("/api/recipes/{kept}/shopping_cart/"), Some(&token), None)
        .await;
    assert_eq!(added.status, StatusCode::CREATED);

    assert_eq!(h.cart_size(user).await, 1);

    let reply = h
        .call(Method::DELETE, &format!("/api/recipes/{absent}/shopping_cart/"), Some(&token), None)
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json(), json!({ "errors": messages::SHOPPING_CART_NOT_PRESENT }));
    assert_eq!(h.cart_size(user).await, 1);

    let reply = h
        .call(Method::DELETE, &format!("/api/recipes/{kept}/shopping_cart/"), Some(&token), None)
        .await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);
    assert_eq!(h.cart_size(user).await, 0);
}

#[tokio::test]
#[serial]
#[ignore = "requires running PostgreSQL and Redis instances"]
async fn test_racing_registration_reports_the_taken_field() {
    let h = harness().await;
    let name = format!("racer{}", &Uuid::new_v4().simple().to_string()[..12]);
    let repository = UserRepository::new(h.pool.clone());
    let payload = |email: String, username: String| CreateUserRequest {
        email,
        username,
        first_name: "Rita".to_string(),
        last_name: "Race".to_string(),
        password: "s3cret-pass".to_string(),
    };

    repository
        .create(&payload(format!("{name}@example.com"), name.clone()))
        .await
        .unwrap();

    let err = repository
        .create(&payload(format!("{}@EXAMPLE.com", name.to_uppercase()), format!("{name}x")))
        .await
        .unwrap_err();
    assert_eq!(unique_user_field(&err), Some("email"));

    let err = repository
        .create(&payload(format!("other{name}@example.com"), name.clone()))
        .await
        .unwrap_err();
    assert_eq!(unique_user_field(&err), Some("username"));
}

#[tokio::test]
#[serial]
#[ignore = "requires running PostgreSQL and Redis instances"]
async fn test_favorite_twice_is_rejected() {
    let h = harness().await;
    let (user, token) = h.user().await;
    let egg = h.ingredient("Egg", "pcs").await;
    let id = h.recipe(&token, &unique("Omelette"), json!([{ "id": egg, "amount": 3 }])).await;
    let uri = format!("/api/recipes/{id}/favorite/");

    let first = h.call(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.json()["id"], id);

    let second = h.call(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(second.status, StatusCode::BAD_REQUEST);
    assert_eq!(second.json(), json!({ "errors": messages::FAVORITE_ALREADY_EXISTS }));

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favorites WHERE user_id = $1 AND recipe_id = $2")
        .bind(user)
        .bind(id)
        .fetch_one(&h.pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);

    let listed = h
        .call(Method::GET, "/api/recipes/?is_favorited=1", Some(&token), None)
        .await;
    assert_eq!(listed.json()["results"][0]["id"], id);

    let removed = h.call(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);
    let again = h.call(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(again.json(), json!({ "errors": messages::FAVORITE_DOES_NOT_EXIST }));
}

#[tokio::test]
#[serial]
#[ignore = "requires running PostgreSQL and Redis instances"]
async fn test_subscriptions() {
    let h = harness().await;
    let (me, token) = h.user().await;
    let (author, author_token) = h.user().await;
    let rice = h.ingredient("Rice", "g").await;
    for name in ["Risotto", "Pilaf", "Sushi"] {
        h.recipe(&author_token, &unique(name), json!([{ "id": rice, "amount": 100 }])).await;
    }

    let own = h
        .call(Method::GET, &format!("/api/users/{me}/subscribe/"), Some(&token), None)
        .await;
    assert_eq!(own.status, StatusCode::BAD_REQUEST);
    assert_eq!(own.json(), json!({ "errors": messages::SUBSCRIBE_TO_YOURSELF }));

    let uri = format!("/api/users/{author}/subscribe/?recipes_limit=2");
    let created = h.call(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(created.status, StatusCode::CREATED);
    let body = created.json();
    assert_eq!(body["is_subscribed"], true);
    assert_eq!(body["recipes"].as_array().unwrap().len(), 2);
    assert_eq!(body["recipes_count"], 3);

    let twice = h.call(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(twice.json(), json!({ "errors": messages::SUBSCRIBE_TWICE }));

    let listed = h
        .call(Method::GET, "/api/users/subscriptions/", Some(&token), None)
        .await;
    assert_eq!(listed.json()["count"], 1);
    assert_eq!(listed.json()["results"][0]["id"], author);

    let missing = h
        .call(Method::GET, "/api/users/0/subscribe/", Some(&token), None)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
#[ignore = "requires running PostgreSQL and Redis instances"]
async fn test_shopping_cart_download_sums_ingredients() {
    let h = harness().await;
    let (_, token) = h.user().await;
    let salt = h.ingredient("Salt", "g").await;
    let potato = h.ingredient("Potato", "pcs").await;
    let carrot = h.ingredient("Carrot", "pcs").await;

    let download = "/api/recipes/download_shopping_cart/";
    let empty = h.call(Method::GET, download, Some(&token), None).await;
    assert_eq!(empty.json(), json!({ "errors": messages::SHOPPING_LIST_DOES_NOT_EXIST }));

    let first = h
        .recipe(
            &token,
            &unique("Mash"),
            json!([{ "id": salt, "amount": 5 }, { "id": potato, "amount": 4 }]),
        )
        .await;
    let second = h
        .recipe(
            &token,
            &unique("Stew"),
            json!([{ "id": salt, "amount": 3 }, { "id": carrot, "amount": 2 }]),
        )
        .await;
    for id in [first, second] {
        let added = h
            .call(Method::GET, &format!("/api/recipes/{id}/shopping_cart/"), Some(&token), None)
            .await;
        assert_eq!(added.status, StatusCode::CREATED);
    }

    let twice = h
        .call(Method::GET, &format!("/api/recipes/{first}/shopping_cart/"), Some(&token), None)
        .await;
    assert_eq!(twice.json(), json!({ "errors": messages::SHOPPING_CART_ALREADY_ADDED }));

    let reply = h.call(Method::GET, download, Some(&token), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    let text = reply.text();
    assert_eq!(text.matches("Salt (g)").count(), 1);
    assert!(text.contains("Salt (g) — 8\r\n"));
    assert!(text.contains("Potato (pcs) — 4\r\n"));
    assert!(text.contains("Carrot (pcs) — 2\r\n"));
}

#[tokio::test]
#[serial]
#[ignore = "requires running PostgreSQL and Redis instances"]
async fn test_blocked_user_gets_no_token() {
    let h = harness().await;
    let name = format!("blocked{}", &Uuid::new_v4().simple().to_string()[..12]);
    let email = format!("{name}@example.com");
    let created = h
        .call(
            Method::POST,
            "/api/users/",
            None,
            Some(json!({
                "email": email,
                "username": name,
                "first_name": "Bob",
                "last_name": "Stone",
                "password": "s3cret-pass"
            })),
        )
        .await;
    let id = created.json()["id"].as_i64().unwrap();
    sqlx::query("UPDATE users SET is_blocked = TRUE WHERE id = $1")
        .bind(id)
        .execute(&h.pool)
        .await
        .unwrap();

    let reply = h
        .call(
            Method::POST,
            "/api/auth/token/login/",
            None,
            Some(json!({ "email": email, "password": "s3cret-pass" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json(), json!({ "errors": messages::USER_BLOCKED }));
}

#[tokio::test]
#[serial]
#[ignore = "requires running PostgreSQL and Redis instances"]
async fn test_logout_revokes_the_token() {
    let h = harness().await;
    let (_, token) = h.user().await;

    let me = h.call(Method::GET, "/api/users/me/", Some(&token), None).await;
    assert_eq!(me.status, StatusCode::OK);

    let logout = h.call(Method::POST, "/api/auth/token/logout/", Some(&token), None).await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);

    let me = h.call(Method::GET, "/api/users/me/", Some(&token), None).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
}
