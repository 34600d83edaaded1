//! End-to-end search flow against a mock catalog and image host.

use itemdex::bot::delivery::{plan_batch, BatchControl};
use itemdex::catalog::{Catalog, CatalogError};
use itemdex::http::create_http_client;
use itemdex::images::{ImageClient, ImageFetch, ImageMode};

#[tokio::test]
async fn catalog_load_and_search_flow() {
    let mut server = mockito::Server::new_async().await;
    let body = serde_json::json!([
        {"Id": 909050011, "name": "Bunny Hat", "Icon": "bunny_hat_icon"},
        {"Id": 909050012, "name": "Fox Mask"},
    ])
    .to_string();
    let _mock = server
        .mock("GET", "/items.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await;

    let client = create_http_client();
    let url = format!("{}/items.json", server.url());
    let catalog = Catalog::load(&client, &url).await.expect("catalog loads");
    assert_eq!(catalog.len(), 2);

    let matches = catalog.find("bun");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].id_text(), "909050011");

    // The icon field is searchable too.
    assert_eq!(catalog.find("hat_icon").len(), 1);

    // An ID substring finds the record regardless of case handling.
    assert_eq!(catalog.find("90905001").len(), 2);
}

#[tokio::test]
async fn catalog_load_reports_status_and_parse_failures() {
    let mut server = mockito::Server::new_async().await;
    let client = create_http_client();

    let _down = server
        .mock("GET", "/down.json")
        .with_status(500)
        .create_async()
        .await;
    let err = Catalog::load(&client, &format!("{}/down.json", server.url()))
        .await
        .expect_err("non-200 must fail");
    assert!(matches!(err, CatalogError::Status(_)), "got: {err}");

    let _bad = server
        .mock("GET", "/bad.json")
        .with_status(200)
        .with_body("not json at all")
        .create_async()
        .await;
    let err = Catalog::load(&client, &format!("{}/bad.json", server.url()))
        .await
        .expect_err("bad body must fail");
    assert!(matches!(err, CatalogError::Parse(_)), "got: {err}");
}

#[tokio::test]
async fn image_fetch_reports_availability_per_item() {
    let mut server = mockito::Server::new_async().await;
    let png_header: &[u8] = &[0x89, b'P', b'N', b'G'];
    let _ok = server
        .mock("GET", "/live/1")
        .with_status(200)
        .with_body(png_header)
        .create_async()
        .await;
    let _missing = server
        .mock("GET", "/advance/2")
        .with_status(404)
        .create_async()
        .await;

    let images = ImageClient::new(create_http_client(), server.url());

    match images.fetch("1", ImageMode::Live).await {
        ImageFetch::Fetched(bytes) => assert_eq!(&bytes[..], png_header),
        ImageFetch::Unavailable(reason) => panic!("expected bytes, got: {reason}"),
    }

    match images.fetch("2", ImageMode::Advance).await {
        ImageFetch::Unavailable(reason) => assert!(reason.contains("404"), "got: {reason}"),
        ImageFetch::Fetched(_) => panic!("expected unavailable"),
    }
}

#[test]
fn pagination_walks_every_match_exactly_once() {
    let mut delivered = 0;
    let mut offsets = Vec::new();
    let mut offset = 0;
    loop {
        let plan = plan_batch(25, offset);
        offsets.push(offset);
        delivered += plan.end - plan.start;
        match plan.control {
            BatchControl::Next(next) => offset = next,
            BatchControl::Done(total) => {
                assert_eq!(total, 25);
                break;
            }
        }
    }

    assert_eq!(offsets, vec![0, 10, 20]);
    assert_eq!(delivered, 25);
}
