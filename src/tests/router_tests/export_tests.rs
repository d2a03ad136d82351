// src/tests/router_tests/export_tests.rs

use crate::db::{properties, scrapes};
use crate::domain::property::PropertyRecord;
use crate::router::handle;
use crate::tests::utils::{body_bytes, body_json, make_db, request, test_state};

fn record(id: &str) -> PropertyRecord {
    PropertyRecord {
        id: id.to_string(),
        url: format!("https://www.zonaprop.com.ar/propiedades/depto-{id}.html"),
        operacion: "Venta".into(),
        precio: "120000".into(),
        moneda: "USD".into(),
        ..Default::default()
    }
}

#[test]
fn export_downloads_a_workbook() {
    let db = make_db("export_xlsx");
    db.with_conn(|conn| {
        properties::upsert(conn, &record("49870001"))?;
        properties::upsert(conn, &record("49870002"))
    })
    .unwrap();
    let state = test_state(db);

    let mut resp = handle(request("GET", "/export.xlsx"), &state).unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(
        resp.headers()["Content-Type"],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert!(resp.headers()["Content-Disposition"]
        .to_str()
        .unwrap()
        .contains("propiedades.xlsx"));

    let bytes = body_bytes(&mut resp);
    assert!(bytes.starts_with(b"PK"));
}

#[test]
fn export_of_empty_store_still_has_headers() {
    let state = test_state(make_db("export_empty"));

    let mut resp = handle(request("GET", "/export.xlsx"), &state).unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    assert!(body_bytes(&mut resp).starts_with(b"PK"));
}

#[test]
fn runs_lists_recorded_scrapes() {
    let db = make_db("runs");
    db.with_conn(|conn| {
        let id = scrapes::start_scrape_run(conn, "https://www.zonaprop.com.ar/inmobiliarias/a_1-inmuebles.html", 1_700_000_000)?;
        scrapes::end_scrape_run(
            conn,
            id,
            1_700_000_600,
            &scrapes::RunOutcome {
                pages_fetched: 2,
                listings_discovered: 31,
                records_saved: 30,
                error: None,
            },
        )
    })
    .unwrap();
    let state = test_state(db);

    let mut resp = handle(request("GET", "/runs"), &state).unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let runs = body_json(&mut resp);
    let runs = runs.as_array().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0]["listings_discovered"], 31);
    assert_eq!(runs[0]["records_saved"], 30);
    assert_eq!(runs[0]["success"], true);
}
