// src/tests/load_tests.rs
use super::utils::{at, batch, listing, stored_listings, test_env};
use crate::errors::EtlError;
use crate::etl::Loader;

#[test]
fn loading_the_same_batch_twice_is_a_no_op() {
    let env = test_env();
    let loader = Loader::new(env.database());
    let b = batch(
        "johannesburg",
        at(9, 0),
        vec![
            listing(2001, "Sandton High-Rise", 1200.0, "johannesburg", at(9, 0)),
            listing(2002, "Budget Room", 300.0, "johannesburg", at(9, 0)),
        ],
    );

    assert_eq!(loader.load(&b).unwrap(), 2);
    let once = stored_listings(&env.database());
    assert_eq!(loader.load(&b).unwrap(), 2);
    let twice = stored_listings(&env.database());

    assert_eq!(once, b.listings);
    assert_eq!(once, twice);
}

#[test]
fn existing_id_takes_the_incoming_values() {
    let env = test_env();
    let loader = Loader::new(env.database());

    loader
        .load(&batch(
            "cape_town",
            at(9, 0),
            vec![
                listing(1001, "Seaside Apartment", 850.0, "cape_town", at(9, 0)),
                listing(1002, "Cozy Studio", 500.0, "cape_town", at(9, 0)),
            ],
        ))
        .unwrap();

    let mut updated = listing(1001, "Seaside Apartment (renovated)", 990.0, "cape_town", at(10, 30));
    updated.host_id = None;
    updated.availability_365 = Some(90);
    loader
        .load(&batch("cape_town", at(10, 30), vec![updated.clone()]))
        .unwrap();

    let stored = stored_listings(&env.database());
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0], updated);
    // untouched by the second batch
    assert_eq!(stored[1].name.as_deref(), Some("Cozy Studio"));
    assert_eq!(stored[1].last_updated, at(9, 0));
}

#[test]
fn failing_row_rolls_back_the_whole_batch() {
    let env = test_env();
    let db = env.database();

    // Pre-existing table with a stricter schema than the pipeline's. The loader
    // never alters an existing table, so the NOT NULL stays in force.
    db.with_conn(|conn| {
        conn.execute_batch(
            r#"
            CREATE TABLE listings (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                host_id INTEGER,
                neighbourhood TEXT,
                room_type TEXT,
                price REAL,
                latitude REAL,
                longitude REAL,
                availability_365 INTEGER,
                city TEXT,
                ingestion_date TIMESTAMP,
                last_updated TIMESTAMP
            )
            "#,
        )
        .map_err(|e| EtlError::LoadFailure(e.to_string()))
    })
    .unwrap();

    let mut nameless = listing(2, "x", 100.0, "cape_town", at(9, 0));
    nameless.name = None;
    let b = batch(
        "cape_town",
        at(9, 0),
        vec![listing(1, "fine", 100.0, "cape_town", at(9, 0)), nameless],
    );

    match Loader::new(db.clone()).load(&b) {
        Err(EtlError::LoadFailure(msg)) => assert!(msg.contains("id 2"), "{msg}"),
        other => panic!("expected LoadFailure, got: {:?}", other),
    }
    assert!(stored_listings(&db).is_empty());
}

#[test]
fn existing_table_layout_is_left_alone() {
    let env = test_env();
    let db = env.database();
    db.with_conn(|conn| {
        conn.execute_batch(
            r#"
            CREATE TABLE listings (
                id INTEGER PRIMARY KEY,
                name TEXT, host_id INTEGER, neighbourhood TEXT, room_type TEXT,
                price REAL, latitude REAL, longitude REAL, availability_365 INTEGER,
                city TEXT, ingestion_date TIMESTAMP, last_updated TIMESTAMP,
                notes TEXT DEFAULT 'legacy'
            )
            "#,
        )
        .map_err(|e| EtlError::LoadFailure(e.to_string()))
    })
    .unwrap();

    Loader::new(db.clone())
        .load(&batch(
            "cape_town",
            at(9, 0),
            vec![listing(7, "Kept", 120.0, "cape_town", at(9, 0))],
        ))
        .unwrap();

    let notes: String = db
        .with_conn(|conn| {
            conn.query_row("SELECT notes FROM listings WHERE id = 7", [], |r| r.get(0))
                .map_err(|e| EtlError::Query(e.to_string()))
        })
        .unwrap();
    assert_eq!(notes, "legacy");
}

#[test]
fn empty_batch_creates_the_table_and_writes_nothing() {
    let env = test_env();
    let db = env.database();
    assert_eq!(
        Loader::new(db.clone())
            .load(&batch("cape_town", at(9, 0), vec![]))
            .unwrap(),
        0
    );
    assert!(db.exists());
    assert!(stored_listings(&db).is_empty());
}
