//! Integration tests for the extraction and import pipelines.
//!
//! Uses in-memory storage fakes, so these tests run without spreadsheet
//! files or a real backend.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rust_decimal_macros::dec;

use stowage_core::error::IngestError;
use stowage_core::import::{
    collect_rows, import_rows, load_preset, ImportOptions, ImportReport, ImportRowResult,
    RowOutcome,
};
use stowage_core::model::{CellValue, FieldValue};
use stowage_core::sniff::{self, FieldSemantic, SniffOptions, TargetColumn};
use stowage_core::store::{
    Consignee, ConsigneeDirectory, ImportCallback, ReceiptFields, ReceiptStore, StoreError,
    StoredReceipt,
};
use stowage_core::workbook::{Sheet, Workbook};

#[derive(Default)]
struct MemoryStore {
    receipts: Mutex<BTreeMap<String, StoredReceipt>>,
    unavailable: bool,
}

impl MemoryStore {
    fn get(&self, key: &str) -> Option<StoredReceipt> {
        self.receipts.lock().unwrap().get(key).cloned()
    }

    fn len(&self) -> usize {
        self.receipts.lock().unwrap().len()
    }
}

impl ReceiptStore for MemoryStore {
    fn find_existing(&self, key: &str) -> Result<Option<StoredReceipt>, StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("backend offline".into()));
        }
        Ok(self.receipts.lock().unwrap().get(key).cloned())
    }

    fn create(
        &self,
        key: &str,
        tracking_id: &str,
        fields: &ReceiptFields,
    ) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("backend offline".into()));
        }
        self.receipts.lock().unwrap().insert(
            key.to_string(),
            StoredReceipt {
                key: key.to_string(),
                tracking_id: tracking_id.to_string(),
                fields: fields.clone(),
            },
        );
        Ok(())
    }

    fn update(&self, key: &str, fields: &ReceiptFields) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("backend offline".into()));
        }
        let mut receipts = self.receipts.lock().unwrap();
        match receipts.get_mut(key) {
            Some(receipt) => {
                receipt.fields = fields.clone();
                Ok(())
            }
            None => Err(StoreError::Rejected(format!("no receipt under key '{key}'"))),
        }
    }
}

struct MemoryDirectory {
    marks: Vec<&'static str>,
}

impl MemoryDirectory {
    fn with_known_marks() -> MemoryDirectory {
        MemoryDirectory {
            marks: vec!["ACME-01", "BETA-02", "GAMMA-03"],
        }
    }
}

impl ConsigneeDirectory for MemoryDirectory {
    fn find_by_mark(&self, mark: &str) -> Result<Option<Consignee>, StoreError> {
        let needle = mark.trim().to_lowercase();
        Ok(self
            .marks
            .iter()
            .find(|m| m.to_lowercase() == needle)
            .map(|m| Consignee {
                shipping_mark: m.to_string(),
                name: format!("{m} Trading Ltd"),
            }))
    }
}

struct CountingCallback {
    calls: Arc<AtomicUsize>,
    created_seen: Arc<AtomicUsize>,
}

impl ImportCallback for CountingCallback {
    fn on_import_complete(&self, report: &ImportReport) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.created_seen.store(report.summary.created, Ordering::SeqCst);
    }
}

fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

fn num(f: f64) -> CellValue {
    CellValue::Number(f)
}

fn empty() -> CellValue {
    CellValue::Empty
}

/// Data row shaped like the goods_receipt contract.
fn receipt_row(mark: &str, date: &str, tracking: &str, cbm: f64) -> Vec<CellValue> {
    vec![
        text(mark),
        text(date),
        text("widgets"),
        num(12.0),
        num(cbm),
        num(100.0),
        text(tracking),
    ]
}

fn receipt_caption() -> Vec<CellValue> {
    vec![
        text("Mark"),
        text("Received"),
        text("Description"),
        text("CTNS"),
        text("CBM"),
        text("KG"),
        text("Tracking"),
    ]
}

fn outcome_of(results: &[ImportRowResult], row: usize) -> RowOutcome {
    results
        .iter()
        .find(|r| r.row == row)
        .unwrap_or_else(|| panic!("no result for row {row}"))
        .outcome
}

// ---------------------------------------------------------------------------
// Test 1: Header sniffed below banner rows, partial match accepted
// ---------------------------------------------------------------------------
#[test]
fn header_sniffed_below_banner_rows() {
    let workbook = Workbook {
        sheets: vec![Sheet::new(
            "Sheet1",
            vec![
                vec![text("ACME LOGISTICS CO., LTD"), empty(), empty(), empty()],
                vec![text("Goods Received 2024-03-15"), empty(), empty(), empty()],
                vec![
                    text("Shipping Mark"),
                    text("Date of Receipt"),
                    text("CBM"),
                    text("CTNS"),
                ],
                vec![text("ACME-01"), text("2024-03-15"), num(2.5), num(10.0)],
                vec![text("BETA-02"), text("2024-03-16"), num(1.2), num(4.0)],
            ],
        )],
    };
    let targets = vec![
        TargetColumn::named("shipping_mark"),
        TargetColumn::named("cbm"),
        TargetColumn::named("quantity"),
        TargetColumn::named("supply_tracking"),
    ];

    let extraction = sniff::extract(&workbook, &targets, &SniffOptions::default());

    let header = extraction.header.expect("header should be found");
    assert_eq!(header.sheet, "Sheet1");
    assert_eq!(header.header_row, 2);
    // Two of four targets matched: "quantity" does not match "CTNS" and
    // nothing matches "supply_tracking".
    assert_eq!(header.score, 0.5);
    assert_eq!(header.columns.len(), 2);
    assert_eq!(header.columns["shipping_mark"], 0);
    assert_eq!(header.columns["cbm"], 2);

    assert_eq!(extraction.records.len(), 2);
    let first = &extraction.records[0];
    assert_eq!(first.row, 3);
    assert_eq!(first.fields["shipping_mark"], FieldValue::Text("ACME-01".into()));
    assert_eq!(first.fields["cbm"], FieldValue::Decimal(dec!(2.5)));
    assert!(!first.fields.contains_key("quantity"));

    // Extraction holds no state: a second run over the same workbook
    // produces identical records.
    let again = sniff::extract(&workbook, &targets, &SniffOptions::default());
    assert_eq!(again.records, extraction.records);
}

// ---------------------------------------------------------------------------
// Test 2: Messy numeric text cleaned per semantic
// ---------------------------------------------------------------------------
#[test]
fn messy_numbers_cleaned_per_semantic() {
    let workbook = Workbook {
        sheets: vec![Sheet::new(
            "Sheet1",
            vec![
                vec![text("Mark"), text("CBM"), text("Amount")],
                vec![text("ACME-01"), text("2,500.00"), text("USD 1,250.50")],
                vec![text("BETA-02"), text("abc"), text("nan")],
            ],
        )],
    };
    let targets = vec![
        TargetColumn::named("mark"),
        TargetColumn::named("cbm"),
        TargetColumn::new("amount", FieldSemantic::Currency),
    ];

    let extraction = sniff::extract(&workbook, &targets, &SniffOptions::default());

    assert_eq!(extraction.records.len(), 2);
    let first = &extraction.records[0];
    assert_eq!(first.fields["cbm"], FieldValue::Decimal(dec!(2500.00)));
    assert_eq!(first.fields["amount"], FieldValue::Decimal(dec!(1250.50)));

    // "abc" cannot be read as a volume and "nan" is a placeholder; both
    // drop out silently, leaving only the mark.
    let second = &extraction.records[1];
    assert_eq!(second.fields.len(), 1);
    assert_eq!(second.fields["mark"], FieldValue::Text("BETA-02".into()));
}

// ---------------------------------------------------------------------------
// Test 3: No row clears the threshold anywhere
// ---------------------------------------------------------------------------
#[test]
fn no_header_yields_empty_extraction() {
    let workbook = Workbook {
        sheets: vec![Sheet::new(
            "Sheet1",
            vec![
                vec![text("Invoice"), text("Period"), text("Notes")],
                vec![text("INV-1"), text("2024-Q1"), text("n/a")],
            ],
        )],
    };
    let targets = vec![
        TargetColumn::named("shipping_mark"),
        TargetColumn::named("cbm"),
    ];

    let extraction = sniff::extract(&workbook, &targets, &SniffOptions::default());

    assert!(extraction.header.is_none());
    assert!(extraction.records.is_empty());
    assert!(extraction.skipped_rows.is_empty());
}

// ---------------------------------------------------------------------------
// Test 4: Import mixes created, skipped and error rows
// ---------------------------------------------------------------------------
#[test]
fn import_reports_every_row() {
    let contract = load_preset("goods_receipt").unwrap();
    let sheet = Sheet::new(
        "import",
        vec![
            receipt_caption(),
            receipt_row("ACME-01", "2024-03-15", "TRK-1", 2.5),
            vec![empty(), empty(), empty(), empty(), empty(), empty(), empty()],
            receipt_row("BETA-02", "16/03/2024", "TRK-2", 1.0),
            receipt_row("DELTA-09", "2024-03-17", "TRK-3", 4.0),
            receipt_row("", "2024-03-18", "TRK-4", 1.5),
        ],
    );
    let store = MemoryStore::default();
    let directory = MemoryDirectory::with_known_marks();

    let report = import_rows(
        &sheet,
        &contract,
        &store,
        &directory,
        &ImportOptions::default(),
    )
    .unwrap();

    assert_eq!(report.summary.total_rows, 5);
    assert_eq!(report.summary.created, 2);
    assert_eq!(report.summary.updated, 0);
    assert_eq!(report.summary.skipped, 1);
    assert_eq!(report.summary.errors, 2);

    assert_eq!(outcome_of(&report.results, 2), RowOutcome::Created);
    assert_eq!(outcome_of(&report.results, 3), RowOutcome::Skipped);
    assert_eq!(outcome_of(&report.results, 4), RowOutcome::Created);
    assert_eq!(outcome_of(&report.results, 5), RowOutcome::Error);
    assert_eq!(outcome_of(&report.results, 6), RowOutcome::Error);

    // DELTA-09 is not a known consignee; nothing must be created for it.
    let unknown = report.results.iter().find(|r| r.row == 5).unwrap();
    assert!(unknown.message.as_deref().unwrap().contains("DELTA-09"));
    assert_eq!(store.len(), 2);

    // Dates pass through the format ladder: day-first for slashed values.
    let beta = store.get("beta-02|trk-2").expect("BETA-02 stored");
    assert_eq!(
        beta.fields["received_date"],
        FieldValue::Date(chrono::NaiveDate::from_ymd_opt(2024, 3, 16).unwrap())
    );
    assert!(!beta.tracking_id.is_empty());
}

// ---------------------------------------------------------------------------
// Test 5: Duplicate keys collapse to the last row in the sheet
// ---------------------------------------------------------------------------
#[test]
fn duplicate_rows_resolve_last_write_wins() {
    let contract = load_preset("goods_receipt").unwrap();
    let sheet = Sheet::new(
        "import",
        vec![
            receipt_caption(),
            receipt_row("ACME-01", "2024-03-15", "TRK-1", 1.0),
            receipt_row("BETA-02", "2024-03-15", "TRK-2", 2.0),
            receipt_row("acme-01", "2024-03-15", "trk-1", 9.9),
        ],
    );
    let store = MemoryStore::default();
    let directory = MemoryDirectory::with_known_marks();

    let report = import_rows(
        &sheet,
        &contract,
        &store,
        &directory,
        &ImportOptions::default(),
    )
    .unwrap();

    // Both ACME rows were examined but only the later one has a result;
    // the earlier occurrence is absorbed by the deduplication.
    assert_eq!(report.summary.total_rows, 3);
    assert_eq!(report.summary.created, 2);
    assert_eq!(report.summary.absorbed(), 1);
    assert!(report.results.iter().all(|r| r.row != 2));
    assert_eq!(outcome_of(&report.results, 4), RowOutcome::Created);

    let acme = store.get("acme-01|trk-1").expect("ACME-01 stored once");
    assert_eq!(acme.fields["cbm"], FieldValue::Decimal(dec!(9.9)));
}

// ---------------------------------------------------------------------------
// Test 6: Re-importing the same sheet updates instead of duplicating
// ---------------------------------------------------------------------------
#[test]
fn reimport_updates_and_keeps_tracking_ids() {
    let contract = load_preset("goods_receipt").unwrap();
    let sheet = Sheet::new(
        "import",
        vec![
            receipt_caption(),
            receipt_row("ACME-01", "2024-03-15", "TRK-1", 2.5),
            receipt_row("BETA-02", "2024-03-16", "TRK-2", 1.0),
        ],
    );
    let store = MemoryStore::default();
    let directory = MemoryDirectory::with_known_marks();

    let first = import_rows(
        &sheet,
        &contract,
        &store,
        &directory,
        &ImportOptions::default(),
    )
    .unwrap();
    assert_eq!(first.summary.created, 2);
    let minted = store.get("acme-01|trk-1").unwrap().tracking_id;

    let second = import_rows(
        &sheet,
        &contract,
        &store,
        &directory,
        &ImportOptions::default(),
    )
    .unwrap();

    assert_eq!(second.summary.created, 0);
    assert_eq!(second.summary.updated, 2);
    assert_eq!(store.len(), 2);
    assert_eq!(store.get("acme-01|trk-1").unwrap().tracking_id, minted);
}

// ---------------------------------------------------------------------------
// Test 7: Unavailable backend aborts the run
// ---------------------------------------------------------------------------
#[test]
fn unavailable_store_aborts_import() {
    let contract = load_preset("goods_receipt").unwrap();
    let sheet = Sheet::new(
        "import",
        vec![
            receipt_caption(),
            receipt_row("ACME-01", "2024-03-15", "TRK-1", 2.5),
        ],
    );
    let store = MemoryStore {
        unavailable: true,
        ..MemoryStore::default()
    };
    let directory = MemoryDirectory::with_known_marks();

    let err = import_rows(
        &sheet,
        &contract,
        &store,
        &directory,
        &ImportOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        IngestError::Storage(StoreError::Unavailable(_))
    ));
}

// ---------------------------------------------------------------------------
// Test 8: Dry run reports outcomes without writing
// ---------------------------------------------------------------------------
#[test]
fn dry_run_leaves_store_untouched() {
    let contract = load_preset("goods_receipt").unwrap();
    let store = MemoryStore::default();
    let directory = MemoryDirectory::with_known_marks();

    let seeded: ReceiptFields = [("cbm".to_string(), FieldValue::Decimal(dec!(1.0)))]
        .into_iter()
        .collect();
    store.create("acme-01|trk-1", "seed-id", &seeded).unwrap();

    let sheet = Sheet::new(
        "import",
        vec![
            receipt_caption(),
            receipt_row("ACME-01", "2024-03-15", "TRK-1", 9.9),
            receipt_row("BETA-02", "2024-03-16", "TRK-2", 1.0),
        ],
    );

    let report = import_rows(
        &sheet,
        &contract,
        &store,
        &directory,
        &ImportOptions {
            dry_run: true,
            ..ImportOptions::default()
        },
    )
    .unwrap();

    assert_eq!(report.summary.updated, 1);
    assert_eq!(report.summary.created, 1);

    assert_eq!(store.len(), 1);
    let acme = store.get("acme-01|trk-1").unwrap();
    assert_eq!(acme.tracking_id, "seed-id");
    assert_eq!(acme.fields["cbm"], FieldValue::Decimal(dec!(1.0)));
}

// ---------------------------------------------------------------------------
// Test 9: Callbacks fire once with the final report
// ---------------------------------------------------------------------------
#[test]
fn callback_fires_once_after_the_run() {
    let contract = load_preset("goods_receipt").unwrap();
    let store = MemoryStore::default();
    let directory = MemoryDirectory::with_known_marks();
    let sheet = Sheet::new(
        "import",
        vec![
            receipt_caption(),
            receipt_row("ACME-01", "2024-03-15", "TRK-1", 2.5),
        ],
    );

    let calls = Arc::new(AtomicUsize::new(0));
    let created_seen = Arc::new(AtomicUsize::new(0));
    let options = ImportOptions {
        dry_run: false,
        callbacks: vec![Box::new(CountingCallback {
            calls: Arc::clone(&calls),
            created_seen: Arc::clone(&created_seen),
        })],
    };

    let report = import_rows(&sheet, &contract, &store, &directory, &options).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(created_seen.load(Ordering::SeqCst), report.summary.created);
}

// ---------------------------------------------------------------------------
// Test 10: collect_rows alone never touches storage
// ---------------------------------------------------------------------------
#[test]
fn collect_rows_is_pure() {
    let contract = load_preset("goods_receipt").unwrap();
    let sheet = Sheet::new(
        "import",
        vec![
            receipt_caption(),
            receipt_row("ACME-01", "2024-03-15", "TRK-1", 2.5),
            receipt_row("DELTA-09", "2024-03-17", "TRK-3", 4.0),
        ],
    );

    let collected = collect_rows(&sheet, &contract).unwrap();

    // Unknown marks surface during persistence, not collection.
    assert_eq!(collected.rows.len(), 2);
    assert!(collected.results.is_empty());
    assert_eq!(collected.rows[0].key, "acme-01|trk-1");
    assert_eq!(collected.rows[1].mark, "DELTA-09");
}
