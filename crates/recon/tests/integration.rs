use std::path::PathBuf;

use invaudit_recon::config::LoaderConfig;
use invaudit_recon::model::{Presence, RawTable, Status};
use invaudit_recon::{normalize, reconcile, Auditor, ReconError};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn grid(rows: &[&[&str]]) -> RawTable {
    RawTable::from_rows(rows.iter().map(|r| r.iter().copied()))
}

/// WMS export: two title lines, header on the third row.
fn wms_report() -> RawTable {
    grid(&[
        &["RELATÓRIO DE ESTOQUE POR GAVETA", "", "", "", "", ""],
        &["Filial 01", "", "", "", "", ""],
        &["GAVETA (YX-Desc.)", "MATERIAL", "DESCRIÇÃO", "LOTE", "QTD.GAVETA", "UN"],
        &["2ZG-G61b", "123", "Widget", "L1", "10", "UN"],
        &["2ZG-A10", "200", "Bolt", "B7", "1250kg", "KG"],
        &["2ZG-A2", "300", "Nut", "N1", "5", "UN"],
        &["2ZG-A2", "301", "Washer", "W1", "2", "UN"],
        &["", "", "", "", "", ""],
        &["1ZZ-B1", "999", "Orphan", "", "3", "UN"],
    ])
}

/// Hand-made count sheet with its own headers.
fn count_sheet() -> RawTable {
    grid(&[
        &["Posição", "Código", "Produto", "Lote", "Quantidade", "Observação"],
        &["G61b", "123", "Widget", "L1", "8", ""],
        &["A10", "200", "Bolt", "b7", "1250", ""],
        &["A2", "300", "Nut", "N1", "5", "caixa aberta"],
        &["A2", "301", "Washer", "W1", "2", ""],
        &["C3", "777", "Extra", "", "1", ""],
    ])
}

// -------------------------------------------------------------------------
// Full pipeline
// -------------------------------------------------------------------------

#[test]
fn wms_vs_count_sheet() {
    let report = Auditor::default()
        .compare(&wms_report(), &count_sheet())
        .unwrap();

    let view: Vec<(String, String, String)> = report
        .rows
        .iter()
        .map(|r| (r.keys[0].clone(), r.keys[1].clone(), r.status.to_string()))
        .collect();
    assert_eq!(
        view,
        vec![
            ("A2".into(), "300".into(), "observacao".into()),
            ("A2".into(), "301".into(), "OK".into()),
            ("A10".into(), "200".into(), "OK".into()),
            ("B1".into(), "999".into(), "ausente_no_fisico".into()),
            ("C3".into(), "777".into(), "ausente_no_wms".into()),
            ("G61b".into(), "123".into(), "quantidade".into()),
        ]
    );

    let g61b = &report.rows[5];
    assert_eq!(g61b.quantidade_wms, "10");
    assert_eq!(g61b.quantidade_fisico, "8");
    assert_eq!(g61b.diferenca, "-2");

    let summary = &report.summary;
    assert_eq!(summary.total_rows, 6);
    assert_eq!(summary.ok, 2);
    assert_eq!(summary.divergent, 2);
    assert_eq!(summary.ausente_no_fisico, 1);
    assert_eq!(summary.ausente_no_wms, 1);
    assert_eq!(report.meta.official_rows, 5);
    assert_eq!(report.meta.physical_rows, 5);
}

#[test]
fn report_serializes_to_json() {
    let report = Auditor::default()
        .compare(&wms_report(), &count_sheet())
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["keys"], serde_json::json!(["gaveta", "cod", "produto"]));
    assert_eq!(json["summary"]["ok"], 2);
    assert_eq!(json["rows"][5]["status"], "quantidade");
    assert_eq!(json["rows"][3]["presence"], "left_only");
}

#[test]
fn presence_only_official_row() {
    let official = normalize(&grid(&[&["cod", "quantidade"], &["999", "4"]])).unwrap();
    let physical = normalize(&grid(&[&["cod", "quantidade"]])).unwrap();
    let report = reconcile(&official, &physical);
    assert_eq!(report.rows.len(), 1);
    let row = &report.rows[0];
    assert_eq!(row.status, Status::MissingInPhysical);
    assert_eq!(row.presence, Presence::LeftOnly);
    assert_eq!(row.quantidade_fisico, "");
    assert_eq!(row.lote_fisico, "");
    assert_eq!(row.observacao_fisico, "");
}

#[test]
fn not_tabular_input_fails() {
    let err = Auditor::default()
        .compare(&RawTable::default(), &count_sheet())
        .unwrap_err();
    assert!(matches!(err, ReconError::NoHeader));
    assert_eq!(err.to_string(), "input is not tabular: no header row found");
}

// -------------------------------------------------------------------------
// Configured loader
// -------------------------------------------------------------------------

#[test]
fn custom_alias_config_from_fixture() {
    let toml = std::fs::read_to_string(fixtures_dir().join("custom-aliases.toml")).unwrap();
    let config = LoaderConfig::from_toml(&toml).unwrap();
    let auditor = Auditor::new(&config).unwrap();

    let sheet = grid(&[
        &["Location", "Item", "Description", "Batch", "Counted", "Notes"],
        &["X-A1", "1", "Thing", "L", "2", ""],
    ]);
    let table = auditor.normalize(&sheet).unwrap();
    assert_eq!(table.rows, vec![vec!["A1", "1", "Thing", "L", "2", ""]]);

    // Official layout disabled: row 0 is the header even for a WMS report.
    let wms = auditor.normalize(&wms_report()).unwrap();
    assert!(wms.column_values("cod").iter().all(|c| c.is_empty()));
}

#[test]
fn templates_from_wms_report() {
    let auditor = Auditor::default();

    let blind = auditor.blind_template(&wms_report()).unwrap();
    assert_eq!(blind.len(), 5);
    assert!(blind.column_values("quantidade").iter().all(|q| q.is_empty()));
    assert_eq!(blind.value(0, "gaveta"), Some("G61b"));

    let bins = auditor.bin_template(&wms_report()).unwrap();
    assert_eq!(bins.column_values("gaveta"), vec!["A2", "A10", "B1", "G61b"]);
}
