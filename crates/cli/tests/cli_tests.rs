// Integration tests for the non-interactive commands (show, export, sheets).
// Run with: cargo test -p budgetgrid-cli --test cli_tests -- --nocapture
//
// Manual smoke test (needs a real TTY):
//   budgetgrid view tests/budget.xlsx
//   Verify: Enter shows details, Tab cycles grids, q exits and restores the terminal.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use rust_xlsxwriter::Workbook;
use serde_json::Value;
use tempfile::TempDir;

const MASTER: &[(&str, &str, f64)] = &[
    ("A1", "Cement", 100.0),
    ("A2", "Sand", 50.0),
    ("A3", "Gravel", 75.0),
    ("A4", "Brick", 20.0),
    ("A5", "Sandstone", 80.0),
    ("A6", "Paint", 35.0),
    ("A7", "Lime", 10.0),
];

struct Fixture {
    dir: TempDir,
    workbook: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let workbook = dir.path().join("budget.xlsx");
        write_budget(&workbook);
        Fixture { dir, workbook }
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("settings.json")
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_budgetgrid"))
            .arg("--config")
            .arg(self.config())
            .args(args)
            .env_remove("BUDGETGRID_LOG")
            .output()
            .expect("run budgetgrid")
    }

    fn file(&self) -> &str {
        self.workbook.to_str().unwrap()
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.run(args);
        assert_success(&output);
        serde_json::from_slice(&output.stdout).expect("valid JSON")
    }
}

fn write_budget(path: &Path) {
    let mut wb = Workbook::new();

    let master = wb.add_worksheet().set_name("Presupuesto_General").unwrap();
    for (c, h) in ["Code", "Description", "Total"].iter().enumerate() {
        master.write_string(0, c as u16, *h).unwrap();
    }
    for (r, (code, desc, total)) in MASTER.iter().enumerate() {
        let r = r as u32 + 1;
        master.write_string(r, 0, *code).unwrap();
        master.write_string(r, 1, *desc).unwrap();
        master.write_number(r, 2, *total).unwrap();
    }

    let materials = wb.add_worksheet().set_name("Asignación_Materiales").unwrap();
    let rows = [("Code", "Material"), ("A1", "Bag"), ("A1", "Shovel"), ("A2", "Bucket")];
    for (r, (a, b)) in rows.iter().enumerate() {
        materials.write_string(r as u32, 0, *a).unwrap();
        materials.write_string(r as u32, 1, *b).unwrap();
    }

    let labor = wb.add_worksheet().set_name("Asignación_ManoObra").unwrap();
    let rows = [("Code", "Worker"), ("A2", "Mason")];
    for (r, (a, b)) in rows.iter().enumerate() {
        labor.write_string(r as u32, 0, *a).unwrap();
        labor.write_string(r as u32, 1, *b).unwrap();
    }

    wb.save(path).unwrap();
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "exit code: {:?}\nstderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
}

fn column(grid: &Value, col: usize) -> Vec<Value> {
    grid["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row[col].clone())
        .collect()
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

#[test]
fn show_prints_first_master_page() {
    let fx = Fixture::new();
    let output = fx.run(&["show", fx.file()]);
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Items del Presupuesto (page 1/2 · rows 1-5 of 7)"), "{}", stdout);
    assert!(stdout.contains("Sandstone"));
    assert!(!stdout.contains("Paint"), "sixth row is on page 2");
    assert!(!stdout.contains("Materiales"), "no detail grids without a selection");
}

#[test]
fn show_select_includes_detail_grids() {
    let fx = Fixture::new();
    let v = fx.json(&["show", fx.file(), "--select", "A1", "--json"]);

    assert_eq!(v["selected"], "A1");
    let grids = v["grids"].as_array().unwrap();
    assert_eq!(grids.len(), 3);
    assert_eq!(grids[0]["grid"], "master");
    assert_eq!(grids[0]["rows"][0][2].as_f64(), Some(100.0));
    assert_eq!(column(&grids[1], 1), vec![Value::from("Bag"), Value::from("Shovel")]);
    assert_eq!(grids[2]["totalFiltered"], 0);
    assert_eq!(grids[2]["notice"], "No results");
}

#[test]
fn show_filter_and_sort() {
    let fx = Fixture::new();
    let v = fx.json(&[
        "show", fx.file(), "--filter", "description=SAN", "--sort", "Total:desc", "--json",
    ]);

    let master = &v["grids"][0];
    assert_eq!(column(master, 1), vec![Value::from("Sandstone"), Value::from("Sand")]);
    assert_eq!(master["filters"]["Description"], "SAN");
    assert_eq!(master["sort"]["column"], "Total");
    assert_eq!(master["sort"]["direction"], "desc");
}

#[test]
fn show_second_page() {
    let fx = Fixture::new();
    let v = fx.json(&["show", fx.file(), "--page", "2", "--json"]);

    let master = &v["grids"][0];
    assert_eq!(master["page"], 2);
    assert_eq!(master["pageCount"], 2);
    assert_eq!(column(master, 0), vec![Value::from("A6"), Value::from("A7")]);
}

#[test]
fn show_page_past_end_reports_notice() {
    let fx = Fixture::new();
    let v = fx.json(&["show", fx.file(), "--page", "9", "--json"]);

    let master = &v["grids"][0];
    assert!(master["rows"].as_array().unwrap().is_empty());
    assert_eq!(master["notice"], "No rows on this page");
}

#[test]
fn show_page_size_override() {
    let fx = Fixture::new();
    let v = fx.json(&["show", fx.file(), "--page-size", "3", "--json"]);
    assert_eq!(v["grids"][0]["pageCount"], 3);
}

#[test]
fn show_unknown_column_is_usage_error() {
    let fx = Fixture::new();
    let output = fx.run(&["show", fx.file(), "--sort", "Price"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown column 'Price'"), "{}", stderr);
    assert!(stderr.contains("hint: columns: Code, Description, Total"), "{}", stderr);
}

#[test]
fn show_detail_grid_needs_selection() {
    let fx = Fixture::new();
    let output = fx.run(&["show", fx.file(), "--grid", "labor", "--page", "2"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn show_missing_file_is_load_error() {
    let fx = Fixture::new();
    let missing = fx.dir.path().join("nope.xlsx");
    let output = fx.run(&["show", missing.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot load"), "{}", stderr);
}

#[test]
fn show_garbage_file_is_load_error() {
    let fx = Fixture::new();
    let garbage = fx.dir.path().join("notes.xlsx");
    std::fs::write(&garbage, b"not a workbook").unwrap();
    let output = fx.run(&["show", garbage.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(3));
}

// ---------------------------------------------------------------------------
// sheets
// ---------------------------------------------------------------------------

#[test]
fn sheets_lists_roles() {
    let fx = Fixture::new();
    let v = fx.json(&["sheets", fx.file(), "--json"]);

    let sheets = v["sheets"].as_array().unwrap();
    assert_eq!(sheets.len(), 3);
    assert_eq!(sheets[0]["name"], "Presupuesto_General");
    assert_eq!(sheets[0]["rows"], 7);
    assert_eq!(sheets[0]["grid"], "master");
    assert_eq!(sheets[2]["grid"], "labor");
    assert!(v["missing"].as_array().unwrap().is_empty());
}

#[test]
fn sheets_warns_about_missing_roles() {
    let fx = Fixture::new();
    std::fs::write(fx.config(), r#"{ "sheets.labor": "Labor" }"#).unwrap();
    let output = fx.run(&["sheets", fx.file()]);
    assert_success(&output);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("sheet 'Labor' for Mano de Obra not found"), "{}", stderr);
}

// ---------------------------------------------------------------------------
// export
// ---------------------------------------------------------------------------

#[test]
fn export_writes_report() {
    let fx = Fixture::new();
    let out = fx.dir.path().join("reports");
    let output = fx.run(&[
        "export", fx.file(), "--select", "A1", "--out", out.to_str().unwrap(), "--name", "a1.xlsx",
    ]);
    assert_success(&output);

    let report = out.join("a1.xlsx");
    assert!(report.exists());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("3 grids"), "{}", stdout);
}

#[test]
fn export_rejects_bad_file_name() {
    let fx = Fixture::new();
    let output = fx.run(&["export", fx.file(), "--out", fx.dir.path().to_str().unwrap(), "--name", "a/b.xlsx"]);
    assert_eq!(output.status.code(), Some(4));
}
