//! DOCX mutation tests over real files: write, mutate, reload, verify.

mod common;

use common::{build_docx, offline_fonts};
use formfill::{CheckboxEntry, DocxForm, FillEntry};
use tempfile::TempDir;

fn entry(lines: &[&str], start: usize, resolved: &[&str]) -> FillEntry {
    FillEntry {
        lines: lines.iter().map(|s| s.to_string()).collect(),
        start_line: start,
        spot_count: resolved.len(),
        field_keys: vec![None; resolved.len()],
        resolved_lines: resolved.iter().map(|s| s.to_string()).collect(),
    }
}

#[test]
fn fill_survives_a_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("form.docx");
    let output = dir.path().join("form_filled.docx");
    build_docx(&input, &["Leave Request", "Name: ____", "Date: ____"]);

    let mut form = DocxForm::load(&input).unwrap();
    let fill = entry(
        &["Leave Request", "Name: ____", "Date: ____"],
        0,
        &["Leave Request", "Name: Jane Smith", "Date: 2026-08-04"],
    );
    let mut fonts = offline_fonts(dir.path());
    form.apply(&[fill], &[], &mut fonts);
    form.save(&output).unwrap();

    let reloaded = DocxForm::load(&output).unwrap();
    assert_eq!(
        reloaded.lines(),
        vec![
            "Leave Request".to_string(),
            "Name: Jane Smith".to_string(),
            "Date: 2026-08-04".to_string()
        ]
    );
}

#[test]
fn identity_fill_round_trips_the_line_list() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("form.docx");
    let output = dir.path().join("out.docx");
    build_docx(&input, &["Header", "Name: ____", "Footer"]);

    let mut form = DocxForm::load(&input).unwrap();
    let before = form.lines();
    let fill = entry(&["Name: ____"], 1, &["Name: ____"]);
    let mut fonts = offline_fonts(dir.path());
    form.apply(&[fill], &[], &mut fonts);
    form.save(&output).unwrap();

    assert_eq!(DocxForm::load(&output).unwrap().lines(), before);
}

#[test]
fn repeated_boilerplate_lines_each_take_their_own_entry() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("form.docx");
    build_docx(
        &input,
        &[
            "Signature: ____",
            "page one content",
            "more content",
            "even more",
            "Signature: ____",
        ],
    );

    let mut form = DocxForm::load(&input).unwrap();
    let first = entry(&["Signature: ____"], 0, &["Signature: Jane Smith"]);
    let second = entry(&["Signature: ____"], 4, &["Signature: J. Smith"]);
    let mut fonts = offline_fonts(dir.path());
    form.apply(&[first, second], &[], &mut fonts);

    let lines = form.lines();
    assert_eq!(lines[0], "Signature: Jane Smith");
    assert_eq!(lines[4], "Signature: J. Smith");
}

#[test]
fn checkbox_group_is_marked_in_the_saved_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("form.docx");
    let output = dir.path().join("out.docx");
    build_docx(&input, &["Marital status:", "[ ] Single  [ ] Married"]);

    let mut form = DocxForm::load(&input).unwrap();
    let checkbox = CheckboxEntry {
        lines: form.lines(),
        start_line: 0,
        positions: vec![(1, 0), (1, 12)],
        option_labels: vec!["Single".to_string(), "Married".to_string()],
        field_key: Some("marital_status".to_string()),
        selected: Some(vec![1]),
    };
    let mut fonts = offline_fonts(dir.path());
    form.apply(&[], &[checkbox], &mut fonts);
    form.save(&output).unwrap();

    let lines = DocxForm::load(&output).unwrap().lines();
    assert_eq!(lines[1], "[ ] Single  [X] Married");
}

#[test]
fn moved_window_is_found_by_content_scan() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("form.docx");
    build_docx(&input, &["intro", "intro two", "Name: ____"]);

    let mut form = DocxForm::load(&input).unwrap();
    // Stale start_line: the content scan must still find the window.
    let fill = entry(&["Name: ____"], 0, &["Name: Jane"]);
    let mut fonts = offline_fonts(dir.path());
    form.apply(&[fill], &[], &mut fonts);

    assert_eq!(form.lines()[2], "Name: Jane");
}
