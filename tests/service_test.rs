//! Whole-pipeline tests through `FillService` with a scripted oracle.

mod common;

use common::{build_docx, build_flat_pdf, build_profile, offline_fonts, ScriptedOracle};
use formfill::{DocxForm, FillService, PdfForm};
use tempfile::TempDir;

#[test]
fn docx_form_is_filled_end_to_end() {
    let dir = TempDir::new().unwrap();
    let form_path = dir.path().join("leave.docx");
    let profile = dir.path().join("profile");
    std::fs::create_dir(&profile).unwrap();
    build_profile(&profile, &[("full_name", "Jane Smith")]);
    build_docx(&form_path, &["Leave Request", "Name: ____"]);

    // Responses: placeholder literals, then the key assignment.
    let oracle = ScriptedOracle::client(&[r#"["____"]"#, r#"["full_name"]"#]);
    let mut service = FillService::new(oracle).with_font_resolver(offline_fonts(dir.path()));

    let out = service.fill_form(&form_path, &profile, None).unwrap();
    assert_eq!(out, dir.path().join("leave_filled.docx"));

    let lines = DocxForm::load(&out).unwrap().lines();
    assert_eq!(
        lines,
        vec!["Leave Request".to_string(), "Name: Jane Smith".to_string()]
    );
}

#[test]
fn flat_pdf_falls_back_from_the_interactive_path() {
    let dir = TempDir::new().unwrap();
    let form_path = dir.path().join("leave.pdf");
    let profile = dir.path().join("profile");
    std::fs::create_dir(&profile).unwrap();
    build_profile(&profile, &[("full_name", "Jane Smith")]);
    build_flat_pdf(
        &form_path,
        &[("LEAVE REQUEST", 72.0, 730.0), ("Name: ____", 72.0, 700.0)],
    );

    let oracle = ScriptedOracle::client(&[r#"["____"]"#, r#"["full_name"]"#]);
    let mut service = FillService::new(oracle).with_font_resolver(offline_fonts(dir.path()));

    let out = service.fill_form(&form_path, &profile, None).unwrap();
    let lines = PdfForm::load(&out).unwrap().flattened_lines().unwrap();
    assert_eq!(
        lines,
        vec![
            "LEAVE REQUEST".to_string(),
            "Name: Jane Smith".to_string()
        ]
    );
}

#[test]
fn docx_checkbox_group_is_resolved_and_marked() {
    let dir = TempDir::new().unwrap();
    let form_path = dir.path().join("intake.docx");
    let profile = dir.path().join("profile");
    std::fs::create_dir(&profile).unwrap();
    build_profile(&profile, &[("gender", "Male")]);
    build_docx(&form_path, &["Gender:", "[ ] Male  [ ] Female"]);

    // Responses: placeholder literals (none), checkbox key match, then the
    // selection indices.
    let oracle = ScriptedOracle::client(&["[]", "gender", "[0]"]);
    let mut service = FillService::new(oracle).with_font_resolver(offline_fonts(dir.path()));

    let out = service.fill_form(&form_path, &profile, None).unwrap();
    let lines = DocxForm::load(&out).unwrap().lines();
    assert_eq!(lines[1], "[X] Male  [ ] Female");
}

#[test]
fn unsupported_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let form_path = dir.path().join("form.odt");
    std::fs::write(&form_path, b"not supported").unwrap();
    let profile = dir.path().join("profile");
    std::fs::create_dir(&profile).unwrap();

    let oracle = ScriptedOracle::client(&[r#"["____"]"#]);
    let mut service = FillService::new(oracle).with_font_resolver(offline_fonts(dir.path()));
    assert!(service.fill_form(&form_path, &profile, None).is_err());
}

#[test]
fn garbled_placeholder_detection_degrades_to_underscores() {
    let dir = TempDir::new().unwrap();
    let form_path = dir.path().join("leave.docx");
    let profile = dir.path().join("profile");
    std::fs::create_dir(&profile).unwrap();
    build_profile(&profile, &[("full_name", "Jane Smith")]);
    build_docx(&form_path, &["Name: ____"]);

    // Three unusable detection responses, then the key assignment; the
    // default underscore pattern must carry the run.
    let oracle = ScriptedOracle::client(&[
        "no list here",
        "still chatting",
        "sorry about that",
        r#"["full_name"]"#,
    ]);
    let mut service = FillService::new(oracle).with_font_resolver(offline_fonts(dir.path()));

    let out = service.fill_form(&form_path, &profile, None).unwrap();
    let lines = DocxForm::load(&out).unwrap().lines();
    assert_eq!(lines, vec!["Name: Jane Smith".to_string()]);
}

#[test]
fn date_fields_are_persisted_into_the_profile() {
    let dir = TempDir::new().unwrap();
    let form_path = dir.path().join("leave.docx");
    let profile = dir.path().join("profile");
    std::fs::create_dir(&profile).unwrap();
    build_docx(&form_path, &["plain document, nothing to fill"]);

    let oracle = ScriptedOracle::client(&["[]"]);
    let mut service = FillService::new(oracle).with_font_resolver(offline_fonts(dir.path()));
    service.fill_form(&form_path, &profile, None).unwrap();

    let data = std::fs::read_to_string(profile.join("context_data.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&data).unwrap();
    assert!(parsed.get("current_year").is_some());
}
