mod common;

use akpack::prelude::*;
use common::{BankSpec, FileSpec, PckBuilder};
use pretty_assertions::assert_eq;
use std::path::Path;
use tempfile::tempdir;

fn extracted(outcome: ExtractOutcome) -> ExtractionSummary {
    match outcome {
        ExtractOutcome::Extracted(summary) => summary,
        ExtractOutcome::NotAContainer => panic!("expected a package"),
    }
}

fn read(path: impl AsRef<Path>) -> Vec<u8> {
    std::fs::read(path.as_ref())
        .unwrap_or_else(|e| panic!("{}: {e}", path.as_ref().display()))
}

#[test]
fn test_standalone_file_end_to_end() {
    let dir = tempdir().unwrap();
    let data: Vec<u8> = (0u8..16).collect();
    let pck = PckBuilder::new()
        .folder(1, "Audio")
        .file(FileSpec::new(0xDEAD, 1, &data))
        .write_to(dir.path(), "Music");
    let out = dir.path().join("out");

    let summary = extracted(extract_container(&pck, &ExtractionOptions::new(&out)).unwrap());

    assert_eq!(summary.files_extracted, 1);
    assert_eq!(summary.banks_extracted, 0);
    assert!(summary.conversion.is_none());
    assert_eq!(
        read(out.join("Audio").join("Music").join("SoundFiles").join("0x0000DEAD.wem")),
        data
    );
}

#[test]
fn test_bank_is_header_plus_hirc() {
    let dir = tempdir().unwrap();
    let bank = BankSpec::new(0x10, 1).with_embedded(0x100, b"embedded-audio");
    let pck = PckBuilder::new()
        .folder(1, "sfx")
        .bank(bank.clone())
        .write_to(dir.path(), "Effects");
    let out = dir.path().join("out");

    let summary = extracted(extract_container(&pck, &ExtractionOptions::new(&out)).unwrap());
    assert_eq!(summary.banks_extracted, 1);
    assert_eq!(summary.files_extracted, 1);

    let bank_dir = out.join("sfx").join("Effects").join("SoundBank (0x00000010)");
    let bnk = read(bank_dir.join("0x00000010.bnk"));
    assert_eq!(bnk, bank.expected_bnk(false));

    let index = read_index(&pck).unwrap().unwrap();
    assert_eq!(bnk.len() as u64, index.banks[0].output_len());

    // Embedded files land under the bank's directory
    assert_eq!(
        read(bank_dir.join("SoundFiles").join("0x00000100.wem")),
        b"embedded-audio"
    );
}

#[test]
fn test_every_file_matches_declared_size() {
    let dir = tempdir().unwrap();
    let pck = PckBuilder::new()
        .folder(1, "sfx")
        .folder(2, "english(us)")
        .bank(BankSpec::new(0x1, 1).with_embedded(0xA, &[1; 3]).with_embedded(0xB, &[2; 40]))
        .bank(BankSpec::new(0x2, 2))
        .file(FileSpec::new(0xC, 2, &[3; 100]))
        .file(FileSpec::new(0xD, 1, &[]))
        .write_to(dir.path(), "Mixed");
    let out = dir.path().join("out");

    extract_container(&pck, &ExtractionOptions::new(&out)).unwrap();

    let index = read_index(&pck).unwrap().unwrap();
    for bank in &index.banks {
        assert_eq!(read(bank.output_path(&out)).len() as u64, bank.output_len());
    }
    for file in &index.files {
        assert_eq!(read(file.output_path(&out)).len() as u32, file.file_size);
    }
}

#[test]
fn test_extraction_is_idempotent() {
    let dir = tempdir().unwrap();
    let pck = PckBuilder::new()
        .folder(1, "sfx")
        .bank(BankSpec::new(0x10, 1).with_embedded(0x100, b"abc"))
        .file(FileSpec::new(0x200, 1, b"standalone"))
        .write_to(dir.path(), "Again");
    let out = dir.path().join("out");
    let options = ExtractionOptions::new(&out);

    extract_container(&pck, &options).unwrap();
    let index = read_index(&pck).unwrap().unwrap();
    let first: Vec<Vec<u8>> = index
        .banks
        .iter()
        .map(|b| read(b.output_path(&out)))
        .chain(index.files.iter().map(|f| read(f.output_path(&out))))
        .collect();

    extract_container(&pck, &options).unwrap();
    let second: Vec<Vec<u8>> = index
        .banks
        .iter()
        .map(|b| read(b.output_path(&out)))
        .chain(index.files.iter().map(|f| read(f.output_path(&out))))
        .collect();

    assert_eq!(first, second);
}

#[test]
fn test_big_endian_package_extracts_without_conversion() {
    let dir = tempdir().unwrap();
    let bank = BankSpec::new(0x10, 1);
    let pck = PckBuilder::new()
        .big_endian()
        .folder(1, "Foo")
        .bank(bank.clone())
        .file(FileSpec::new(0x20, 1, b"xma-audio"))
        .write_to(dir.path(), "Console");
    let out = dir.path().join("out");

    let options = ExtractionOptions::new(&out)
        .with_tools(Some(ConversionTools::new("ww2ogg", "revorb", "codebook.bin")));
    let summary = extracted(extract_container(&pck, &options).unwrap());

    assert_eq!(summary.endianness, Endianness::Big);
    assert!(summary.conversion.is_none());
    assert_eq!(
        read(out.join("Foo").join("Console").join("SoundBank (0x00000010)").join("0x00000010.bnk")),
        bank.expected_bnk(true)
    );
    assert_eq!(
        read(out.join("Foo").join("Console").join("SoundFiles").join("0x00000020.wem")),
        b"xma-audio"
    );
}

#[test]
fn test_entry_past_end_is_truncated() {
    let dir = tempdir().unwrap();
    let mut bytes = PckBuilder::new()
        .folder(1, "Audio")
        .file(FileSpec::new(0x1, 1, &[7; 64]))
        .build();
    bytes.truncate(bytes.len() - 10);
    let pck = dir.path().join("Cut.pck");
    std::fs::write(&pck, bytes).unwrap();
    let out = dir.path().join("out");

    let err = extract_container(&pck, &ExtractionOptions::new(&out)).unwrap_err();
    assert!(matches!(err, Error::TruncatedEntry { expected: 64, actual: 54, .. }));
    assert!(!out.join("Audio").join("Cut").join("SoundFiles").join("0x00000001.wem").exists());
}

#[test]
fn test_progress_reports_every_item() {
    use std::sync::Mutex;

    let dir = tempdir().unwrap();
    let pck = PckBuilder::new()
        .folder(1, "sfx")
        .bank(BankSpec::new(0x1, 1).with_embedded(0x2, b"e"))
        .file(FileSpec::new(0x3, 1, b"s"))
        .write_to(dir.path(), "Progress");
    let out = dir.path().join("out");

    let writes = Mutex::new(Vec::new());
    extract_container_with_progress(&pck, &ExtractionOptions::new(&out), &|p| {
        if p.phase == ExtractPhase::WritingFiles {
            writes.lock().unwrap().push((p.current, p.total));
        }
    })
    .unwrap();

    assert_eq!(writes.into_inner().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
}

#[test]
fn test_batch_continues_after_failures() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input");
    std::fs::create_dir_all(input.join("nested")).unwrap();

    PckBuilder::new()
        .folder(1, "Audio")
        .file(FileSpec::new(0x1, 1, b"first"))
        .write_to(&input, "A");
    PckBuilder::new()
        .folder(1, "Audio")
        .file(FileSpec::new(0x2, 9, b"bad folder"))
        .write_to(&input, "B");
    std::fs::write(input.join("C.pck"), b"not a package").unwrap();
    PckBuilder::new()
        .folder(1, "Audio")
        .file(FileSpec::new(0x3, 1, b"last"))
        .write_to(&input.join("nested"), "D");

    let out = dir.path().join("out");
    let files = find_pck_files(&input);
    assert_eq!(files.files.len(), 4);
    assert!(files.errors.is_empty());

    let result = batch_extract(&files, &input, &ExtractionOptions::new(&out), &|_| {});

    assert_eq!(result.success_count, 2);
    assert_eq!(result.skipped_count, 1);
    assert_eq!(result.fail_count, 1);
    assert_eq!(result.results.len(), 4);
    assert!(result.results.iter().any(|m| m.starts_with("Failed B.pck")));

    assert_eq!(read(out.join("Audio").join("A").join("SoundFiles").join("0x00000001.wem")), b"first");
    assert_eq!(read(out.join("Audio").join("D").join("SoundFiles").join("0x00000003.wem")), b"last");
}

#[cfg(unix)]
mod conversion {
    use super::*;
    use pretty_assertions::assert_eq;
    use akpack::convert::{CODEBOOK_FILE, executable_name};
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;

    fn write_script(path: &Path, body: &str) {
        std::fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms).unwrap();
    }

    fn install_tools(dir: &Path) -> ConversionTools {
        write_script(
            &dir.join(executable_name("ww2ogg")),
            r#"cp "$3" "${3%.wem}.ogg""#,
        );
        write_script(
            &dir.join(executable_name("revorb")),
            r#"printf 'revorb' >> "$1""#,
        );
        std::fs::write(dir.join(CODEBOOK_FILE), b"").unwrap();
        ConversionTools::discover(dir).unwrap()
    }

    #[test]
    fn test_extracted_files_are_converted() {
        let dir = tempdir().unwrap();
        let tools_dir = dir.path().join("tools");
        std::fs::create_dir(&tools_dir).unwrap();
        let tools = install_tools(&tools_dir);

        let pck = PckBuilder::new()
            .folder(1, "sfx")
            .bank(BankSpec::new(0x10, 1).with_embedded(0x100, b"embedded"))
            .file(FileSpec::new(0x200, 1, b"standalone"))
            .write_to(dir.path(), "Convert");
        let out = dir.path().join("out");

        let options = ExtractionOptions::new(&out)
            .with_tools(Some(tools))
            .with_quiescence_delay(Duration::from_millis(10));
        let summary = extracted(extract_container(&pck, &options).unwrap());

        let report = summary.conversion.unwrap();
        assert!(report.is_complete(), "{:?}", report.failures);
        assert_eq!(report.converted.len(), 2);

        let ogg = out.join("sfx").join("Convert").join("SoundFiles").join("0x00000200.ogg");
        assert_eq!(read(ogg), b"standalonerevorb");
    }

    #[test]
    fn test_conversion_disabled() {
        let dir = tempdir().unwrap();
        let tools = install_tools(dir.path());

        let pck = PckBuilder::new()
            .folder(1, "sfx")
            .file(FileSpec::new(0x200, 1, b"standalone"))
            .write_to(dir.path(), "NoConvert");
        let out = dir.path().join("out");

        let options = ExtractionOptions::new(&out)
            .with_tools(Some(tools))
            .with_convert(false);
        let summary = extracted(extract_container(&pck, &options).unwrap());

        assert!(summary.conversion.is_none());
        assert!(!out.join("sfx").join("NoConvert").join("SoundFiles").join("0x00000200.ogg").exists());
    }

    #[test]
    fn test_failed_conversion_keeps_extraction() {
        let dir = tempdir().unwrap();
        let tools = install_tools(dir.path());
        write_script(&tools.normalizer, "exit 1");

        let pck = PckBuilder::new()
            .folder(1, "sfx")
            .file(FileSpec::new(0x200, 1, b"standalone"))
            .write_to(dir.path(), "Failing");
        let out = dir.path().join("out");

        let options = ExtractionOptions::new(&out)
            .with_tools(Some(tools))
            .with_quiescence_delay(Duration::from_millis(10));
        let summary = extracted(extract_container(&pck, &options).unwrap());

        assert!(summary.has_conversion_failures());
        assert_eq!(summary.files_extracted, 1);
        assert_eq!(
            read(out.join("sfx").join("Failing").join("SoundFiles").join("0x00000200.wem")),
            b"standalone"
        );
    }
}
