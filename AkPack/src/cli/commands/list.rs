//! CLI command for listing package contents

use std::path::Path;

use crate::pck::{FileOrigin, PckIndex, format_id, read_index};

/// Format byte size for human-readable output
fn format_size(bytes: u64) -> String {
    if bytes >= 1_048_576 {
        format!("{:.1}M", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1}K", bytes as f64 / 1024.0)
    } else {
        format!("{bytes}")
    }
}

pub fn execute(source: &Path, json: bool, count: bool) -> anyhow::Result<()> {
    let Some(index) = read_index(source)? else {
        anyhow::bail!("Not an AKPK package: {}", source.display());
    };

    if json {
        let value = if count {
            serde_json::json!({
                "endianness": index.endianness,
                "folders": index.folders.len(),
                "banks": index.banks.len(),
                "embedded_files": index.embedded_file_count(),
                "standalone_files": index.standalone_file_count(),
            })
        } else {
            serde_json::to_value(&index)?
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if count {
        print_counts(&index);
    } else {
        print_index(&index);
    }
    Ok(())
}

fn print_counts(index: &PckIndex) {
    println!(
        "{} folders, {} banks, {} sound files ({} embedded)",
        index.folders.len(),
        index.banks.len(),
        index.files.len(),
        index.embedded_file_count()
    );
}

fn print_index(index: &PckIndex) {
    println!("{} ({})", index.base_name, index.endianness.as_str());
    if index.uses_alternate_codec() {
        println!("  audio uses an alternate codec and will not be converted");
    }

    println!();
    println!("Folders:");
    for folder in index.folders.iter() {
        println!("  {:>10}  {}", folder.id, folder.name);
    }

    println!();
    println!("Sound banks:");
    for bank in &index.banks {
        println!(
            "  {}  {:>8}  {}",
            bank.id_string,
            format_size(bank.output_len()),
            bank.relative_path.display()
        );
    }

    println!();
    println!("Sound files:");
    for file in &index.files {
        let origin = match file.origin {
            FileOrigin::Standalone => String::new(),
            FileOrigin::Embedded { bank_id } => format!("  (in {})", format_id(bank_id)),
        };
        println!(
            "  {}  {:>8}  {}{origin}",
            file.id_string,
            format_size(u64::from(file.file_size)),
            file.relative_path.display()
        );
    }

    println!();
    print_counts(index);
}
