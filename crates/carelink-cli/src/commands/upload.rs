use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use carelink_client::{ClientFactory, FileUpload};
use colored::Colorize;

use crate::cli::{OutputFormat, UploadArgs};
use crate::output::{print_json, print_success};

const FILE_FIELD: &str = "file";

pub async fn upload(
    factory: &ClientFactory,
    args: &UploadArgs,
    format: OutputFormat,
) -> Result<()> {
    let file = read_file(&args.file)?;
    let fields = parse_fields(&args.fields)?;
    let size = file.bytes.len();

    let document = factory
        .upload_patient_document(&args.patient_id, &file, &fields)
        .await
        .with_context(|| format!("Failed to upload {}", args.file.display()))?;

    match format {
        OutputFormat::Json => print_json(&document)?,
        OutputFormat::Table => print_success(&format!(
            "Uploaded {} ({size} bytes) to patient {} as document {}",
            document.file_name.cyan(),
            args.patient_id,
            document.id
        )),
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<FileUpload> {
    FileUpload::from_path(FILE_FIELD, path)
        .with_context(|| format!("Cannot read {}", path.display()))
}

fn parse_fields(raw: &[String]) -> Result<BTreeMap<String, String>> {
    raw.iter()
        .map(|pair| {
            let (key, value) = pair
                .split_once('=')
                .with_context(|| format!("Expected KEY=VALUE, got {pair}"))?;
            let key = key.trim();
            if key.is_empty() {
                anyhow::bail!("Empty field name in {pair}");
            }
            Ok((key.to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_fields() {
        let fields =
            parse_fields(&["category=intake".to_string(), "note=a=b".to_string()]).unwrap();
        assert_eq!(fields["category"], "intake");
        assert_eq!(fields["note"], "a=b");
        assert!(parse_fields(&["missing".to_string()]).is_err());
        assert!(parse_fields(&["=x".to_string()]).is_err());
    }

    #[test]
    fn test_read_file_uses_file_field() {
        let mut tmp = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        tmp.write_all(b"%PDF-1.7").unwrap();

        let upload = read_file(tmp.path()).unwrap();
        assert_eq!(upload.field_name, "file");
        assert_eq!(upload.content_type, "application/pdf");
        assert_eq!(upload.bytes, b"%PDF-1.7");
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_file(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(err.to_string().starts_with("Cannot read"));
    }
}
