//! Multipart form encoding for file uploads.

use std::collections::BTreeMap;
use std::path::Path;

use carelink_core::RequestBody;
use uuid::Uuid;

/// A file to upload, already read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Form field the file is sent under.
    pub field_name: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(
        field_name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read `path` from disk, guessing the content type from its extension.
    pub fn from_path(field_name: impl Into<String>, path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let content_type = content_type_for(path);
        Ok(Self::new(field_name, file_name, content_type, bytes))
    }
}

fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path).first_or_octet_stream().to_string()
}

pub(crate) fn new_boundary() -> String {
    format!("carelink-{}", Uuid::new_v4().simple())
}

/// Encode `fields` followed by `file` as `multipart/form-data`.
pub(crate) fn encode_multipart(
    boundary: &str,
    file: &FileUpload,
    fields: &BTreeMap<String, String>,
) -> RequestBody {
    let mut bytes = Vec::with_capacity(file.bytes.len() + 256);
    for (name, value) in fields {
        bytes.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        bytes.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", escape(name)).as_bytes(),
        );
        bytes.extend_from_slice(value.as_bytes());
        bytes.extend_from_slice(b"\r\n");
    }

    bytes.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    bytes.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            escape(&file.field_name),
            escape(&file.file_name)
        )
        .as_bytes(),
    );
    bytes.extend_from_slice(format!("Content-Type: {}\r\n\r\n", file.content_type).as_bytes());
    bytes.extend_from_slice(&file.bytes);
    bytes.extend_from_slice(b"\r\n");
    bytes.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    RequestBody::Multipart {
        boundary: boundary.to_string(),
        bytes,
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multipart_layout() {
        let file = FileUpload::new("file", "scan \"1\".pdf", "application/pdf", b"%PDF".to_vec());
        let mut fields = BTreeMap::new();
        fields.insert("category".to_string(), "intake".to_string());

        let body = encode_multipart("b0", &file, &fields);
        let RequestBody::Multipart { boundary, bytes } = body else {
            panic!("expected multipart body");
        };
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(boundary, "b0");
        assert!(text.starts_with(
            "--b0\r\nContent-Disposition: form-data; name=\"category\"\r\n\r\nintake\r\n"
        ));
        assert!(text.contains("filename=\"scan \\\"1\\\".pdf\""));
        assert!(text.contains("Content-Type: application/pdf\r\n\r\n%PDF\r\n"));
        assert!(text.ends_with("--b0--\r\n"));
    }

    #[test]
    fn test_boundaries_are_unique() {
        let a = new_boundary();
        let b = new_boundary();
        assert!(a.starts_with("carelink-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_content_type_guess() {
        assert_eq!(content_type_for(Path::new("x/Report.PDF")), "application/pdf");
        assert_eq!(content_type_for(Path::new("photo.jpeg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("labs.csv")), "text/csv");
        assert_eq!(
            content_type_for(Path::new("referral.docx")),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(content_type_for(Path::new("blob")), "application/octet-stream");
    }
}
