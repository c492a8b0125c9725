use std::path::Path;

use garde::Validate;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Limits a document must satisfy before it may be uploaded.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_bytes: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

/// A document selected for analysis.
#[derive(Debug, Clone, Validate)]
#[garde(context(UploadPolicy))]
pub struct DocumentFile {
    #[garde(length(min = 1, max = 255))]
    pub name: String,

    #[garde(custom(accepted_content_type))]
    pub content_type: String,

    #[garde(custom(within_upload_policy))]
    pub bytes: Vec<u8>,
}

impl DocumentFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a document from disk, inferring its content type from the extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        let content_type = if is_pdf {
            PDF_CONTENT_TYPE
        } else {
            "application/octet-stream"
        };
        Ok(Self::new(name, content_type, bytes))
    }

    pub fn size_kb(&self) -> usize {
        (self.bytes.len() + 512) / 1024
    }
}

fn accepted_content_type(value: &str, _ctx: &UploadPolicy) -> garde::Result {
    if value.eq_ignore_ascii_case(PDF_CONTENT_TYPE) {
        Ok(())
    } else {
        Err(garde::Error::new("Please select a valid PDF file"))
    }
}

fn within_upload_policy(value: &[u8], ctx: &UploadPolicy) -> garde::Result {
    if value.is_empty() {
        return Err(garde::Error::new("file is empty"));
    }
    if value.len() > ctx.max_bytes {
        return Err(garde::Error::new(format!(
            "file is {} bytes, limit is {} bytes",
            value.len(),
            ctx.max_bytes
        )));
    }
    if !value.starts_with(PDF_SIGNATURE) {
        return Err(garde::Error::new("file does not carry a PDF signature"));
    }
    Ok(())
}
