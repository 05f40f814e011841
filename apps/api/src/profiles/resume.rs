use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeFormat {
    Pdf,
    Doc,
    Docx,
}

impl ResumeFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ResumeFormat::Pdf => "application/pdf",
            ResumeFormat::Doc => "application/msword",
            ResumeFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ResumeFormat::Pdf => "pdf",
            ResumeFormat::Doc => "doc",
            ResumeFormat::Docx => "docx",
        }
    }

    fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type.split(';').next().unwrap_or("").trim();
        [ResumeFormat::Pdf, ResumeFormat::Doc, ResumeFormat::Docx]
            .into_iter()
            .find(|f| f.content_type().eq_ignore_ascii_case(essence))
    }

    fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, ext) = file_name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(ResumeFormat::Pdf),
            "doc" => Some(ResumeFormat::Doc),
            "docx" => Some(ResumeFormat::Docx),
            _ => None,
        }
    }
}

/// Decides the resume format. A declared content type wins; generic or missing
/// types fall back to the file extension.
pub fn detect_format(content_type: Option<&str>, file_name: Option<&str>) -> Option<ResumeFormat> {
    match content_type {
        Some(ct) if !is_generic(ct) => ResumeFormat::from_content_type(ct),
        _ => file_name.and_then(ResumeFormat::from_file_name),
    }
}

fn is_generic(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or("").trim();
    essence.is_empty() || essence.eq_ignore_ascii_case("application/octet-stream")
}

pub fn validate_resume(
    content_type: Option<&str>,
    file_name: Option<&str>,
    size: usize,
    max_bytes: usize,
) -> Result<ResumeFormat, AppError> {
    let format = detect_format(content_type, file_name).ok_or_else(|| {
        AppError::UnsupportedMediaType("Please upload a PDF or Word document".to_string())
    })?;
    if size == 0 {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }
    if size > max_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "File size must be less than {}MB",
            max_bytes / (1024 * 1024)
        )));
    }
    Ok(format)
}

/// Every upload gets a fresh key so cached links to an older resume stay valid.
pub fn resume_key(student_id: Uuid, format: ResumeFormat) -> String {
    format!(
        "resumes/{student_id}/{}.{}",
        Uuid::new_v4(),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 5 * 1024 * 1024;

    #[test]
    fn test_accepts_pdf_and_word() {
        assert_eq!(
            validate_resume(Some("application/pdf"), Some("cv.pdf"), 10, MAX).unwrap(),
            ResumeFormat::Pdf
        );
        assert_eq!(
            validate_resume(Some("application/msword"), None, 10, MAX).unwrap(),
            ResumeFormat::Doc
        );
        assert_eq!(
            validate_resume(
                Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
                Some("cv.docx"),
                10,
                MAX
            )
            .unwrap(),
            ResumeFormat::Docx
        );
    }

    #[test]
    fn test_rejects_images() {
        let err = validate_resume(Some("image/png"), Some("cv.pdf"), 10, MAX).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedMediaType(_)));
    }

    #[test]
    fn test_octet_stream_falls_back_to_extension() {
        assert_eq!(
            detect_format(Some("application/octet-stream"), Some("Resume.PDF")),
            Some(ResumeFormat::Pdf)
        );
        assert_eq!(detect_format(None, Some("resume.txt")), None);
        assert_eq!(detect_format(None, None), None);
    }

    #[test]
    fn test_size_limits() {
        let err = validate_resume(Some("application/pdf"), None, MAX + 1, MAX).unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(ref m) if m == "File size must be less than 5MB"));
        let err = validate_resume(Some("application/pdf"), None, 0, MAX).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(validate_resume(Some("application/pdf"), None, MAX, MAX).is_ok());
    }

    #[test]
    fn test_content_type_parameters_ignored() {
        assert_eq!(
            detect_format(Some("application/pdf; name=cv.pdf"), None),
            Some(ResumeFormat::Pdf)
        );
    }

    #[test]
    fn test_resume_key_layout() {
        let student = Uuid::new_v4();
        let key = resume_key(student, ResumeFormat::Docx);
        assert!(key.starts_with(&format!("resumes/{student}/")));
        assert!(key.ends_with(".docx"));
    }
}
