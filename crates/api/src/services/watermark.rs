use domain::services::{CollaboratorError, Watermarker};

/// Minimal watermarker that appends the download identifier to the PDF
/// as a trailing comment. The bytes stay a valid PDF; viewers ignore
/// content after `%%EOF`. A rendering overlay belongs to a dedicated
/// document service, not this API.
pub struct TextStamper;

impl Watermarker for TextStamper {
    fn stamp(&self, pdf: &[u8], identifier: &str) -> Result<Vec<u8>, CollaboratorError> {
        if !pdf.starts_with(b"%PDF") {
            return Err(CollaboratorError::Watermark(
                "input is not a PDF document".to_string(),
            ));
        }
        // Newlines in the identifier would start a new PDF line outside
        // the comment.
        let identifier: String = identifier
            .chars()
            .filter(|c| !c.is_control())
            .collect();

        let mut stamped = Vec::with_capacity(pdf.len() + identifier.len() + 32);
        stamped.extend_from_slice(pdf);
        if !pdf.ends_with(b"\n") {
            stamped.push(b'\n');
        }
        stamped.extend_from_slice(format!("% Licensed to {identifier}\n").as_bytes());
        Ok(stamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_appends_identifier() {
        let out = TextStamper.stamp(b"%PDF-1.4\n...%%EOF", "student@example.com").unwrap();
        assert!(out.starts_with(b"%PDF-1.4"));
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("Licensed to student@example.com"));
    }

    #[test]
    fn test_stamp_rejects_non_pdf_input() {
        assert!(TextStamper.stamp(b"hello", "x").is_err());
    }

    #[test]
    fn test_stamp_strips_control_characters() {
        let out = TextStamper.stamp(b"%PDF-1.4\n", "a\nb").unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("Licensed to ab"));
    }
}
