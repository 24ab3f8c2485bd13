//! Text extraction from uploaded report files.
//!
//! [`TesseractExtractor`] shells out to the `tesseract` and `pdftoppm` binaries; failures are
//! reported through [`OcrResult`] rather than as errors, so the upload pipeline can fall through
//! to its next strategy.

use crate::config::{CoreConfig, OcrEngine};
use crate::constants::{ASSUMED_CONFIDENCE, MIN_OCR_TEXT_LEN};
use crate::demo::SAMPLE_REPORT_TEXT;
use crate::validation::file_extension;
use crate::{ReportError, ReportResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const IMAGE_EXTENSIONS: [&str; 5] = [".png", ".jpg", ".jpeg", ".tiff", ".bmp"];
const PDF_RESOLUTION_DPI: &str = "300";
/// TSV rows at this level are individual words.
const TSV_WORD_LEVEL: u32 = 5;

#[derive(Clone, Debug, PartialEq)]
pub struct OcrResult {
    pub text: String,
    /// Mean word confidence in `0.0..=1.0`
    pub confidence: f64,
    pub page_count: usize,
    pub success: bool,
    pub error: Option<String>,
}

impl OcrResult {
    pub fn extracted(text: String, confidence: f64, page_count: usize) -> Self {
        Self {
            text,
            confidence,
            page_count,
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            confidence: 0.0,
            page_count: 0,
            success: false,
            error: Some(error.into()),
        }
    }

    /// Number of non-whitespace characters in the extracted text.
    pub fn meaningful_len(&self) -> usize {
        self.text.chars().filter(|c| !c.is_whitespace()).count()
    }
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract(&self, bytes: &[u8], filename: &str) -> OcrResult;
}

/// Builds the extractor selected by `SAATHI_OCR_ENGINE`.
pub fn extractor_from_config(config: &CoreConfig) -> Arc<dyn TextExtractor> {
    match config.ocr_engine() {
        OcrEngine::Tesseract => Arc::new(TesseractExtractor::new(
            config.tesseract_bin(),
            config.pdftoppm_bin(),
        )),
        OcrEngine::Sample => Arc::new(SampleTextExtractor),
    }
}

/// Whether an OCR result is good enough to show without a warning, with a user-facing message.
pub fn check_confidence(result: &OcrResult, threshold: f64) -> (bool, String) {
    if !result.success {
        return (
            false,
            format!(
                "OCR processing failed: {}",
                result.error.as_deref().unwrap_or("unknown error")
            ),
        );
    }

    if result.confidence < threshold {
        return (
            false,
            format!(
                "OCR confidence ({:.0}%) is below threshold ({:.0}%). Please upload a clearer image or PDF.",
                result.confidence * 100.0,
                threshold * 100.0
            ),
        );
    }

    if result.text.trim().chars().count() < MIN_OCR_TEXT_LEN {
        return (
            false,
            "Could not extract sufficient text from the document. Please upload a clearer image."
                .to_string(),
        );
    }

    (true, "OCR processing successful".to_string())
}

/// Rebuilds plain text from `tesseract ... tsv` output and returns it with the mean positive
/// word confidence scaled to `0.0..=1.0`.
pub fn parse_tesseract_tsv(tsv: &str) -> (String, f64) {
    let mut lines: Vec<((u32, u32, u32, u32), Vec<&str>)> = Vec::new();
    let mut confidences: Vec<f64> = Vec::new();

    for row in tsv.lines().skip(1) {
        let columns: Vec<&str> = row.split('\t').collect();
        if columns.len() < 11 {
            continue;
        }
        let number = |i: usize| columns[i].trim().parse::<u32>().unwrap_or(0);
        if number(0) != TSV_WORD_LEVEL {
            continue;
        }

        let word = columns.get(11).map(|w| w.trim()).unwrap_or("");
        if word.is_empty() {
            continue;
        }
        if let Ok(conf) = columns[10].trim().parse::<f64>() {
            if conf > 0.0 {
                confidences.push(conf);
            }
        }

        let key = (number(1), number(2), number(3), number(4));
        match lines.last_mut() {
            Some((last_key, words)) if *last_key == key => words.push(word),
            _ => lines.push((key, vec![word])),
        }
    }

    let text = lines
        .iter()
        .map(|(_, words)| words.join(" "))
        .collect::<Vec<_>>()
        .join("\n");
    let confidence = if confidences.is_empty() {
        0.0
    } else {
        confidences.iter().sum::<f64>() / confidences.len() as f64 / 100.0
    };
    (text, confidence)
}

/// Tesseract-backed extractor. PDFs are rasterised page by page with `pdftoppm` first.
#[derive(Clone, Debug)]
pub struct TesseractExtractor {
    tesseract_bin: PathBuf,
    pdftoppm_bin: PathBuf,
}

impl TesseractExtractor {
    pub fn new(tesseract_bin: impl Into<PathBuf>, pdftoppm_bin: impl Into<PathBuf>) -> Self {
        Self {
            tesseract_bin: tesseract_bin.into(),
            pdftoppm_bin: pdftoppm_bin.into(),
        }
    }

    async fn ocr_image(&self, bytes: &[u8]) -> ReportResult<(String, f64)> {
        let mut child = Command::new(&self.tesseract_bin)
            .args(["stdin", "stdout", "tsv"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ReportError::Ocr(format!("failed to run {}: {}", self.tesseract_bin.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReportError::Ocr("tesseract stdin unavailable".into()))?;
        let input = bytes.to_vec();
        let writer = tokio::spawn(async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ReportError::Ocr(format!("tesseract did not finish: {}", e)))?;
        if let Ok(Err(e)) = writer.await {
            tracing::debug!("tesseract closed stdin early: {}", e);
        }

        if !output.status.success() {
            return Err(ReportError::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(parse_tesseract_tsv(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn rasterise_pdf(&self, bytes: &[u8], workdir: &Path) -> ReportResult<Vec<PathBuf>> {
        let input = workdir.join("input.pdf");
        tokio::fs::write(&input, bytes)
            .await
            .map_err(ReportError::FileWrite)?;

        let output = Command::new(&self.pdftoppm_bin)
            .args(["-r", PDF_RESOLUTION_DPI, "-png"])
            .arg(&input)
            .arg(workdir.join("page"))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                ReportError::Ocr(format!("failed to run {}: {}", self.pdftoppm_bin.display(), e))
            })?;
        if !output.status.success() {
            return Err(ReportError::Ocr(format!(
                "pdftoppm exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let mut pages = Vec::new();
        let mut entries = tokio::fs::read_dir(workdir)
            .await
            .map_err(ReportError::FileRead)?;
        while let Some(entry) = entries.next_entry().await.map_err(ReportError::FileRead)? {
            let path = entry.path();
            let is_page = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("page") && n.ends_with(".png"));
            if is_page {
                pages.push(path);
            }
        }
        // pdftoppm zero-pads page numbers to a common width
        pages.sort();
        Ok(pages)
    }

    async fn process_pdf(&self, bytes: &[u8]) -> ReportResult<OcrResult> {
        let workdir = tempfile::tempdir().map_err(ReportError::StorageDirCreation)?;
        let pages = self.rasterise_pdf(bytes, workdir.path()).await?;
        if pages.is_empty() {
            return Err(ReportError::Ocr("PDF produced no pages".into()));
        }

        let mut texts = Vec::with_capacity(pages.len());
        let mut total_confidence = 0.0;
        for (index, page) in pages.iter().enumerate() {
            let image = tokio::fs::read(page).await.map_err(ReportError::FileRead)?;
            let (text, confidence) = self.ocr_image(&image).await?;
            texts.push(format!("--- Page {} ---\n{}", index + 1, text));
            total_confidence += confidence;
        }

        Ok(OcrResult::extracted(
            texts.join("\n\n"),
            total_confidence / pages.len() as f64,
            pages.len(),
        ))
    }
}

#[async_trait]
impl TextExtractor for TesseractExtractor {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    async fn extract(&self, bytes: &[u8], filename: &str) -> OcrResult {
        let extension = file_extension(filename).unwrap_or_default();
        let outcome = if extension == ".pdf" {
            self.process_pdf(bytes).await
        } else if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            self.ocr_image(bytes)
                .await
                .map(|(text, confidence)| OcrResult::extracted(text, confidence, 1))
        } else {
            return OcrResult::failed(format!("Unsupported file type: {}", extension));
        };

        outcome.unwrap_or_else(|e| {
            tracing::warn!("OCR failed for {}: {:?}", filename, e);
            OcrResult::failed(e.to_string())
        })
    }
}

/// Returns the bundled sample report regardless of input. Used for demos and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct SampleTextExtractor;

#[async_trait]
impl TextExtractor for SampleTextExtractor {
    fn name(&self) -> &'static str {
        "sample"
    }

    async fn extract(&self, _bytes: &[u8], _filename: &str) -> OcrResult {
        OcrResult::extracted(SAMPLE_REPORT_TEXT.to_string(), ASSUMED_CONFIDENCE, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t2480\t3508\t-1\t
4\t1\t1\t1\t1\t0\t100\t100\t900\t40\t-1\t
5\t1\t1\t1\t1\t1\t100\t100\t300\t40\t96.5\tHemoglobin:
5\t1\t1\t1\t1\t2\t420\t100\t80\t40\t91.2\t11.2
5\t1\t1\t1\t1\t3\t520\t100\t90\t40\t88.0\tg/dL
5\t1\t1\t1\t2\t1\t100\t160\t300\t40\t-1\t
5\t1\t1\t1\t2\t2\t100\t160\t300\t40\t84.3\tTSH:
5\t1\t1\t1\t2\t3\t420\t160\t80\t40\t0\t2.5
";

    #[test]
    fn tsv_rebuilds_lines_and_averages_positive_confidence() {
        let (text, confidence) = parse_tesseract_tsv(TSV);
        assert_eq!(text, "Hemoglobin: 11.2 g/dL\nTSH: 2.5");
        let expected = (96.5 + 91.2 + 88.0 + 84.3) / 4.0 / 100.0;
        assert!((confidence - expected).abs() < 1e-9);
    }

    #[test]
    fn empty_tsv_has_zero_confidence() {
        assert_eq!(parse_tesseract_tsv(""), (String::new(), 0.0));
    }

    #[test]
    fn confidence_checks() {
        let good = OcrResult::extracted(SAMPLE_REPORT_TEXT.to_string(), 0.95, 1);
        assert_eq!(check_confidence(&good, 0.7), (true, "OCR processing successful".to_string()));

        let blurry = OcrResult::extracted(SAMPLE_REPORT_TEXT.to_string(), 0.42, 1);
        let (ok, message) = check_confidence(&blurry, 0.7);
        assert!(!ok);
        assert_eq!(
            message,
            "OCR confidence (42%) is below threshold (70%). Please upload a clearer image or PDF."
        );

        let short = OcrResult::extracted("Hemoglobin 11.2".into(), 0.99, 1);
        let (ok, message) = check_confidence(&short, 0.7);
        assert!(!ok);
        assert!(message.starts_with("Could not extract sufficient text"));

        let (ok, message) = check_confidence(&OcrResult::failed("boom"), 0.7);
        assert!(!ok);
        assert_eq!(message, "OCR processing failed: boom");
    }

    #[tokio::test]
    async fn sample_extractor_returns_sample_text() {
        let result = SampleTextExtractor.extract(b"", "report.png").await;
        assert!(result.success);
        assert_eq!(result.confidence, ASSUMED_CONFIDENCE);
        assert!(result.meaningful_len() > MIN_OCR_TEXT_LEN);
    }

    #[tokio::test]
    async fn unsupported_extension_fails_without_running_anything() {
        let extractor = TesseractExtractor::new("/nonexistent/tesseract", "/nonexistent/pdftoppm");
        let result = extractor.extract(b"hello", "notes.txt").await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Unsupported file type: .txt"));
    }

    #[tokio::test]
    async fn missing_binaries_are_reported_not_raised() {
        let extractor = TesseractExtractor::new("/nonexistent/tesseract", "/nonexistent/pdftoppm");

        let image = extractor.extract(b"\x89PNG\r\n\x1a\n", "scan.png").await;
        assert!(!image.success);
        assert!(image.error.unwrap().contains("/nonexistent/tesseract"));

        let pdf = extractor.extract(b"%PDF-1.4", "scan.pdf").await;
        assert!(!pdf.success);
        assert!(pdf.error.unwrap().contains("/nonexistent/pdftoppm"));
    }

    #[test]
    fn engine_selection_follows_config() {
        let config = CoreConfig::default().with_ocr_engine(OcrEngine::Sample);
        assert_eq!(extractor_from_config(&config).name(), "sample");
        let config = CoreConfig::default();
        assert_eq!(extractor_from_config(&config).name(), "tesseract");
    }

    #[cfg(unix)]
    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Echoes stdin back as one TSV word; page 2 images score lower.
    #[cfg(unix)]
    const FAKE_TESSERACT: &str = r#"[ "$1 $2 $3" = "stdin stdout tsv" ] || exit 3
input=$(cat)
case "$input" in
  *PAGE2*) conf=70 ;;
  *) conf=90 ;;
esac
printf 'level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n'
printf '5\t1\t1\t1\t1\t1\t0\t0\t10\t10\t%s\t%s\n' "$conf" "$input"
"#;

    /// Writes two pages, the second one first.
    #[cfg(unix)]
    const FAKE_PDFTOPPM: &str = r#"[ "$1 $2 $3" = "-r 300 -png" ] || exit 3
[ -f "$4" ] || exit 4
printf 'PAGE2' > "$5-2.png"
printf 'PAGE1' > "$5-1.png"
"#;

    #[cfg(unix)]
    #[tokio::test]
    async fn tesseract_reads_images_from_stdin() {
        let bin = tempfile::TempDir::new().unwrap();
        let tesseract = script(bin.path(), "tesseract", FAKE_TESSERACT);
        let extractor = TesseractExtractor::new(tesseract, "/nonexistent/pdftoppm");

        let result = extractor.extract(b"PAGE1", "scan.JPG").await;
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.text, "PAGE1");
        assert!((result.confidence - 0.9).abs() < 1e-9);
        assert_eq!(result.page_count, 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn pdf_pages_are_ordered_marked_and_averaged() {
        let bin = tempfile::TempDir::new().unwrap();
        let tesseract = script(bin.path(), "tesseract", FAKE_TESSERACT);
        let pdftoppm = script(bin.path(), "pdftoppm", FAKE_PDFTOPPM);
        let extractor = TesseractExtractor::new(tesseract, pdftoppm);

        let result = extractor.extract(b"%PDF-1.4", "report.pdf").await;
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.page_count, 2);
        assert_eq!(result.text, "--- Page 1 ---\nPAGE1\n\n--- Page 2 ---\nPAGE2");
        assert!((result.confidence - 0.8).abs() < 1e-9);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn tesseract_failure_carries_stderr() {
        let bin = tempfile::TempDir::new().unwrap();
        let tesseract = script(bin.path(), "tesseract", "cat > /dev/null\necho 'cannot read image' >&2\nexit 1\n");
        let extractor = TesseractExtractor::new(tesseract, "/nonexistent/pdftoppm");

        let result = extractor.extract(b"garbage", "scan.png").await;
        assert!(!result.success);
        let error = result.error.unwrap();
        assert!(error.contains("tesseract exited with"), "{}", error);
        assert!(error.contains("cannot read image"));
    }
}

