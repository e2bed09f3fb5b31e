use std::path::{Path, PathBuf};

use async_trait::async_trait;
use genpdf::{elements, fonts, style, Alignment, Element as _};

use crate::ports::pdf::{PdfWriterError, PdfWriterPort};

const CANDIDATE_FONT_DIRS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/liberation",
];
const FONT_NAME: &str = "DejaVuSans";

/// Renders the final transcript to PDF with `genpdf`, grounded on
/// `other_examples/manifests/gjovanov-roomler-ai`'s use of the crate and the
/// original `PdfWriterPort.write_pdf` shape (title, optional source url,
/// body lines, trailing sponsor text).
pub struct GenPdfWriterAdapter {
    font_dir: PathBuf,
}

impl GenPdfWriterAdapter {
    pub fn new(font_dir: Option<PathBuf>) -> Result<Self, PdfWriterError> {
        let font_dir = font_dir
            .filter(|dir| dir.exists())
            .or_else(|| {
                CANDIDATE_FONT_DIRS
                    .iter()
                    .map(PathBuf::from)
                    .find(|dir| dir.exists())
            })
            .ok_or_else(|| PdfWriterError::Failed("no usable font directory found".to_string()))?;
        Ok(GenPdfWriterAdapter { font_dir })
    }
}

#[async_trait]
impl PdfWriterPort for GenPdfWriterAdapter {
    async fn write_pdf(
        &self,
        pdf_path: &Path,
        title: Option<&str>,
        source_url: Option<&str>,
        transcript_lines: &[String],
        sponsor_text: &str,
    ) -> Result<PathBuf, PdfWriterError> {
        let font_dir = self.font_dir.clone();
        let pdf_path = pdf_path.to_path_buf();
        let title = title.map(str::to_string);
        let source_url = source_url.map(str::to_string);
        let transcript_lines = transcript_lines.to_vec();
        let sponsor_text = sponsor_text.to_string();

        tokio::task::spawn_blocking(move || {
            render(&font_dir, &pdf_path, title.as_deref(), source_url.as_deref(), &transcript_lines, &sponsor_text)
        })
        .await
        .map_err(|e| PdfWriterError::Failed(e.to_string()))?
    }
}

fn render(
    font_dir: &Path,
    pdf_path: &Path,
    title: Option<&str>,
    source_url: Option<&str>,
    transcript_lines: &[String],
    sponsor_text: &str,
) -> Result<PathBuf, PdfWriterError> {
    let font_family = fonts::from_files(font_dir, FONT_NAME, Some(fonts::Builtin::Helvetica))
        .map_err(|e| PdfWriterError::Failed(e.to_string()))?;

    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(title.unwrap_or("Transcript"));
    doc.set_minimal_conformance();
    doc.set_line_spacing(1.25);

    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);

    doc.push(
        elements::Paragraph::new(title.unwrap_or("Transcript"))
            .aligned(Alignment::Center)
            .styled(style::Style::new().bold().with_font_size(20)),
    );
    if let Some(url) = source_url {
        doc.push(elements::Break::new(0.5));
        doc.push(elements::Paragraph::new(format!("Source: {url}")).styled(style::Style::new().with_font_size(10)));
    }
    doc.push(elements::Break::new(1.5));

    for line in transcript_lines {
        if line.trim().is_empty() {
            continue;
        }
        doc.push(elements::Paragraph::new(line.clone()));
    }

    if !sponsor_text.trim().is_empty() {
        doc.push(elements::Break::new(1.5));
        doc.push(elements::Paragraph::new(sponsor_text).aligned(Alignment::Center).styled(style::Style::new().italic()));
    }

    if let Some(parent) = pdf_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PdfWriterError::Failed(e.to_string()))?;
    }
    doc.render_to_file(pdf_path).map_err(|e| PdfWriterError::Failed(e.to_string()))?;
    Ok(pdf_path.to_path_buf())
}
