use crate::config::Timing;
use crate::crawlers::crawler::PageFetcher;
use crate::results::NOT_AVAILABLE;
use crate::utils::{sanitize_filename, timestamp_stem};
use chrono::Local;
use image::{DynamicImage, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::time::sleep;

/// Raster written next to the PDFs while a snapshot is converted
const TEMP_SCREENSHOT: &str = "temp_screenshot.png";

/// Page geometry resolution of the written PDF
const PDF_DPI: f64 = 100.0;

/// Step at which a snapshot failed.
///
/// The display strings are what ends up in the PDF PATH column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SnapshotFailure {
    #[error("No URL found")]
    NoUrl,
    #[error("Failed to Load Page")]
    LoadPage,
    #[error("Folder Creation Failed")]
    FolderCreation,
    #[error("Screenshot failed")]
    Screenshot,
    #[error("Image conversion failed.")]
    ImageConversion,
    #[error("PDF save failed")]
    PdfSave,
}

/// A written snapshot and the file stem it was named with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub pdf_path: PathBuf,
    pub clean_title: String,
}

/// File stem for an article: its sanitized title, or a timestamp when it has none
pub fn snapshot_stem(title: &str) -> String {
    let title = title.trim();
    if title.is_empty() || title == NOT_AVAILABLE {
        sanitize_filename(&timestamp_stem(Local::now()))
    } else {
        sanitize_filename(title)
    }
}

/// Render `url`, screenshot the whole document and save it as `<pdf_dir>/<stem>.pdf`
pub async fn capture_pdf<F: PageFetcher + ?Sized>(
    fetcher: &mut F,
    url: &str,
    title: &str,
    pdf_dir: &Path,
    cookie_button: Option<&str>,
    timing: &Timing,
) -> Result<Snapshot, SnapshotFailure> {
    if url.trim().is_empty() || url == NOT_AVAILABLE {
        return Err(SnapshotFailure::NoUrl);
    }

    if let Err(e) = fetcher.render(url).await {
        ::log::warn!("Snapshot: could not load {}: {}", url, e);
        return Err(SnapshotFailure::LoadPage);
    }
    sleep(timing.page_settle()).await;

    if let Err(e) = fs::create_dir_all(pdf_dir) {
        ::log::error!("Snapshot: could not create {}: {}", pdf_dir.display(), e);
        return Err(SnapshotFailure::FolderCreation);
    }

    if let Some(cookie) = cookie_button {
        fetcher.dismiss_cookies(cookie).await;
    }

    let png = match fetcher.capture_full_page().await {
        Ok(png) => png,
        Err(e) => {
            ::log::warn!("Snapshot: screenshot of {} failed: {}", url, e);
            return Err(SnapshotFailure::Screenshot);
        }
    };

    let temp_path = pdf_dir.join(TEMP_SCREENSHOT);
    if let Err(e) = fs::write(&temp_path, &png) {
        ::log::warn!("Snapshot: could not write {}: {}", temp_path.display(), e);
        return Err(SnapshotFailure::Screenshot);
    }

    let decoded = image::open(&temp_path);
    if let Err(e) = fs::remove_file(&temp_path) {
        ::log::warn!("Unable to delete temporary screenshot: {}", e);
    }
    let rgb = match decoded {
        Ok(img) => DynamicImage::ImageRgb8(img.to_rgb8()),
        Err(e) => {
            ::log::warn!("Snapshot: screenshot of {} is not a readable image: {}", url, e);
            return Err(SnapshotFailure::ImageConversion);
        }
    };

    let clean_title = snapshot_stem(title);
    let pdf_path = pdf_dir.join(format!("{}.pdf", clean_title));

    if let Err(e) = save_as_pdf(&rgb, &pdf_path) {
        ::log::warn!("Snapshot: could not save {}: {}", pdf_path.display(), e);
        return Err(SnapshotFailure::PdfSave);
    }

    ::log::debug!("Saved snapshot of {} to {}", url, pdf_path.display());
    Ok(Snapshot {
        pdf_path,
        clean_title,
    })
}

/// JPEG-encode an RGB image and write it as a one page PDF
pub fn save_as_pdf(rgb: &DynamicImage, path: &Path) -> io::Result<()> {
    let mut jpeg = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
        .map_err(io::Error::other)?;
    let mut doc = image_document(jpeg, rgb.width(), rgb.height())?;
    doc.save(path).map_err(|e| io::Error::other(e.to_string()))?;
    Ok(())
}

/// Single page document showing one DCT (JPEG) image edge to edge.
///
/// The page is sized so the image prints at [`PDF_DPI`].
pub fn image_document(jpeg: Vec<u8>, width: u32, height: u32) -> io::Result<Document> {
    let page_w = (f64::from(width) * 72.0 / PDF_DPI) as f32;
    let page_h = (f64::from(height) * 72.0 / PDF_DPI) as f32;

    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8i64,
            "Filter" => "DCTDecode",
        },
        jpeg,
    ));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    page_w.into(),
                    0i64.into(),
                    0i64.into(),
                    page_h.into(),
                    0i64.into(),
                    0i64.into(),
                ],
            ),
            Operation::new("Do", vec!["Im0".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content.encode().map_err(|e| io::Error::other(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let media_box: Vec<Object> = vec![0i64.into(), 0i64.into(), page_w.into(), page_h.into()];
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => media_box,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
    });

    let kids: Vec<Object> = vec![page_id.into()];
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => 1i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawlers::tests::MockFetcher;
    use image::{Rgba, RgbaImage};

    const ARTICLE: &str = "https://example.com/news/trial";

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 30, 30, 128]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn fetcher_with_page(screenshot: Option<Vec<u8>>) -> MockFetcher {
        let mut fetcher = MockFetcher::new().with_rendered(ARTICLE, "<p>trial</p>".into());
        fetcher.screenshot = screenshot;
        fetcher
    }

    #[tokio::test]
    async fn test_snapshot_written_under_clean_title() {
        let dir = tempfile::tempdir().unwrap();
        let mut fetcher = fetcher_with_page(Some(png_bytes(200, 100)));
        fetcher.cookie_banner = true;

        let snapshot = capture_pdf(
            &mut fetcher,
            ARTICLE,
            "Trial: Results <Phase 2>",
            dir.path(),
            Some("//button"),
            &Timing::immediate(),
        )
        .await
        .unwrap();

        assert_eq!(snapshot.clean_title, "Trial_Results_Phase_2");
        assert_eq!(snapshot.pdf_path, dir.path().join("Trial_Results_Phase_2.pdf"));
        assert!(!dir.path().join(TEMP_SCREENSHOT).exists());
        assert_eq!(fetcher.cookie_clicks, 1);

        assert!(fs::read(&snapshot.pdf_path).unwrap().starts_with(b"%PDF-1.4"));

        let doc = Document::load(&snapshot.pdf_path).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page = doc.get_dictionary(pages[&1]).unwrap();

        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        let size = media_box
            .iter()
            .map(|v| v.as_float().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(size.len(), 4);
        assert!((size[2] - 144.0).abs() < 0.01);
        assert!((size[3] - 72.0).abs() < 0.01);

        let image_id = page
            .get(b"Resources")
            .and_then(Object::as_dict)
            .and_then(|r| r.get(b"XObject"))
            .and_then(Object::as_dict)
            .and_then(|x| x.get(b"Im0"))
            .and_then(Object::as_reference)
            .unwrap();
        let image = doc.get_object(image_id).unwrap().as_stream().unwrap();
        assert_eq!(image.dict.get(b"Width").unwrap().as_i64().unwrap(), 200);
        assert_eq!(image.dict.get(b"Height").unwrap().as_i64().unwrap(), 100);
        assert_eq!(image.dict.get(b"Filter").unwrap().as_name().unwrap(), &b"DCTDecode"[..]);
        assert!(image.content.starts_with(&[0xFF, 0xD8]));
    }

    #[tokio::test]
    async fn test_untitled_article_uses_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let mut fetcher = fetcher_with_page(Some(png_bytes(10, 10)));

        let snapshot = capture_pdf(
            &mut fetcher,
            ARTICLE,
            NOT_AVAILABLE,
            dir.path(),
            None,
            &Timing::immediate(),
        )
        .await
        .unwrap();

        assert!(snapshot.clean_title.starts_with("webpage_"));
        assert!(snapshot.pdf_path.exists());
    }

    #[tokio::test]
    async fn test_each_failing_step_has_its_own_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let timing = Timing::immediate();

        let mut fetcher = fetcher_with_page(Some(png_bytes(10, 10)));
        let err = capture_pdf(&mut fetcher, "", "t", dir.path(), None, &timing)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No URL found");

        let err = capture_pdf(&mut fetcher, "https://example.com/gone", "t", dir.path(), None, &timing)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to Load Page");

        let mut fetcher = fetcher_with_page(None);
        let err = capture_pdf(&mut fetcher, ARTICLE, "t", dir.path(), None, &timing)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Screenshot failed");

        let mut fetcher = fetcher_with_page(Some(b"not an image".to_vec()));
        let err = capture_pdf(&mut fetcher, ARTICLE, "t", dir.path(), None, &timing)
            .await
            .unwrap_err();
        assert_eq!(err, SnapshotFailure::ImageConversion);
        assert_eq!(err.to_string(), "Image conversion failed.");
        assert!(!dir.path().join(TEMP_SCREENSHOT).exists());

        // A directory where the PDF should go makes the save fail
        fs::create_dir_all(dir.path().join("t.pdf")).unwrap();
        let mut fetcher = fetcher_with_page(Some(png_bytes(10, 10)));
        let err = capture_pdf(&mut fetcher, ARTICLE, "t", dir.path(), None, &timing)
            .await
            .unwrap_err();
        assert_eq!(err, SnapshotFailure::PdfSave);
    }

    #[test]
    fn test_snapshot_stem() {
        assert_eq!(snapshot_stem("Phase 2 | Results?"), "Phase_2__Results");
        assert!(snapshot_stem("N/A").starts_with("webpage_"));
        assert!(snapshot_stem("   ").starts_with("webpage_"));
    }
}
