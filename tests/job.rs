use pdf_print_driver::geom::{Point, Rect};
use pdf_print_driver::{
    DrawOp, DrawingMode, Driver, DriverError, FontList, JobSettings, JobStage, OpError,
    PageDescription, Pattern, PdfVersion, Picture, PixelFormat, ReportKind, Rgba,
};

fn settings() -> JobSettings {
    JobSettings {
        pdf_compression: 0,
        ..JobSettings::default()
    }
}

/// Render each list of operations as one page and return the document.
fn render(settings: JobSettings, pages: Vec<Vec<DrawOp>>) -> (String, Vec<Vec<OpError>>) {
    let mut driver = Driver::new(Vec::new());
    driver.begin_job(settings, FontList::default()).unwrap();

    let errors = pages
        .into_iter()
        .map(|ops| {
            driver
                .render_page(&PageDescription::a4(vec![Picture::new(ops)]))
                .unwrap()
        })
        .collect();

    let (pdf, _) = driver.finish().unwrap();

    (String::from_utf8_lossy(&pdf).into_owned(), errors)
}

fn gray_pixels(left: f32) -> DrawOp {
    DrawOp::DrawPixels {
        src: Rect::from_ltrb(0.0, 0.0, 1.0, 1.0),
        dest: Rect::from_ltrb(left, 10.0, left + 39.0, 49.0),
        bytes_per_row: 2,
        format: PixelFormat::Gray8,
        data: vec![0, 85, 170, 255],
    }
}

#[test]
fn stages_are_enforced() {
    let mut driver = Driver::new(Vec::new());
    let page = PageDescription::a4(vec![]);

    assert!(matches!(
        driver.render_page(&page),
        Err(DriverError::Stage {
            stage: JobStage::Idle,
            ..
        })
    ));

    driver.begin_job(settings(), FontList::default()).unwrap();
    assert!(driver.begin_job(settings(), FontList::default()).is_err());
    driver.render_page(&page).unwrap();
    assert_eq!(driver.stage(), JobStage::PageClosed);

    driver.finish().unwrap();
    assert_eq!(driver.stage(), JobStage::JobClosed);
    assert!(driver.render_page(&page).is_err());
    assert!(driver.finish().is_err());
}

#[test]
fn empty_job_is_a_valid_document() {
    let mut driver = Driver::new(Vec::new());
    driver.begin_job(settings(), FontList::default()).unwrap();
    let (pdf, report) = driver.finish().unwrap();
    let text = String::from_utf8_lossy(&pdf);

    assert!(text.starts_with("%PDF-1.3"));
    assert!(text.contains("/Count 0"));
    assert!(text.contains("/Title (Untitled)"));
    assert!(text.trim_end().ends_with("%%EOF"));
    assert!(!report.has_errors());
}

#[test]
fn unbalanced_pops_are_reported() {
    let mut ops = vec![DrawOp::PushState; 3];
    ops.extend(vec![DrawOp::PopState; 4]);
    ops.push(DrawOp::FillRect {
        rect: Rect::from_ltrb(0.0, 0.0, 10.0, 10.0),
    });

    let (text, errors) = render(settings(), vec![ops]);

    assert_eq!(errors[0].len(), 1);
    assert!(matches!(errors[0][0], OpError::StackUnderflow));
    // The page is still written after the failing operation.
    assert!(text.contains("\nf\n"));
}

#[test]
fn identical_images_are_written_once() {
    let (text, errors) = render(settings(), vec![vec![gray_pixels(10.0), gray_pixels(100.0)]]);

    assert!(errors[0].is_empty());
    assert_eq!(text.matches("/Subtype /Image").count(), 1);
    assert_eq!(text.matches(" Do\n").count(), 2);
}

#[test]
fn pixels_while_clipping_fail() {
    let clip = Picture::new(vec![gray_pixels(0.0)]);
    let ops = vec![DrawOp::ClipToPicture {
        picture: clip,
        origin: Point::default(),
        inverse: false,
    }];

    let (_, errors) = render(settings(), vec![ops]);
    assert!(matches!(errors[0][..], [OpError::PixelsInClip]));
}

#[test]
fn inverse_clipping_is_rejected() {
    let ops = vec![DrawOp::ClipToPicture {
        picture: Picture::default(),
        origin: Point::default(),
        inverse: true,
    }];

    let (_, errors) = render(settings(), vec![ops]);
    assert!(matches!(errors[0][..], [OpError::InverseClip]));
}

#[test]
fn transparency_shares_graphics_states() {
    let translucent = Rgba::new(255, 0, 0, 128);
    let rect = |left: f32| DrawOp::FillRect {
        rect: Rect::from_ltrb(left, 0.0, left + 20.0, 20.0),
    };
    let ops = vec![
        DrawOp::SetDrawingMode {
            mode: DrawingMode::Alpha,
        },
        DrawOp::SetForeColor { color: translucent },
        rect(0.0),
        rect(50.0),
    ];

    let v14 = JobSettings {
        pdf_compatibility: PdfVersion::Pdf14,
        ..settings()
    };
    let (text, _) = render(v14, vec![ops.clone(), ops.clone()]);
    assert_eq!(text.matches("/Type /ExtGState").count(), 1);
    assert_eq!(text.matches(" gs\n").count(), 4);

    // PDF 1.3 has no constant opacity.
    let (text, _) = render(settings(), vec![ops]);
    assert_eq!(text.matches("/Type /ExtGState").count(), 0);
}

#[test]
fn stipple_patterns_are_shared_between_pages() {
    let ops = vec![
        DrawOp::SetStipplePattern {
            pattern: Pattern([0xAA, 0x55, 0xAA, 0x55, 0xAA, 0x55, 0xAA, 0x55]),
        },
        DrawOp::FillEllipse {
            center: Point::new(100.0, 100.0),
            radii: Point::new(40.0, 20.0),
        },
    ];

    let (text, errors) = render(settings(), vec![ops.clone(), ops]);

    assert!(errors.iter().all(Vec::is_empty));
    assert_eq!(text.matches("/PatternType 1").count(), 1);
    assert_eq!(text.matches("/Pattern cs").count(), 2);
}

#[test]
fn repeated_paints_reuse_their_objects() {
    let rect = |left: f32| DrawOp::FillRect {
        rect: Rect::from_ltrb(left, 0.0, left + 20.0, 20.0),
    };
    let ops = vec![
        DrawOp::SetDrawingMode {
            mode: DrawingMode::Alpha,
        },
        DrawOp::SetForeColor {
            color: Rgba::new(0, 0, 255, 128),
        },
        DrawOp::SetStipplePattern {
            pattern: Pattern([0xF0, 0xF0, 0xF0, 0xF0, 0x0F, 0x0F, 0x0F, 0x0F]),
        },
        rect(0.0),
        rect(30.0),
        // Another low color is another pattern.
        DrawOp::SetBackColor {
            color: Rgba::new(255, 255, 0, 255),
        },
        rect(60.0),
    ];

    let v14 = JobSettings {
        pdf_compatibility: PdfVersion::Pdf14,
        ..settings()
    };
    let (text, errors) = render(v14, vec![ops]);

    assert!(errors[0].is_empty());
    assert_eq!(text.matches("/Type /ExtGState").count(), 1);
    assert_eq!(text.matches(" gs\n").count(), 3);
    assert_eq!(text.matches("/PatternType 1").count(), 2);
    assert_eq!(text.matches("/Pattern cs").count(), 3);
}

#[test]
fn pictures_cannot_pop_states_they_did_not_push() {
    let pictures = vec![
        Picture::new(vec![DrawOp::PushState, DrawOp::PushState]),
        Picture::new(vec![DrawOp::PopState, DrawOp::PushState, DrawOp::PopState]),
    ];

    let mut driver = Driver::new(Vec::new());
    driver.begin_job(settings(), FontList::default()).unwrap();
    let errors = driver.render_page(&PageDescription::a4(pictures)).unwrap();
    driver.finish().unwrap();

    assert!(matches!(errors[..], [OpError::StackUnderflow]));
}

#[test]
fn urls_become_links() {
    let ops = vec![
        DrawOp::SetPenLocation {
            location: Point::new(50.0, 100.0),
        },
        DrawOp::draw_string("visit www.example.com today", 0.0, 0.0),
    ];

    let with_links = JobSettings {
        create_web_links: true,
        ..settings()
    };
    let (text, _) = render(with_links, vec![ops.clone()]);

    assert!(text.contains("/Subtype /Link"));
    assert!(text.contains("/URI (http://www.example.com)"));
    assert!(text.contains("BT\n"));
    assert!(text.contains("/BaseFont /Helvetica"));

    let (text, _) = render(settings(), vec![ops]);
    assert!(!text.contains("/Subtype /Link"));
}

#[test]
fn missing_definition_files_disable_features() {
    let settings = JobSettings {
        create_bookmarks: true,
        bookmark_definition_file: Some("/nonexistent/bookmarks.json".into()),
        create_xrefs: true,
        xrefs_file: None,
        ..settings()
    };

    let mut driver = Driver::new(Vec::new());
    driver.begin_job(settings, FontList::default()).unwrap();
    driver
        .render_page(&PageDescription::a4(vec![Picture::new(vec![
            DrawOp::draw_string("Chapter", 0.0, 0.0),
        ])]))
        .unwrap();
    let (pdf, report) = driver.finish().unwrap();

    assert!(!String::from_utf8_lossy(&pdf).contains("/Outlines"));
    assert_eq!(report.count(ReportKind::Warning), 2);
    assert!(!report.has_errors());
}
