//! Driving a print job.
//!
//! A [`Driver`] goes through the stages of a job: it is opened with
//! [`Driver::begin_job`], receives any number of pages through
//! [`Driver::render_page`] and is closed with [`Driver::finish`], which writes
//! everything that is shared by all pages and hands back the output sink.
//!
//! Every page is replayed twice. The first pass only collects the tiling patterns and
//! the cross reference destinations a page needs, so that they exist once the second
//! pass writes the page content.

mod draw;
mod pixels;
mod text;

use std::collections::{BTreeSet, HashMap};
use std::io::{self, Write};

use pdf_writer::types::PageMode;
use pdf_writer::writers::{Catalog, DocumentInfo};
use pdf_writer::{Finish, Name, Ref, TextStr};

use crate::configure::JobSettings;
use crate::content::ContentBuilder;
use crate::error::{DefinitionError, DriverError, DriverResult, OpError};
use crate::font::cache::FontCache;
use crate::font::user::UserEncodings;
use crate::font::FontList;
use crate::graphics_state::{GraphicsState, GraphicsStates};
use crate::image::{ColorMap, ImageCache};
use crate::interactive::annotation::LinkAnnotation;
use crate::interactive::bookmark::Bookmarks;
use crate::interactive::weblink::web_links;
use crate::interactive::xref::XRefs;
use crate::object::ext_g_state::ExtGState;
use crate::object::font::FontWriter;
use crate::object::tiling_pattern::TilingPattern;
use crate::page::{InternalPage, PageSetup};
use crate::picture::{DrawOp, PageDescription, Picture};
use crate::report::{Report, ReportKind};
use crate::serialize::PdfSerializer;
use crate::text::{Line, TextLine};

/// The stage a job is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    /// No job was started yet.
    Idle,
    /// The job was started, but no page was rendered.
    JobOpen,
    /// A page is being rendered.
    PageOpen,
    /// At least one page was rendered.
    PageClosed,
    /// The job is finished.
    JobClosed,
}

/// The passes over a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pass {
    /// Create the patterns and cross reference destinations of the page.
    CollectPatterns,
    /// Write the page.
    Render,
}

/// Why a drawing operation failed.
#[derive(Debug)]
pub(crate) enum Failure {
    /// Only the operation is affected.
    Op(OpError),
    /// The job can't continue.
    Fatal(DriverError),
}

impl From<OpError> for Failure {
    fn from(err: OpError) -> Self {
        Failure::Op(err)
    }
}

impl From<DriverError> for Failure {
    fn from(err: DriverError) -> Self {
        Failure::Fatal(err)
    }
}

impl From<io::Error> for Failure {
    fn from(err: io::Error) -> Self {
        Failure::Fatal(DriverError::Io(err))
    }
}

/// Turns the pages of a print job into a PDF document written to `W`.
///
/// ```
/// use pdf_print_driver::{DrawOp, Driver, FontList, JobSettings, PageDescription, Picture};
/// use pdf_print_driver::geom::Rect;
///
/// let mut driver = Driver::new(Vec::new());
/// driver.begin_job(JobSettings::default(), FontList::default()).unwrap();
///
/// let picture = Picture::new(vec![DrawOp::FillRect {
///     rect: Rect::from_ltrb(10.0, 10.0, 100.0, 50.0),
/// }]);
/// let errors = driver.render_page(&PageDescription::a4(vec![picture])).unwrap();
/// assert!(errors.is_empty());
///
/// let (pdf, report) = driver.finish().unwrap();
/// assert!(pdf.starts_with(b"%PDF-1.3"));
/// assert!(!report.has_errors());
/// ```
pub struct Driver<W: Write> {
    stage: JobStage,
    sink: Option<W>,
    color_map: ColorMap,
    job: Option<Job<W>>,
}

impl<W: Write> Driver<W> {
    /// Create a new driver writing to `sink`.
    pub fn new(sink: W) -> Self {
        Self {
            stage: JobStage::Idle,
            sink: Some(sink),
            color_map: ColorMap::default(),
            job: None,
        }
    }

    /// Use a different palette for [`PixelFormat::Cmap8`](crate::PixelFormat::Cmap8)
    /// images.
    pub fn with_color_map(mut self, color_map: ColorMap) -> Self {
        self.color_map = color_map;
        self
    }

    /// The current stage of the job.
    pub fn stage(&self) -> JobStage {
        self.stage
    }

    fn check_stage(&self, operation: &'static str, allowed: &[JobStage]) -> DriverResult<()> {
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            Err(DriverError::Stage {
                operation,
                stage: self.stage,
            })
        }
    }

    fn stage_error(&self, operation: &'static str) -> DriverError {
        DriverError::Stage {
            operation,
            stage: self.stage,
        }
    }

    /// Start the job. This writes the file header.
    pub fn begin_job(&mut self, settings: JobSettings, fonts: FontList) -> DriverResult<()> {
        self.check_stage("begin_job", &[JobStage::Idle])?;
        let sink = self.sink.take().ok_or_else(|| self.stage_error("begin_job"))?;

        self.job = Some(Job::new(
            sink,
            settings,
            fonts,
            std::mem::take(&mut self.color_map),
        )?);
        self.stage = JobStage::JobOpen;

        Ok(())
    }

    /// Render a page and write it to the document.
    ///
    /// Drawing operations that fail don't interrupt the page. They are reported and
    /// returned.
    pub fn render_page(&mut self, page: &PageDescription) -> DriverResult<Vec<OpError>> {
        self.check_stage("render_page", &[JobStage::JobOpen, JobStage::PageClosed])?;
        let job = self
            .job
            .as_mut()
            .ok_or(DriverError::Stage {
                operation: "render_page",
                stage: self.stage,
            })?;

        self.stage = JobStage::PageOpen;
        let errors = job.render_page(page)?;
        self.stage = JobStage::PageClosed;

        Ok(errors)
    }

    /// Finish the job, returning the sink and the report of the job.
    pub fn finish(&mut self) -> DriverResult<(W, Report)> {
        self.check_stage("finish", &[JobStage::JobOpen, JobStage::PageClosed])?;
        let job = self.job.take().ok_or_else(|| self.stage_error("finish"))?;
        self.stage = JobStage::JobClosed;

        job.finish()
    }
}

/// Everything shared by the pages of a job.
pub(crate) struct Job<W: Write> {
    settings: JobSettings,
    fonts: FontList,
    sc: PdfSerializer<W>,
    report: Report,
    pages_ref: Ref,
    page_refs: Vec<Ref>,
    font_cache: FontCache,
    user_encodings: UserEncodings,
    color_map: ColorMap,
    image_cache: ImageCache,
    ext_g_states: HashMap<ExtGState, Ref>,
    patterns: HashMap<TilingPattern, Ref>,
    bookmarks: Option<Bookmarks>,
    xrefs: Option<XRefs>,
    used_fonts: BTreeSet<String>,
    /// Characters without any encoding are only reported once per job.
    reported_unmappable: bool,
}

impl<W: Write> Job<W> {
    fn new(
        sink: W,
        settings: JobSettings,
        fonts: FontList,
        color_map: ColorMap,
    ) -> DriverResult<Self> {
        let mut sc = PdfSerializer::new(sink, settings.pdf_compatibility)?;
        let pages_ref = sc.new_ref();
        let mut report = Report::new(settings.record_debug);

        let bookmarks = if settings.create_bookmarks {
            load_definitions(
                "bookmark",
                settings.bookmark_definition_file.as_deref(),
                Bookmarks::load,
                &mut report,
            )
        } else {
            None
        };

        let xrefs = if settings.create_xrefs {
            load_definitions(
                "cross reference",
                settings.xrefs_file.as_deref(),
                XRefs::load,
                &mut report,
            )
        } else {
            None
        };

        Ok(Self {
            settings,
            fonts,
            sc,
            report,
            pages_ref,
            page_refs: vec![],
            font_cache: FontCache::new(),
            user_encodings: UserEncodings::new(),
            color_map,
            image_cache: ImageCache::new(),
            ext_g_states: HashMap::new(),
            patterns: HashMap::new(),
            bookmarks,
            xrefs,
            used_fonts: BTreeSet::new(),
            reported_unmappable: false,
        })
    }

    fn compression_level(&self) -> Option<u8> {
        self.settings.compression_level()
    }

    /// The graphics state setting a constant opacity, written on first use.
    fn ext_g_state(&mut self, alpha: u8) -> io::Result<Ref> {
        let ext_g_state = ExtGState::new(alpha);

        if let Some(root_ref) = self.ext_g_states.get(&ext_g_state) {
            return Ok(*root_ref);
        }

        let root_ref = self.sc.new_ref();
        self.sc.write_chunk(root_ref, &ext_g_state.serialize(root_ref))?;
        self.ext_g_states.insert(ext_g_state, root_ref);

        Ok(root_ref)
    }

    /// The tiling pattern for a stipple pattern and two colors, written on first
    /// use.
    fn tiling_pattern(&mut self, pattern: TilingPattern) -> io::Result<Ref> {
        if let Some(root_ref) = self.patterns.get(&pattern) {
            return Ok(*root_ref);
        }

        let root_ref = self.sc.new_ref();
        let chunk = pattern.serialize(root_ref, self.compression_level());
        self.sc.write_chunk(root_ref, &chunk)?;
        self.patterns.insert(pattern, root_ref);

        Ok(root_ref)
    }

    fn render_page(&mut self, page: &PageDescription) -> DriverResult<Vec<OpError>> {
        let page_index = self.page_refs.len();
        let page_ref = self.sc.new_ref();
        let setup = PageSetup::new(page);

        log::debug!("rendering page {}", page_index + 1);

        self.image_cache.next_pass();
        let mut ctx = PageContext::new(self, Pass::CollectPatterns, setup, page_index, page_ref);
        ctx.replay_pictures(&page.pictures)?;
        ctx.finish()?;

        self.image_cache.next_pass();
        let mut ctx = PageContext::new(self, Pass::Render, setup, page_index, page_ref);
        ctx.replay_pictures(&page.pictures)?;
        let (internal_page, errors) = ctx.finish()?;

        let compression_level = self.compression_level();
        internal_page.serialize(&mut self.sc, page_ref, self.pages_ref, compression_level)?;
        self.page_refs.push(page_ref);

        Ok(errors)
    }

    fn finish(mut self) -> DriverResult<(W, Report)> {
        self.image_cache.flush();

        FontWriter::new(&self.user_encodings, self.compression_level())
            .write_all(&self.font_cache, &mut self.sc)?;

        let outline = match &self.bookmarks {
            Some(bookmarks) => bookmarks.serialize(&mut self.sc)?,
            None => None,
        };

        let info_ref = self.sc.new_ref();
        let doc_info = self.settings.document_info();
        self.sc.emit(info_ref, |chunk| {
            let mut info = chunk.indirect(info_ref).start::<DocumentInfo>();

            for (key, value) in &doc_info {
                let value = TextStr(value);

                match key.as_str() {
                    "Title" => {
                        info.title(value);
                    }
                    "Author" => {
                        info.author(value);
                    }
                    "Subject" => {
                        info.subject(value);
                    }
                    "Keywords" => {
                        info.keywords(value);
                    }
                    "Creator" => {
                        info.creator(value);
                    }
                    "Producer" => {
                        info.producer(value);
                    }
                    _ => {
                        info.pair(Name(key.as_bytes()), value);
                    }
                }
            }

            info.finish();
        })?;

        let pages_ref = self.pages_ref;
        let page_refs = std::mem::take(&mut self.page_refs);
        self.sc.emit(pages_ref, |chunk| {
            chunk
                .pages(pages_ref)
                .kids(page_refs.iter().copied())
                .count(page_refs.len() as i32);
        })?;

        let catalog_ref = self.sc.new_ref();
        self.sc.emit(catalog_ref, |chunk| {
            let mut catalog = chunk.indirect(catalog_ref).start::<Catalog>();
            catalog.pages(pages_ref);

            if let Some(outline) = outline {
                catalog.outlines(outline);
                catalog.page_mode(PageMode::UseOutlines);
            }

            catalog.finish();
        })?;

        let mut report = self.report;

        for name in &self.used_fonts {
            let embedded = self
                .fonts
                .embeddable(name, self.settings.max_embed_font_size);
            let how = if embedded { "embedded" } else { "not embedded" };
            report.add(ReportKind::Info, None, format!("used font '{name}' ({how})"));
        }

        let sink = self.sc.finish(catalog_ref, Some(info_ref))?;

        Ok((sink, report))
    }
}

/// Load the definition file of an optional feature. The feature is disabled if the
/// file can't be used.
fn load_definitions<T>(
    what: &str,
    path: Option<&std::path::Path>,
    load: impl FnOnce(&std::path::Path) -> Result<T, DefinitionError>,
    report: &mut Report,
) -> Option<T> {
    let Some(path) = path else {
        report.add(
            ReportKind::Warning,
            None,
            format!("no {what} definition file given, {what}s are disabled"),
        );
        return None;
    };

    match load(path) {
        Ok(definitions) => Some(definitions),
        Err(err) => {
            let kind = if err.is_missing() {
                ReportKind::Warning
            } else {
                ReportKind::Error
            };
            report.add(kind, None, format!("{err}, {what}s are disabled"));
            None
        }
    }
}

/// The state of one pass over a page.
pub(crate) struct PageContext<'a, W: Write> {
    job: &'a mut Job<W>,
    pass: Pass,
    setup: PageSetup,
    page_index: usize,
    page_ref: Ref,
    states: GraphicsStates,
    content: ContentBuilder,
    line: TextLine,
    annotations: Vec<LinkAnnotation>,
    errors: Vec<OpError>,
    /// Depth of the states the picture being replayed may not pop.
    floor: usize,
}

impl<'a, W: Write> PageContext<'a, W> {
    /// Begin a page: create the root state and push one state on top of it.
    fn new(
        job: &'a mut Job<W>,
        pass: Pass,
        setup: PageSetup,
        page_index: usize,
        page_ref: Ref,
    ) -> Self {
        let mut ctx = Self {
            job,
            pass,
            setup,
            page_index,
            page_ref,
            states: GraphicsStates::new(GraphicsState::new(setup.system())),
            content: ContentBuilder::new(),
            line: TextLine::new(),
            annotations: vec![],
            errors: vec![],
            floor: 0,
        };

        ctx.push_state();
        ctx
    }

    /// The page number used in reports.
    fn page_number(&self) -> u32 {
        self.page_index as u32 + 1
    }

    fn is_rendering(&self) -> bool {
        self.pass == Pass::Render
    }

    /// Add an entry to the job report. Only the render pass reports, the first
    /// pass would otherwise report everything twice.
    fn report(&mut self, kind: ReportKind, message: impl Into<String>) {
        if self.is_rendering() {
            let page = self.page_number();
            self.job.report.add(kind, Some(page), message);
        }
    }

    /// Record a failed operation.
    fn record(&mut self, err: OpError) {
        if self.is_rendering() {
            self.report(ReportKind::Error, err.to_string());
            self.errors.push(err);
        }
    }

    fn replay_pictures(&mut self, pictures: &[Picture]) -> DriverResult<()> {
        for picture in pictures {
            let depth = self.states.depth();

            self.states.set_origin(picture.origin);
            self.states.push_internal();
            let result = self.replay_nested(&picture.ops);
            self.pop_to(depth);
            result?;
        }

        Ok(())
    }

    /// Replay the operations of a nested picture, which can only pop the states it
    /// pushed itself.
    fn replay_nested(&mut self, ops: &[DrawOp]) -> DriverResult<()> {
        let floor = std::mem::replace(&mut self.floor, self.states.depth());
        let result = self.replay(ops);
        self.floor = floor;
        result
    }

    fn push_state(&mut self) {
        if self.states.save_state() {
            self.content.save_state();
        }
    }

    /// Pop a state pushed by the picture being replayed.
    fn pop_state(&mut self) -> Result<(), OpError> {
        if self.states.depth() <= self.floor {
            return Err(OpError::StackUnderflow);
        }

        self.restore_state()
    }

    fn restore_state(&mut self) -> Result<(), OpError> {
        if self.states.restore_state()? {
            self.content.restore_state();
        }

        Ok(())
    }

    /// Pop states until `depth` states are left on top of the root.
    fn pop_to(&mut self, depth: usize) {
        while self.states.depth() > depth {
            if self.restore_state().is_err() {
                break;
            }
        }
    }

    /// Hand a completed line to the interactive features.
    fn process_line(&mut self, line: Line) -> io::Result<()> {
        let job = &mut *self.job;
        let border_width = job.settings.link_border_width;

        match self.pass {
            Pass::CollectPatterns => {
                if let Some(xrefs) = &mut job.xrefs {
                    xrefs.record(&line, self.page_index, self.page_ref, &mut job.sc)?;
                }
            }
            Pass::Render => {
                if job.settings.create_web_links {
                    self.annotations.extend(web_links(&line, border_width));
                }

                if let Some(bookmarks) = &mut job.bookmarks {
                    bookmarks.collect(&line, self.page_ref);
                }

                if let Some(xrefs) = &job.xrefs {
                    self.annotations
                        .extend(xrefs.links(&line, self.page_index, border_width));
                }
            }
        }

        Ok(())
    }

    /// End the page: flush the text line and pop every state down to the root.
    fn finish(mut self) -> DriverResult<(InternalPage, Vec<OpError>)> {
        if let Some(line) = self.line.flush() {
            self.process_line(line)?;
        }

        self.pop_to(0);
        debug_assert_eq!(self.content.depth(), 0);

        let (content, resources) = self.content.finish();
        let page = InternalPage {
            setup: self.setup,
            content,
            resources,
            annotations: self.annotations,
        };

        Ok((page, self.errors))
    }
}
