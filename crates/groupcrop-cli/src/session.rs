//! The session orchestrator.
//!
//! Wires the group queue, the selection rectangle, the answer sheets and
//! the transform engine together, and owns the CSV logs. The frontend
//! drives it one call per user action; everything here is synchronous.
//!
//! # Flow
//!
//! ```text
//! next_group -> answer group questions -> commit_group
//!   -> per image: begin_image -> draw selection, answer -> commit_crop
//!   -> optional detail pass: begin_detail -> draw -> commit_detail
//! -> finish_group (flushes the buffered crop rows)
//! ```
//!
//! Crop rows are buffered until [`Session::finish_group`] so the detail
//! pass can still extend them; group rows are written immediately on
//! [`Session::commit_group`].

use std::fs;
use std::path::{Path, PathBuf};

use groupcrop_core::raster;
use groupcrop_core::{
    compute_crop_window, invert_zoom, rotation_degrees, GroupQueue, GroupView, QueueError,
    RgbBuffer, SelectionRectangle,
};
use log::{info, warn};
use thiserror::Error;

use crate::config::{QuestionSet, DETAIL_ZOOM};
use crate::io::{self, IoError};
use crate::questions::AnswerSheet;
use crate::record::{self, CropGeometry, CropLog, CropRecord, GroupLog, GroupRecord, LogError};

/// A commit that cannot proceed. Recoverable: the operator fixes the
/// input and tries again, nothing is written.
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("no group is active")]
    NoGroup,

    #[error("no image is loaded")]
    NoImage,

    #[error("no selection rectangle has been committed")]
    NoSelection,

    #[error("question '{0}' is unanswered")]
    MissingAnswer(String),

    #[error("no crop at index {0} in this group")]
    UnknownCrop(usize),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Commit(#[from] CommitError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Log(#[from] LogError),
}

/// Run-wide options, fixed at startup.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Mirror every image left-to-right before anything else.
    pub flip: bool,
    /// Display zoom for the primary cropping pass.
    pub zoom: f64,
    /// Root of the output tree; crops land under `crop/`, logs at the top.
    pub output_root: PathBuf,
}

/// The image currently being cropped.
struct CurrentImage {
    group_id: String,
    relative_dir: PathBuf,
    filename: String,
    raw: RgbBuffer,
}

/// A primary crop reloaded for the detail pass.
struct DetailTarget {
    index: usize,
    raw: RgbBuffer,
}

pub struct Session {
    queue: GroupQueue,
    options: SessionOptions,
    group_sheet: AnswerSheet,
    image_sheet: AnswerSheet,
    selection: SelectionRectangle,
    crop_log: CropLog,
    group_log: GroupLog,
    current: Option<CurrentImage>,
    detail: Option<DetailTarget>,
    /// Crop rows for the current group, held back for the detail pass.
    pending: Vec<CropRecord>,
}

impl Session {
    /// Build a session over an already-constructed queue.
    ///
    /// If a group log from a previous run exists under the output root,
    /// the queue is positioned after its last completed group and both
    /// logs are reopened for appending; otherwise fresh logs are created.
    pub fn create(
        mut queue: GroupQueue,
        questions: &QuestionSet,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        fs::create_dir_all(&options.output_root).map_err(LogError::Io)?;
        let groups_path = options.output_root.join("groups.csv");
        let crop_path = options.output_root.join("crop.csv");

        let group_sheet = AnswerSheet::new(&questions.group_level);
        let image_sheet = AnswerSheet::new(&questions.image_level);

        let marker = record::last_completed_group(&groups_path)?;
        let (crop_log, group_log) = match &marker {
            Some(last) => {
                info!("resuming after group '{last}'");
                queue.resume(last);
                (
                    CropLog::open_append(&crop_path)?,
                    GroupLog::open_append(&groups_path)?,
                )
            }
            None => (
                CropLog::create(&crop_path, &image_sheet.column_names())?,
                GroupLog::create(&groups_path, &group_sheet.column_names())?,
            ),
        };

        Ok(Self {
            queue,
            options,
            group_sheet,
            image_sheet,
            selection: SelectionRectangle::new(),
            crop_log,
            group_log,
            current: None,
            detail: None,
            pending: Vec::new(),
        })
    }

    pub fn queue(&self) -> &GroupQueue {
        &self.queue
    }

    pub fn selection_mut(&mut self) -> &mut SelectionRectangle {
        &mut self.selection
    }

    pub fn group_sheet_mut(&mut self) -> &mut AnswerSheet {
        &mut self.group_sheet
    }

    pub fn image_sheet_mut(&mut self) -> &mut AnswerSheet {
        &mut self.image_sheet
    }

    /// Move to the next group. `Ok(None)` once the queue is exhausted.
    ///
    /// Any crop rows still buffered for the previous group are flushed
    /// first, so a skipped detail pass never loses rows.
    pub fn next_group(&mut self) -> Result<Option<GroupView>, SessionError> {
        self.flush_pending()?;
        self.group_sheet.clear();
        self.drop_image_state();
        match self.queue.advance() {
            Ok(view) => Ok(Some(view)),
            Err(QueueError::Exhausted | QueueError::NothingBehind) => Ok(None),
        }
    }

    /// Step back to the previous group. `Ok(None)` when there is none;
    /// the queue is unchanged in that case.
    pub fn previous_group(&mut self) -> Result<Option<GroupView>, SessionError> {
        self.flush_pending()?;
        self.group_sheet.clear();
        self.drop_image_state();
        match self.queue.retreat() {
            Ok(view) => Ok(Some(view)),
            Err(QueueError::Exhausted | QueueError::NothingBehind) => Ok(None),
        }
    }

    /// Queue the current group for `times` more passes.
    pub fn repeat_group(&mut self, times: usize) {
        self.queue.repeat(times);
    }

    /// Write the group row. Requires every group-level question answered.
    pub fn commit_group(&mut self) -> Result<(), SessionError> {
        let group_id = self
            .queue
            .current_group()
            .ok_or(CommitError::NoGroup)?
            .id
            .clone();
        let answers = self.complete_answers_of(Sheet::Group)?;
        self.group_log.append(&GroupRecord { group_id, answers })?;
        Ok(())
    }

    /// Load the next image of the current group and reset the per-image
    /// state. The path must come from the current group's view.
    pub fn begin_image(&mut self, path: &Path) -> Result<(), SessionError> {
        let group = self.queue.current_group().ok_or(CommitError::NoGroup)?;
        let group_id = group.id.clone();
        let relative_dir = group.relative_dir.clone();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let raw = io::load_source(path, self.options.flip)?;
        self.current = Some(CurrentImage {
            group_id,
            relative_dir,
            filename,
            raw,
        });
        self.detail = None;
        self.selection.reset();
        self.image_sheet.clear();
        Ok(())
    }

    /// The preview for the loaded image: raw pixels at the display zoom.
    pub fn display(&self) -> Option<RgbBuffer> {
        self.current
            .as_ref()
            .map(|image| io::prepare_display(&image.raw, self.options.zoom))
    }

    /// Cut, save and record the primary crop for the loaded image.
    ///
    /// Requires a committed selection and a complete image answer sheet;
    /// otherwise nothing is written and the state is left for the operator
    /// to fix. The row is buffered until [`Session::finish_group`].
    pub fn commit_crop(&mut self) -> Result<(), SessionError> {
        let geometry = self.selection.geometry().ok_or(CommitError::NoSelection)?;
        let answers = self.complete_answers_of(Sheet::Image)?;
        let image = self.current.as_ref().ok_or(CommitError::NoImage)?;

        let degrees = rotation_degrees(geometry.angle);
        let source = if geometry.angle == 0.0 {
            image.raw.clone()
        } else {
            raster::rotate(&image.raw, degrees)
        };
        let window = compute_crop_window(&geometry, self.options.zoom, image.raw.size(), source.size())
            .clamp(source.size());
        let cropped = raster::crop(&source, &window);

        let out_path = self.crop_path(&image.relative_dir, &image.filename);
        self.save_or_warn(&out_path, &cropped)?;

        self.pending.push(CropRecord {
            group_id: image.group_id.clone(),
            primary: CropGeometry {
                filename: image.filename.clone(),
                rotation_degrees: degrees,
                window,
                flip: self.options.flip,
            },
            answers,
            detail: None,
        });
        self.selection.reset();
        self.image_sheet.clear();
        Ok(())
    }

    /// Filenames of this group's crops, in commit order, for the detail
    /// pass.
    pub fn detail_targets(&self) -> Vec<&str> {
        self.pending
            .iter()
            .map(|record| record.primary.filename.as_str())
            .collect()
    }

    /// Reload the `index`-th primary crop as the detail-pass source.
    pub fn begin_detail(&mut self, index: usize) -> Result<(), SessionError> {
        let record = self
            .pending
            .get(index)
            .ok_or(CommitError::UnknownCrop(index))?;
        let path = self.crop_path(&self.current_relative_dir(), &record.primary.filename);
        let raw = io::load_source(&path, false)?;
        self.detail = Some(DetailTarget { index, raw });
        self.selection.reset();
        Ok(())
    }

    /// The detail-pass preview: the primary crop magnified by the detail
    /// zoom.
    pub fn detail_display(&self) -> Option<RgbBuffer> {
        self.detail
            .as_ref()
            .map(|target| io::prepare_display(&target.raw, DETAIL_ZOOM))
    }

    /// Cut and save the detail crop, extending the buffered row.
    ///
    /// Same geometry pipeline as the primary crop, except the rectangle
    /// was drawn over a magnified preview, so the window is divided back
    /// by the detail zoom before cropping.
    pub fn commit_detail(&mut self) -> Result<(), SessionError> {
        let geometry = self.selection.geometry().ok_or(CommitError::NoSelection)?;
        let target = self.detail.as_ref().ok_or(CommitError::NoImage)?;
        let record = self
            .pending
            .get(target.index)
            .ok_or(CommitError::UnknownCrop(target.index))?;

        let degrees = rotation_degrees(geometry.angle);
        let source = if geometry.angle == 0.0 {
            target.raw.clone()
        } else {
            raster::rotate(&target.raw, degrees)
        };
        let window =
            compute_crop_window(&geometry, DETAIL_ZOOM, target.raw.size(), source.size());
        let window = invert_zoom(window, DETAIL_ZOOM).clamp(source.size());
        let cropped = raster::crop(&source, &window);

        let filename = detail_filename(&record.primary.filename);
        let out_path = self.crop_path(&self.current_relative_dir(), &filename);
        self.save_or_warn(&out_path, &cropped)?;

        let flip = self.options.flip;
        let index = target.index;
        self.pending[index].detail = Some(CropGeometry {
            filename,
            rotation_degrees: degrees,
            window,
            flip,
        });
        self.selection.reset();
        self.detail = None;
        Ok(())
    }

    /// Flush the group's buffered crop rows to the log.
    pub fn finish_group(&mut self) -> Result<(), SessionError> {
        self.flush_pending()
    }

    fn flush_pending(&mut self) -> Result<(), SessionError> {
        for record in self.pending.drain(..) {
            self.crop_log.append(&record)?;
        }
        Ok(())
    }

    fn drop_image_state(&mut self) {
        self.current = None;
        self.detail = None;
        self.selection.reset();
        self.image_sheet.clear();
    }

    /// Output path for a crop, mirroring the group's directory under
    /// `crop/`.
    fn crop_path(&self, relative_dir: &Path, filename: &str) -> PathBuf {
        self.options
            .output_root
            .join("crop")
            .join(relative_dir)
            .join(filename)
    }

    /// All crops of the current group share its relative directory.
    fn current_relative_dir(&self) -> PathBuf {
        self.queue
            .current_group()
            .map(|g| g.relative_dir.clone())
            .unwrap_or_default()
    }

    fn save_or_warn(&self, path: &Path, buffer: &RgbBuffer) -> Result<(), SessionError> {
        match io::save_crop(path, buffer) {
            Ok(()) => Ok(()),
            Err(IoError::EmptyCrop) => {
                warn!(
                    "selection outside the image: nothing to save for {}",
                    path.display()
                );
                Ok(())
            }
            Err(other) => Err(other.into()),
        }
    }

    fn complete_answers_of(&self, which: Sheet) -> Result<Vec<String>, CommitError> {
        let sheet = match which {
            Sheet::Group => &self.group_sheet,
            Sheet::Image => &self.image_sheet,
        };
        sheet.answers().ok_or_else(|| {
            CommitError::MissingAnswer(
                sheet
                    .first_missing()
                    .unwrap_or_default()
                    .to_string(),
            )
        })
    }
}

enum Sheet {
    Group,
    Image,
}

/// `a.jpg` -> `a_detail.jpg`; extensionless names just get the suffix.
fn detail_filename(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_detail.{ext}"),
        None => format!("{filename}_detail"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuestionSpec;
    use groupcrop_core::{GroupingMode, Point};
    use std::fs;

    fn spec(name: &str, answers: &[&str]) -> QuestionSpec {
        QuestionSpec {
            name: name.to_string(),
            description: name.to_string(),
            answers: answers.iter().map(|s| s.to_string()).collect(),
            open_ended: false,
        }
    }

    fn questions() -> QuestionSet {
        QuestionSet {
            group_level: vec![spec("habitat", &["forest", "field"])],
            image_level: vec![spec("count", &["0", "1", "2"])],
        }
    }

    fn gradient(width: u32, height: u32) -> RgbBuffer {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push((x * 5) as u8);
                pixels.push((y * 5) as u8);
                pixels.push(0);
            }
        }
        RgbBuffer::new(width, height, pixels)
    }

    /// One group "root/A" with two 40x30 images.
    fn image_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let group = dir.path().join("A");
        fs::create_dir_all(&group).unwrap();
        io::save_crop(&group.join("a.png"), &gradient(40, 30)).unwrap();
        io::save_crop(&group.join("b.png"), &gradient(40, 30)).unwrap();
        dir
    }

    fn session(images: &Path, output: &Path) -> Session {
        let queue = GroupQueue::from_dir(images, GroupingMode::Folder).unwrap();
        Session::create(
            queue,
            &questions(),
            SessionOptions {
                flip: false,
                zoom: 1.0,
                output_root: output.to_path_buf(),
            },
        )
        .unwrap()
    }

    fn draw_rect(session: &mut Session, a: Point, b: Point) {
        let rect = session.selection_mut();
        rect.begin_drag(a);
        rect.drag_to(b);
        rect.release();
    }

    #[test]
    fn test_full_group_pass_writes_crops_and_rows() {
        let images = image_tree();
        let output = tempfile::tempdir().unwrap();
        let mut session = session(images.path(), output.path());

        let view = session.next_group().unwrap().unwrap();
        assert_eq!(view.group_id, "root/A");
        assert_eq!(view.filenames.len(), 2);

        session.group_sheet_mut().questions_mut()[0].select("forest");
        session.commit_group().unwrap();

        for path in &view.filenames {
            session.begin_image(path).unwrap();
            draw_rect(&mut session, Point::new(5.0, 5.0), Point::new(25.0, 20.0));
            session.image_sheet_mut().questions_mut()[0].select("1");
            session.commit_crop().unwrap();
        }
        session.finish_group().unwrap();

        let crop_a = output.path().join("crop/A/a.png");
        let crop_b = output.path().join("crop/A/b.png");
        assert!(crop_a.exists());
        assert!(crop_b.exists());
        let saved = io::load_source(&crop_a, false).unwrap();
        assert_eq!(saved.width, 20);
        assert_eq!(saved.height, 15);

        let rows = fs::read_to_string(output.path().join("crop.csv")).unwrap();
        let mut lines = rows.lines();
        lines.next(); // header
        assert_eq!(lines.next().unwrap(), "root/A,a.png,-0.00,5,5,25,20,0,1");
        assert_eq!(lines.next().unwrap(), "root/A,b.png,-0.00,5,5,25,20,0,1");

        let groups = fs::read_to_string(output.path().join("groups.csv")).unwrap();
        assert!(groups.lines().nth(1).unwrap().starts_with("root/A,forest"));
    }

    #[test]
    fn test_commit_without_selection_is_rejected() {
        let images = image_tree();
        let output = tempfile::tempdir().unwrap();
        let mut session = session(images.path(), output.path());

        let view = session.next_group().unwrap().unwrap();
        session.begin_image(&view.filenames[0]).unwrap();
        session.image_sheet_mut().questions_mut()[0].select("0");
        assert!(matches!(
            session.commit_crop(),
            Err(SessionError::Commit(CommitError::NoSelection))
        ));
        // Nothing buffered, nothing written
        assert!(session.detail_targets().is_empty());
        assert!(!output.path().join("crop/A/a.png").exists());
    }

    #[test]
    fn test_commit_with_missing_answer_is_rejected() {
        let images = image_tree();
        let output = tempfile::tempdir().unwrap();
        let mut session = session(images.path(), output.path());

        let view = session.next_group().unwrap().unwrap();
        session.begin_image(&view.filenames[0]).unwrap();
        draw_rect(&mut session, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let err = session.commit_crop().unwrap_err();
        assert!(matches!(
            err,
            SessionError::Commit(CommitError::MissingAnswer(name)) if name == "count"
        ));
        // Selection survives a rejected commit
        assert!(session.selection_mut().geometry().is_some());
    }

    #[test]
    fn test_selection_fully_outside_records_row_without_file() {
        let images = image_tree();
        let output = tempfile::tempdir().unwrap();
        let mut session = session(images.path(), output.path());

        let view = session.next_group().unwrap().unwrap();
        session.begin_image(&view.filenames[0]).unwrap();
        draw_rect(
            &mut session,
            Point::new(100.0, 100.0),
            Point::new(140.0, 130.0),
        );
        session.image_sheet_mut().questions_mut()[0].select("0");
        session.commit_crop().unwrap();
        session.finish_group().unwrap();

        assert!(!output.path().join("crop/A/a.png").exists());
        let rows = fs::read_to_string(output.path().join("crop.csv")).unwrap();
        assert_eq!(
            rows.lines().nth(1).unwrap(),
            "root/A,a.png,-0.00,40,30,40,30,0,0"
        );
    }

    #[test]
    fn test_detail_pass_extends_row_and_saves_file() {
        let images = image_tree();
        let output = tempfile::tempdir().unwrap();
        let mut session = session(images.path(), output.path());

        let view = session.next_group().unwrap().unwrap();
        session.begin_image(&view.filenames[0]).unwrap();
        draw_rect(&mut session, Point::new(0.0, 0.0), Point::new(30.0, 20.0));
        session.image_sheet_mut().questions_mut()[0].select("2");
        session.commit_crop().unwrap();

        assert_eq!(session.detail_targets(), ["a.png"]);
        session.begin_detail(0).unwrap();
        // The detail preview is the 30x20 crop magnified by the detail zoom
        let preview = session.detail_display().unwrap();
        assert_eq!(preview.width, 60);
        assert_eq!(preview.height, 40);

        // Drawn on the magnified preview: (10,10)-(30,30) maps to (5,5)-(15,15)
        draw_rect(&mut session, Point::new(10.0, 10.0), Point::new(30.0, 30.0));
        session.commit_detail().unwrap();
        session.finish_group().unwrap();

        let detail = io::load_source(&output.path().join("crop/A/a_detail.png"), false).unwrap();
        assert_eq!(detail.width, 10);
        assert_eq!(detail.height, 10);

        let rows = fs::read_to_string(output.path().join("crop.csv")).unwrap();
        let row = rows.lines().nth(1).unwrap();
        assert!(row.starts_with("root/A,a.png,-0.00,0,0,30,20,0,2"));
        assert!(row.contains("a_detail.png,-0.00,5,5,15,15,0"));
    }

    #[test]
    fn test_skipping_detail_still_flushes_on_next_group() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["A", "B"] {
            let group = dir.path().join(name);
            fs::create_dir_all(&group).unwrap();
            io::save_crop(&group.join("img.png"), &gradient(20, 20)).unwrap();
        }
        let output = tempfile::tempdir().unwrap();
        let mut session = session(dir.path(), output.path());

        let view = session.next_group().unwrap().unwrap();
        session.begin_image(&view.filenames[0]).unwrap();
        draw_rect(&mut session, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        session.image_sheet_mut().questions_mut()[0].select("0");
        session.commit_crop().unwrap();

        // Moving on without finish_group must not lose the buffered row
        session.next_group().unwrap().unwrap();
        let rows = fs::read_to_string(output.path().join("crop.csv")).unwrap();
        assert_eq!(rows.lines().count(), 2);
    }

    #[test]
    fn test_resume_skips_completed_groups() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["A", "B"] {
            let group = dir.path().join(name);
            fs::create_dir_all(&group).unwrap();
            io::save_crop(&group.join("img.png"), &gradient(20, 20)).unwrap();
        }
        let output = tempfile::tempdir().unwrap();

        {
            let mut session = session(dir.path(), output.path());
            session.next_group().unwrap().unwrap();
            session.group_sheet_mut().questions_mut()[0].select("forest");
            session.commit_group().unwrap();
        }

        // A fresh session over the same output resumes after root/A
        let mut session = session(dir.path(), output.path());
        let view = session.next_group().unwrap().unwrap();
        assert_eq!(view.group_id, "root/B");
        assert_eq!(session.queue().groups_complete(), 1);
    }

    #[test]
    fn test_exhausted_queue_yields_none() {
        let images = image_tree();
        let output = tempfile::tempdir().unwrap();
        let mut session = session(images.path(), output.path());

        assert!(session.next_group().unwrap().is_some());
        assert!(session.next_group().unwrap().is_none());
    }

    #[test]
    fn test_previous_group_on_empty_history_yields_none() {
        let images = image_tree();
        let output = tempfile::tempdir().unwrap();
        let mut session = session(images.path(), output.path());
        assert!(session.previous_group().unwrap().is_none());
    }

    #[test]
    fn test_detail_filename() {
        assert_eq!(detail_filename("a.jpg"), "a_detail.jpg");
        assert_eq!(detail_filename("shot.01.png"), "shot.01_detail.png");
        assert_eq!(detail_filename("noext"), "noext_detail");
    }
}
