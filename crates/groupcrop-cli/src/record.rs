//! Crop and group CSV logs.
//!
//! One row per cropped image in `crop.csv`, one row per finished group in
//! `groups.csv`. The group log doubles as the resume marker: on startup
//! the last logged `group_id` tells the queue where the previous run
//! stopped.
//!
//! Crop rows are variable length: the fixed geometry columns, one column
//! per image-level question, then optionally a detail block with the same
//! shape as the geometry columns. Rows are only flushed once the detail
//! pass had its chance to extend them.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use groupcrop_core::CropWindow;
use thiserror::Error;

/// Fixed leading columns of a crop row.
pub const CROP_COLUMNS: &[&str] = &[
    "group_id",
    "image",
    "rotation_degrees",
    "upperleft_x",
    "upperleft_y",
    "lowerright_x",
    "lowerright_y",
    "flip",
];

/// Columns of the optional detail block.
pub const DETAIL_COLUMNS: &[&str] = &[
    "detail_image",
    "rotation_degrees_detail",
    "upperleft_x_detail",
    "upperleft_y_detail",
    "lowerright_x_detail",
    "lowerright_y_detail",
    "flip_detail",
];

#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to access log file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to write log row: {0}")]
    Csv(#[from] csv::Error),
}

/// The geometry half of a crop row: where the crop was taken and under
/// which transform.
#[derive(Debug, Clone, PartialEq)]
pub struct CropGeometry {
    pub filename: String,
    /// Rotation applied to the source, in degrees (negated UI angle).
    pub rotation_degrees: f64,
    /// Clamped crop window in source pixels.
    pub window: CropWindow,
    pub flip: bool,
}

impl CropGeometry {
    fn push_columns(&self, row: &mut Vec<String>) {
        row.push(self.filename.clone());
        row.push(format!("{:.2}", self.rotation_degrees));
        row.push(fmt_coord(self.window.upper_left.x));
        row.push(fmt_coord(self.window.upper_left.y));
        row.push(fmt_coord(self.window.lower_right.x));
        row.push(fmt_coord(self.window.lower_right.y));
        row.push(String::from(if self.flip { "1" } else { "0" }));
    }
}

/// One completed crop, optionally extended with a detail crop.
#[derive(Debug, Clone, PartialEq)]
pub struct CropRecord {
    pub group_id: String,
    pub primary: CropGeometry,
    pub answers: Vec<String>,
    pub detail: Option<CropGeometry>,
}

impl CropRecord {
    fn to_row(&self) -> Vec<String> {
        let mut row = vec![self.group_id.clone()];
        self.primary.push_columns(&mut row);
        row.extend(self.answers.iter().cloned());
        if let Some(detail) = &self.detail {
            detail.push_columns(&mut row);
        }
        row
    }
}

/// One finished group with its group-level answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
    pub group_id: String,
    pub answers: Vec<String>,
}

/// Append-only CSV writer for crop rows.
pub struct CropLog {
    writer: csv::Writer<File>,
}

impl CropLog {
    /// Start a fresh log, writing the header row.
    pub fn create(path: &Path, question_names: &[String]) -> Result<Self, LogError> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(File::create(path)?);
        let mut header: Vec<String> = CROP_COLUMNS.iter().map(|s| s.to_string()).collect();
        header.extend(question_names.iter().cloned());
        header.extend(DETAIL_COLUMNS.iter().map(|s| s.to_string()));
        writer.write_record(&header)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    /// Reopen an existing log for appending (resumed run).
    pub fn open_append(path: &Path) -> Result<Self, LogError> {
        let file = OpenOptions::new().append(true).open(path)?;
        Ok(Self {
            writer: csv::WriterBuilder::new()
                .flexible(true)
                .has_headers(false)
                .from_writer(file),
        })
    }

    pub fn append(&mut self, record: &CropRecord) -> Result<(), LogError> {
        self.writer.write_record(record.to_row())?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Append-only CSV writer for group rows.
pub struct GroupLog {
    writer: csv::Writer<File>,
}

impl GroupLog {
    pub fn create(path: &Path, question_names: &[String]) -> Result<Self, LogError> {
        let mut writer = csv::Writer::from_writer(File::create(path)?);
        let mut header = vec!["group_id".to_string()];
        header.extend(question_names.iter().cloned());
        writer.write_record(&header)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    pub fn open_append(path: &Path) -> Result<Self, LogError> {
        let file = OpenOptions::new().append(true).open(path)?;
        Ok(Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(file),
        })
    }

    pub fn append(&mut self, record: &GroupRecord) -> Result<(), LogError> {
        let mut row = vec![record.group_id.clone()];
        row.extend(record.answers.iter().cloned());
        self.writer.write_record(row)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// The `group_id` of the last completed row in an existing group log.
///
/// `Ok(None)` when the file is missing or holds only the header; both
/// mean there is no prior progress to resume.
pub fn last_completed_group(path: &Path) -> Result<Option<String>, LogError> {
    if !path.exists() {
        return Ok(None);
    }
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let mut last = None;
    for result in reader.records() {
        let record = result?;
        if let Some(id) = record.get(0) {
            last = Some(id.to_string());
        }
    }
    Ok(last)
}

fn fmt_coord(value: f64) -> String {
    format!("{}", value.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use groupcrop_core::Point;
    use std::fs;

    fn geometry(filename: &str, rotation: f64) -> CropGeometry {
        CropGeometry {
            filename: filename.to_string(),
            rotation_degrees: rotation,
            window: CropWindow::new(Point::new(10.0, 12.0), Point::new(50.0, 52.0)),
            flip: false,
        }
    }

    #[test]
    fn test_crop_row_column_order() {
        let record = CropRecord {
            group_id: "root/A".to_string(),
            primary: CropGeometry {
                flip: true,
                ..geometry("a.jpg", -12.5)
            },
            answers: vec!["forest".to_string(), "2".to_string()],
            detail: None,
        };
        assert_eq!(
            record.to_row(),
            [
                "root/A", "a.jpg", "-12.50", "10", "12", "50", "52", "1", "forest", "2"
            ]
        );
    }

    #[test]
    fn test_crop_row_with_detail_block() {
        let record = CropRecord {
            group_id: "root/A".to_string(),
            primary: geometry("a.jpg", 0.0),
            answers: vec!["forest".to_string()],
            detail: Some(geometry("a_detail.jpg", 3.25)),
        };
        let row = record.to_row();
        assert_eq!(row.len(), 1 + 7 + 1 + 7);
        assert_eq!(row[9], "a_detail.jpg");
        assert_eq!(row[10], "3.25");
        assert_eq!(row[15], "0");
    }

    #[test]
    fn test_crop_log_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crop.csv");
        let questions = vec!["habitat".to_string()];

        let mut log = CropLog::create(&path, &questions).unwrap();
        log.append(&CropRecord {
            group_id: "root/A".to_string(),
            primary: geometry("a.jpg", -1.0),
            answers: vec!["forest".to_string()],
            detail: None,
        })
        .unwrap();
        drop(log);

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("group_id,image,rotation_degrees"));
        assert!(header.contains("habitat"));
        assert!(header.ends_with("flip_detail"));
        assert_eq!(lines.next().unwrap(), "root/A,a.jpg,-1.00,10,12,50,52,0,forest");
    }

    #[test]
    fn test_group_log_and_resume_marker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("groups.csv");
        let questions = vec!["nr_groups".to_string()];

        let mut log = GroupLog::create(&path, &questions).unwrap();
        log.append(&GroupRecord {
            group_id: "root/A".to_string(),
            answers: vec!["1".to_string()],
        })
        .unwrap();
        log.append(&GroupRecord {
            group_id: "root/B".to_string(),
            answers: vec!["2".to_string()],
        })
        .unwrap();
        drop(log);

        assert_eq!(
            last_completed_group(&path).unwrap(),
            Some("root/B".to_string())
        );
    }

    #[test]
    fn test_resume_marker_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            last_completed_group(&dir.path().join("groups.csv")).unwrap(),
            None
        );
    }

    #[test]
    fn test_resume_marker_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("groups.csv");
        let log = GroupLog::create(&path, &[]).unwrap();
        drop(log);
        assert_eq!(last_completed_group(&path).unwrap(), None);
    }

    #[test]
    fn test_append_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("groups.csv");
        {
            let mut log = GroupLog::create(&path, &[]).unwrap();
            log.append(&GroupRecord {
                group_id: "root/A".to_string(),
                answers: vec![],
            })
            .unwrap();
        }
        {
            let mut log = GroupLog::open_append(&path).unwrap();
            log.append(&GroupRecord {
                group_id: "root/B".to_string(),
                answers: vec![],
            })
            .unwrap();
        }
        assert_eq!(
            last_completed_group(&path).unwrap(),
            Some("root/B".to_string())
        );
    }
}
