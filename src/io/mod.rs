//! CSV interfaces.
//!
//! Three file shapes cross the system boundary:
//!
//! - **Map** (`type,name,x,y,pitch`): stations and AGV initial poses.
//! - **Tasks** (`id,start_point,end_point,priority,remaining_time`): the
//!   transport queue.
//! - **Trajectory** (`timestamp,name,X,Y,pitch,loaded,destination,`
//!   `Emergency[,id]`): the recorded run, written after a simulation and
//!   read back for validation or playback.
//!
//! Headers are matched case-insensitively and enum spellings accept both
//! `snake_case` and `PascalCase` variants. Malformed rows abort the file
//! with the offending line number.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim, Writer};
use thiserror::Error;
use tracing::info;

use crate::models::{Direction, MapElement, MapElementKind, Point, TaskPriority, TaskRecord};
use crate::trajectory::TrajectoryRow;

/// CSV parse or I/O failure.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Underlying file could not be opened or written.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Malformed CSV framing.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// A required header is absent.
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    /// A field failed to parse; processing of the file stops here.
    #[error("line {line}: {message}")]
    InvalidField {
        /// 1-based line number in the file.
        line: u64,
        /// What was wrong.
        message: String,
    },
}

fn invalid(line: u64, message: impl Into<String>) -> CsvError {
    CsvError::InvalidField {
        line,
        message: message.into(),
    }
}

fn find_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        names
            .iter()
            .any(|name| header.trim().eq_ignore_ascii_case(name))
    })
}

fn require_column(
    headers: &StringRecord,
    names: &[&str],
    label: &'static str,
) -> Result<usize, CsvError> {
    find_column(headers, names).ok_or(CsvError::MissingColumn(label))
}

fn field<'r>(record: &'r StringRecord, column: usize) -> &'r str {
    record.get(column).unwrap_or("").trim()
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |position| position.line())
}

fn parse_i32(raw: &str, label: &str, line: u64) -> Result<i32, CsvError> {
    raw.parse()
        .map_err(|_| invalid(line, format!("invalid {label} '{raw}'")))
}

fn parse_bool(raw: &str, label: &str, line: u64) -> Result<bool, CsvError> {
    if raw.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(invalid(line, format!("invalid {label} '{raw}'")))
    }
}

fn parse_heading(raw: &str, line: u64) -> Result<Direction, CsvError> {
    let degrees: u16 = raw
        .parse()
        .map_err(|_| invalid(line, format!("invalid pitch '{raw}'")))?;
    Direction::from_degrees(degrees)
        .ok_or_else(|| invalid(line, format!("pitch {degrees} is not a cardinal heading")))
}

fn parse_kind(raw: &str, line: u64) -> Result<MapElementKind, CsvError> {
    let normalized: String = raw
        .chars()
        .filter(|c| *c != '_')
        .collect::<String>()
        .to_ascii_lowercase();
    match normalized.as_str() {
        "startpoint" => Ok(MapElementKind::StartPoint),
        "endpoint" => Ok(MapElementKind::EndPoint),
        "agv" => Ok(MapElementKind::Agv),
        _ => Err(invalid(line, format!("unknown map element type '{raw}'"))),
    }
}

/// Reads map elements from CSV.
pub fn read_map_elements<R: Read>(reader: R) -> Result<Vec<MapElement>, CsvError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = reader.headers()?.clone();
    let kind_col = require_column(&headers, &["type"], "type")?;
    let name_col = require_column(&headers, &["name"], "name")?;
    let x_col = require_column(&headers, &["x"], "x")?;
    let y_col = require_column(&headers, &["y"], "y")?;
    let pitch_col = find_column(&headers, &["pitch"]);

    let mut elements = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = line_of(&record);

        let kind = parse_kind(field(&record, kind_col), line)?;
        let name = field(&record, name_col).to_string();
        let x = parse_i32(field(&record, x_col), "x", line)?;
        let y = parse_i32(field(&record, y_col), "y", line)?;

        let heading = match kind {
            MapElementKind::Agv => {
                let raw = pitch_col.map(|col| field(&record, col)).unwrap_or("");
                if raw.is_empty() {
                    return Err(invalid(line, format!("AGV '{name}' requires a pitch")));
                }
                Some(parse_heading(raw, line)?)
            }
            _ => None,
        };

        elements.push(MapElement {
            kind,
            name,
            position: Point::new(x, y),
            heading,
        });
    }

    info!(count = elements.len(), "loaded map elements");
    Ok(elements)
}

/// Reads task records from CSV.
///
/// Priority accepts `High`/`Normal` case-insensitively; the legacy
/// spellings `Medium` and `Low`, and any unrecognized value, map to
/// `Normal`. `remaining_time` accepts an integer, empty, or `None`.
pub fn read_task_records<R: Read>(reader: R) -> Result<Vec<TaskRecord>, CsvError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = reader.headers()?.clone();
    let id_col = require_column(&headers, &["id", "task_id"], "id")?;
    let start_col = require_column(&headers, &["start_point"], "start_point")?;
    let end_col = require_column(&headers, &["end_point"], "end_point")?;
    let priority_col = find_column(&headers, &["priority"]);
    let remaining_col = find_column(&headers, &["remaining_time"]);

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = line_of(&record);

        let priority = match priority_col.map(|col| field(&record, col)) {
            Some(raw) if raw.eq_ignore_ascii_case("high") || raw == "1" => TaskPriority::High,
            _ => TaskPriority::Normal,
        };

        let remaining_time = match remaining_col.map(|col| field(&record, col)) {
            None | Some("") => None,
            Some(raw) if raw.eq_ignore_ascii_case("none") => None,
            Some(raw) => Some(
                raw.parse()
                    .map_err(|_| invalid(line, format!("invalid remaining_time '{raw}'")))?,
            ),
        };

        records.push(TaskRecord {
            id: field(&record, id_col).to_string(),
            start_point: field(&record, start_col).to_string(),
            end_point: field(&record, end_col).to_string(),
            priority,
            remaining_time,
        });
    }

    info!(count = records.len(), "loaded task records");
    Ok(records)
}

/// Reads a recorded trajectory from CSV, e.g. for validation or playback.
pub fn read_trajectory<R: Read>(reader: R) -> Result<Vec<TrajectoryRow>, CsvError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = reader.headers()?.clone();
    let ts_col = require_column(&headers, &["timestamp"], "timestamp")?;
    let name_col = require_column(&headers, &["name"], "name")?;
    let x_col = require_column(&headers, &["x"], "X")?;
    let y_col = require_column(&headers, &["y"], "Y")?;
    let pitch_col = require_column(&headers, &["pitch"], "pitch")?;
    let loaded_col = require_column(&headers, &["loaded"], "loaded")?;
    let destination_col = find_column(&headers, &["destination"]);
    let emergency_col = require_column(&headers, &["emergency"], "Emergency")?;
    let id_col = find_column(&headers, &["id", "task_id", "taskid"]);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = line_of(&record);

        let timestamp = field(&record, ts_col)
            .parse()
            .map_err(|_| invalid(line, "invalid timestamp"))?;

        rows.push(TrajectoryRow {
            timestamp,
            name: field(&record, name_col).to_string(),
            x: parse_i32(field(&record, x_col), "X", line)?,
            y: parse_i32(field(&record, y_col), "Y", line)?,
            heading: parse_heading(field(&record, pitch_col), line)?,
            loaded: parse_bool(field(&record, loaded_col), "loaded", line)?,
            destination: destination_col
                .map(|col| field(&record, col).to_string())
                .unwrap_or_default(),
            emergency: parse_bool(field(&record, emergency_col), "Emergency", line)?,
            task_id: id_col
                .map(|col| field(&record, col).to_string())
                .unwrap_or_default(),
        });
    }

    Ok(rows)
}

/// Writes a trajectory as CSV.
pub fn write_trajectory<W: Write>(writer: W, rows: &[TrajectoryRow]) -> Result<(), CsvError> {
    let mut writer = Writer::from_writer(writer);
    writer.write_record([
        "timestamp",
        "name",
        "X",
        "Y",
        "pitch",
        "loaded",
        "destination",
        "Emergency",
        "id",
    ])?;
    for row in rows {
        writer.write_record([
            row.timestamp.to_string(),
            row.name.clone(),
            row.x.to_string(),
            row.y.to_string(),
            row.heading.degrees().to_string(),
            row.loaded.to_string(),
            row.destination.clone(),
            row.emergency.to_string(),
            row.task_id.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a map file from disk.
pub fn load_map_file(path: impl AsRef<Path>) -> Result<Vec<MapElement>, CsvError> {
    read_map_elements(File::open(path)?)
}

/// Reads a task file from disk.
pub fn load_task_file(path: impl AsRef<Path>) -> Result<Vec<TaskRecord>, CsvError> {
    read_task_records(File::open(path)?)
}

/// Reads a trajectory file from disk.
pub fn load_trajectory_file(path: impl AsRef<Path>) -> Result<Vec<TrajectoryRow>, CsvError> {
    read_trajectory(File::open(path)?)
}

/// Writes a trajectory file to disk.
pub fn save_trajectory_file(
    path: impl AsRef<Path>,
    rows: &[TrajectoryRow],
) -> Result<(), CsvError> {
    write_trajectory(File::create(path)?, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_map_accepts_spelling_variants() {
        let data = "\
type,name,x,y,pitch
StartPoint,SP01,3,5,
end_point,EP01,18,5,
Agv,AGV01,10,10,90
";
        let elements = read_map_elements(data.as_bytes()).unwrap();
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].kind, MapElementKind::StartPoint);
        assert_eq!(elements[1].kind, MapElementKind::EndPoint);
        assert_eq!(elements[2].kind, MapElementKind::Agv);
        assert_eq!(elements[2].heading, Some(Direction::Up));
        assert_eq!(elements[2].position, Point::new(10, 10));
    }

    #[test]
    fn test_read_map_unknown_type_is_error() {
        let data = "type,name,x,y,pitch\nWall,W1,3,5,\n";
        let error = read_map_elements(data.as_bytes()).unwrap_err();
        assert!(matches!(error, CsvError::InvalidField { line: 2, .. }));
    }

    #[test]
    fn test_read_map_agv_requires_pitch() {
        let data = "type,name,x,y,pitch\nAgv,AGV01,10,10,\n";
        assert!(read_map_elements(data.as_bytes()).is_err());

        let data = "type,name,x,y,pitch\nAgv,AGV01,10,10,45\n";
        assert!(read_map_elements(data.as_bytes()).is_err());
    }

    #[test]
    fn test_read_map_missing_column() {
        let data = "type,name,x\nAgv,AGV01,10\n";
        let error = read_map_elements(data.as_bytes()).unwrap_err();
        assert!(matches!(error, CsvError::MissingColumn("y")));
    }

    #[test]
    fn test_read_tasks_priority_mapping() {
        let data = "\
id,start_point,end_point,priority,remaining_time
T1,SP01,EP01,High,120
T2,SP01,EP02,high,
T3,SP02,EP01,Medium,None
T4,SP02,EP03,garbage,45
T5,SP03,EP01,Normal,
";
        let records = read_task_records(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 5);
        assert_eq!(records[0].priority, TaskPriority::High);
        assert_eq!(records[0].remaining_time, Some(120));
        assert_eq!(records[1].priority, TaskPriority::High);
        assert_eq!(records[1].remaining_time, None);
        // Legacy and unrecognized priorities fall back to Normal.
        assert_eq!(records[2].priority, TaskPriority::Normal);
        assert_eq!(records[2].remaining_time, None);
        assert_eq!(records[3].priority, TaskPriority::Normal);
        assert_eq!(records[3].remaining_time, Some(45));
        assert_eq!(records[4].priority, TaskPriority::Normal);
    }

    #[test]
    fn test_read_tasks_invalid_remaining_time() {
        let data = "id,start_point,end_point,priority,remaining_time\nT1,SP01,EP01,Normal,soon\n";
        assert!(read_task_records(data.as_bytes()).is_err());
    }

    #[test]
    fn test_trajectory_round_trip() {
        let rows = vec![
            TrajectoryRow {
                timestamp: 0,
                name: "AGV01".into(),
                x: 4,
                y: 5,
                heading: Direction::Right,
                loaded: false,
                destination: String::new(),
                emergency: false,
                task_id: String::new(),
            },
            TrajectoryRow {
                timestamp: 1,
                name: "AGV01".into(),
                x: 4,
                y: 5,
                heading: Direction::Right,
                loaded: true,
                destination: "EP01".into(),
                emergency: true,
                task_id: "T1".into(),
            },
        ];

        let mut buffer = Vec::new();
        write_trajectory(&mut buffer, &rows).unwrap();
        let read_back = read_trajectory(buffer.as_slice()).unwrap();
        assert_eq!(read_back, rows);
    }

    #[test]
    fn test_read_trajectory_case_insensitive_booleans() {
        let data = "\
timestamp,name,X,Y,pitch,loaded,destination,Emergency
3,AGV01,7,5,180,TRUE,EP01,False
";
        let rows = read_trajectory(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].loaded);
        assert!(!rows[0].emergency);
        assert_eq!(rows[0].heading, Direction::Left);
        assert_eq!(rows[0].task_id, "");
    }
}
