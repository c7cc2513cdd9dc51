//! Session loading for the episode engine.
//!
//! Scans directories for `session_*/frames.jsonl` logs produced by the
//! on-device recorder or the reference-clip extraction pipeline. Both
//! producers emit the same JSONL schema, so they load identically.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use cineframe_models::{FrameRecord, SessionMetadata};

use crate::error::SimResult;

/// Provenance of a loaded session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionSource {
    /// Recorded live on device (auto or manual labels)
    Live,
    /// Extracted from a reference YouTube clip
    Youtube,
    /// No metadata, or an unrecognized label source
    Unknown,
}

impl fmt::Display for SessionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionSource::Live => "live",
            SessionSource::Youtube => "youtube",
            SessionSource::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// One loaded session: an ordered frame log plus its replay parameters.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
    pub frames: Vec<FrameRecord>,
    pub fps: u32,
    pub source: SessionSource,
}

/// Scan directories for session data and load it into memory.
///
/// Sessions shorter than `min_frames` are dropped; missing directories are
/// skipped. The result is sorted by session id for reproducible sampling.
pub fn scan_sessions(data_dirs: &[PathBuf], min_frames: usize) -> SimResult<Vec<Session>> {
    let mut sessions = Vec::new();

    for data_dir in data_dirs {
        if !data_dir.exists() {
            continue;
        }

        let mut entries: Vec<PathBuf> = fs::read_dir(data_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        entries.sort();

        for session_dir in entries {
            if !session_dir.is_dir() {
                continue;
            }
            let Some(name) = session_dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.starts_with("session_") {
                continue;
            }

            let frames_path = session_dir.join("frames.jsonl");
            if !frames_path.exists() {
                continue;
            }

            let frames = match load_jsonl(&frames_path) {
                Ok(frames) => frames,
                Err(err) => {
                    warn!(session = name, error = %err, "skipping unreadable session");
                    continue;
                }
            };
            if frames.len() < min_frames {
                debug!(
                    session = name,
                    frames = frames.len(),
                    min_frames,
                    "skipping short session"
                );
                continue;
            }

            let (fps, source) = read_metadata(&session_dir.join("metadata.json"));

            sessions.push(Session {
                session_id: name.to_string(),
                frames,
                fps,
                source,
            });
        }
    }

    sessions.sort_by(|a, b| a.session_id.cmp(&b.session_id));
    info!(sessions = sessions.len(), "session scan complete");
    Ok(sessions)
}

/// Load a JSONL frame log, skipping blank and malformed lines.
///
/// A line that parses but describes a crop outside the canvas is treated as
/// malformed too; validation happens once, here at the boundary.
fn load_jsonl(path: &Path) -> SimResult<Vec<FrameRecord>> {
    let content = fs::read_to_string(path)?;

    let mut frames = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<FrameRecord>(line) {
            Ok(record) if record.current_crop.is_valid() => frames.push(record),
            Ok(_) => {
                debug!(path = %path.display(), line = line_no + 1, "skipping record with invalid crop");
            }
            Err(err) => {
                debug!(path = %path.display(), line = line_no + 1, error = %err, "skipping malformed line");
            }
        }
    }
    Ok(frames)
}

/// Recover fps and provenance from `metadata.json`; defaults on any failure.
fn read_metadata(path: &Path) -> (u32, SessionSource) {
    let Ok(content) = fs::read_to_string(path) else {
        return (30, SessionSource::Unknown);
    };
    let Ok(meta) = serde_json::from_str::<SessionMetadata>(&content) else {
        return (30, SessionSource::Unknown);
    };

    let source = if meta.label_source.contains("youtube") {
        SessionSource::Youtube
    } else if matches!(meta.label_source.as_str(), "auto" | "manual") {
        SessionSource::Live
    } else {
        SessionSource::Unknown
    };

    (meta.fps, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn frame_line(idx: u64) -> String {
        format!(
            r#"{{"t":{:.3},"frame_idx":{idx},"speaker":null,"keypoints":null,"current_crop":{{"x":0.1,"y":0.15,"w":0.8,"h":0.45,"zoom":2.222222}},"ideal_crop":{{"x":0.1,"y":0.15,"w":0.8,"h":0.45,"zoom":2.222222,"source":"youtube"}},"interpolating":false}}"#,
            idx as f64 / 30.0
        )
    }

    fn write_session(root: &Path, name: &str, frames: usize, metadata: Option<&str>) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();

        let mut file = fs::File::create(dir.join("frames.jsonl")).unwrap();
        for idx in 0..frames {
            writeln!(file, "{}", frame_line(idx as u64)).unwrap();
        }

        if let Some(meta) = metadata {
            fs::write(dir.join("metadata.json"), meta).unwrap();
        }
    }

    #[test]
    fn test_scan_loads_and_sorts_sessions() {
        let tmp = tempfile::tempdir().unwrap();
        write_session(tmp.path(), "session_b", 40, None);
        write_session(tmp.path(), "session_a", 50, None);

        let sessions = scan_sessions(&[tmp.path().to_path_buf()], 30).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].session_id, "session_a");
        assert_eq!(sessions[0].frames.len(), 50);
        assert_eq!(sessions[0].fps, 30);
        assert_eq!(sessions[0].source, SessionSource::Unknown);
    }

    #[test]
    fn test_scan_filters_short_sessions() {
        let tmp = tempfile::tempdir().unwrap();
        write_session(tmp.path(), "session_short", 10, None);
        write_session(tmp.path(), "session_long", 60, None);

        let sessions = scan_sessions(&[tmp.path().to_path_buf()], 30).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].session_id, "session_long");
    }

    #[test]
    fn test_scan_ignores_non_session_dirs_and_missing_logs() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("not_a_session")).unwrap();
        fs::create_dir_all(tmp.path().join("session_empty")).unwrap();
        write_session(tmp.path(), "session_ok", 35, None);

        let sessions = scan_sessions(&[tmp.path().to_path_buf()], 30).unwrap();
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("session_x");
        fs::create_dir_all(&dir).unwrap();

        let mut file = fs::File::create(dir.join("frames.jsonl")).unwrap();
        for idx in 0..40 {
            writeln!(file, "{}", frame_line(idx)).unwrap();
        }
        writeln!(file, "{{not json").unwrap();
        writeln!(file).unwrap();
        drop(file);

        let sessions = scan_sessions(&[tmp.path().to_path_buf()], 30).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].frames.len(), 40);
    }

    #[test]
    fn test_metadata_maps_label_source() {
        let tmp = tempfile::tempdir().unwrap();
        let meta = r#"{
            "session_id": "session_yt",
            "start_time": "2026-01-01T00:00:00Z",
            "fps": 25,
            "label_source": "youtube_extract"
        }"#;
        write_session(tmp.path(), "session_yt", 40, Some(meta));

        let manual = r#"{
            "session_id": "session_live",
            "start_time": "2026-01-01T00:00:00Z",
            "label_source": "manual"
        }"#;
        write_session(tmp.path(), "session_live", 40, Some(manual));

        let sessions = scan_sessions(&[tmp.path().to_path_buf()], 30).unwrap();
        let yt = sessions.iter().find(|s| s.session_id == "session_yt").unwrap();
        assert_eq!(yt.fps, 25);
        assert_eq!(yt.source, SessionSource::Youtube);

        let live = sessions.iter().find(|s| s.session_id == "session_live").unwrap();
        assert_eq!(live.fps, 30);
        assert_eq!(live.source, SessionSource::Live);
    }

    #[test]
    fn test_missing_dirs_are_skipped() {
        let sessions = scan_sessions(&[PathBuf::from("/nonexistent/cineframe")], 30).unwrap();
        assert!(sessions.is_empty());
    }
}
