use std::fs;
use std::path::Path;
use std::process::Command;

use serde::Deserialize;
use uuid::Uuid;

use crate::errors::ApiError;

#[derive(Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
}

// ffprobe prints numeric fields as JSON strings.
#[derive(Deserialize)]
struct ProbeFormat {
    duration: String,
}

/// Duration in whole seconds of an uploaded video. The buffer is spilled
/// to a transient file only because ffprobe wants a path; the file is
/// removed whether or not probing succeeds.
pub fn probe_upload_duration(data: &[u8], filename: &str) -> Result<i32, ApiError> {
    let path = std::env::temp_dir().join(format!("{}-{}", Uuid::new_v4(), filename));

    fs::write(&path, data)
        .map_err(|err| ApiError::Internal(format!("Couldn't write temporary file: {}", err)))?;

    let result = probe_duration(&path);

    let _ = fs::remove_file(&path);

    result
}

fn probe_duration(path: &Path) -> Result<i32, ApiError> {
    let output = Command::new("ffprobe")
        .arg("-v")
        .arg("error")
        .arg("-show_entries")
        .arg("format=duration")
        .arg("-print_format")
        .arg("json")
        .arg(path)
        .output()
        .map_err(|err| ApiError::Internal(format!("Couldn't run ffprobe: {}", err)))?;

    if !output.status.success() {
        return Err(ApiError::Internal(format!(
            "ffprobe failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    parse_probe_output(&output.stdout)
}

fn parse_probe_output(raw: &[u8]) -> Result<i32, ApiError> {
    let probe: ProbeOutput = serde_json::from_slice(raw)
        .map_err(|err| ApiError::Internal(format!("Couldn't parse ffprobe output: {}", err)))?;

    let seconds: f64 = probe
        .format
        .duration
        .parse()
        .map_err(|_| ApiError::internal("ffprobe reported a non-numeric duration"))?;

    Ok(seconds.floor() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_floors_the_reported_duration() {
        let raw = br#"{"format": {"duration": "63.712000", "size": "1048576"}}"#;
        assert_eq!(parse_probe_output(raw).unwrap(), 63);
    }

    #[test]
    fn whole_second_durations_pass_through() {
        let raw = br#"{"format": {"duration": "10.000000"}}"#;
        assert_eq!(parse_probe_output(raw).unwrap(), 10);
    }

    #[test]
    fn garbage_output_is_an_internal_error() {
        assert!(parse_probe_output(b"not json").is_err());
    }

    #[test]
    fn missing_duration_is_an_internal_error() {
        let raw = br#"{"format": {"size": "123"}}"#;
        assert!(parse_probe_output(raw).is_err());
    }
}
