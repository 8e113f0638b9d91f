use base64::Engine;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// The transport payload was not valid standard base64.
#[derive(Debug, Error)]
#[error("artifact payload is not valid base64: {0}")]
pub struct DecodeError(#[from] base64::DecodeError);

/// Decodes a transport-encoded waveform payload into its exact raw bytes.
/// Whitespace inserted by transports is stripped first; anything else that
/// is not standard base64 is a [`DecodeError`].
pub fn decode(encoded: &str) -> Result<Vec<u8>, DecodeError> {
    let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD.decode(cleaned)?;
    Ok(bytes)
}

fn unix_millis() -> u128 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration.as_millis(),
        Err(_) => 0,
    }
}

/// File name for an exported waveform, stamped with the export time.
pub fn export_file_name() -> String {
    format!("simulation_{}.vcd", unix_millis())
}

/// Writes the decoded artifact bytes into `dir` under a timestamped
/// `simulation_*.vcd` name. The written content is bit-identical to
/// `bytes`; no text re-encoding happens on this path.
pub fn export_as_file(bytes: &[u8], dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name());
    fs::write(&path, bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_reproduces_the_exact_byte_sequence() {
        // "VCD\x00\xff" under a reference encoder.
        let bytes = decode("VkNEAP8=").expect("valid base64 should decode");
        assert_eq!(bytes, vec![0x56, 0x43, 0x44, 0x00, 0xff]);
    }

    #[test]
    fn decode_tolerates_transport_line_breaks() {
        let bytes = decode("VkNE\nAP8=\n").expect("wrapped base64 should decode");
        assert_eq!(bytes, vec![0x56, 0x43, 0x44, 0x00, 0xff]);
    }

    #[test]
    fn decode_rejects_invalid_input() {
        assert!(decode("not-base64!!").is_err());
    }

    #[test]
    fn export_writes_bit_identical_bytes() {
        let dir = std::env::temp_dir().join(format!(
            "bitlab_artifact_export_{}_{}",
            std::process::id(),
            unix_millis()
        ));
        let bytes = vec![0u8, 1, 2, 253, 254, 255];

        let path = export_as_file(&bytes, &dir).expect("export should write");
        let written = fs::read(&path).expect("exported file should read back");
        assert_eq!(written, bytes);
        assert!(path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("simulation_") && n.ends_with(".vcd")));

        let _ = fs::remove_dir_all(dir);
    }
}
