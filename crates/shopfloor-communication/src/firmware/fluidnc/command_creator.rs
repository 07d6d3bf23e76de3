//! FluidNC command formatting
//!
//! Builds the single-line ASCII commands the controller understands. Jog
//! commands always request relative moves (`G91`) in millimeters (`G21`) so
//! a lost or duplicated jog can never teleport an axis to an absolute
//! coordinate.

use shopfloor_core::{Axis, ProtocolError};

/// Maximum length of a formatted upload request. Exceeding it is an explicit
/// error; the descriptor is never silently cut.
pub const UPLOAD_REQUEST_MAX: usize = 512;

/// Format a relative jog command
///
/// Produces `$J=G91 G21 <AXIS><+d.ddd> F<feed>`, e.g.
/// `$J=G91 G21 X+10.000 F500`. The distance carries an explicit sign and
/// fixed three decimals. Axis range is the caller's contract; the codec does
/// not validate it.
pub fn format_jog(axis: Axis, distance_mm: f64, feed_rate: u32) -> String {
    format!(
        "$J=G91 G21 {}{:+.3} F{}",
        axis.letter(),
        distance_mm,
        feed_rate
    )
}

/// Format the homing cycle command (`$H`)
pub fn format_home() -> String {
    "$H".to_string()
}

/// Format the immediate feed-hold realtime command (`!`)
pub fn format_feed_hold() -> String {
    "!".to_string()
}

/// Format the immediate status query realtime command (`?`)
pub fn format_status_query() -> String {
    "?".to_string()
}

/// Format the soft-reset realtime command (Ctrl-X)
///
/// Halts and resets the controller regardless of what it is executing; this
/// is the wire form of an emergency stop.
pub fn format_soft_reset() -> String {
    "\u{18}".to_string()
}

/// Format a job-file selection command
///
/// The machine-side agent fetches the named job from shared storage when it
/// receives `DOWNLOAD:<name>`.
pub fn format_file_select(file_name: &str) -> String {
    format!("DOWNLOAD:{file_name}")
}

/// Format a multipart upload descriptor for pushing a job file to the
/// controller's web endpoint
///
/// The remote name is normalized to always begin with `/`. The output embeds
/// the host template placeholder expanded by the shell environment at use:
/// `"file=@<local>;filename=</remote>" http://${FLUIDNC_FQDN}/upload`.
pub fn format_upload_request(
    local_path: &str,
    remote_name: &str,
) -> Result<String, ProtocolError> {
    let remote = if remote_name.starts_with('/') {
        remote_name.to_string()
    } else {
        format!("/{remote_name}")
    };

    let request = format!("\"file=@{local_path};filename={remote}\" http://${{FLUIDNC_FQDN}}/upload");
    if request.len() > UPLOAD_REQUEST_MAX {
        return Err(ProtocolError::CommandTooLong {
            limit: UPLOAD_REQUEST_MAX,
        });
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jog_positive_distance() {
        let cmd = format_jog(Axis::X, 10.0, 500);
        assert_eq!(cmd, "$J=G91 G21 X+10.000 F500");
    }

    #[test]
    fn test_jog_negative_distance() {
        let cmd = format_jog(Axis::Z, -5.0, 200);
        assert_eq!(cmd, "$J=G91 G21 Z-5.000 F200");
    }

    #[test]
    fn test_jog_rounds_to_three_decimals() {
        let cmd = format_jog(Axis::Y, 0.12345, 1000);
        assert_eq!(cmd, "$J=G91 G21 Y+0.123 F1000");
    }

    #[test]
    fn test_fixed_commands() {
        assert_eq!(format_home(), "$H");
        assert_eq!(format_feed_hold(), "!");
        assert_eq!(format_status_query(), "?");
        assert_eq!(format_soft_reset(), "\u{18}");
    }

    #[test]
    fn test_file_select() {
        assert_eq!(format_file_select("part_42.gcode"), "DOWNLOAD:part_42.gcode");
    }

    #[test]
    fn test_upload_request_normalizes_remote_name() {
        let req = format_upload_request("/tmp/job.gcode", "job.gcode").unwrap();
        assert_eq!(
            req,
            "\"file=@/tmp/job.gcode;filename=/job.gcode\" http://${FLUIDNC_FQDN}/upload"
        );

        let req = format_upload_request("/tmp/job.gcode", "/job.gcode").unwrap();
        assert!(req.contains(";filename=/job.gcode\""));
    }

    #[test]
    fn test_upload_request_refuses_truncation() {
        let long_path = "x".repeat(UPLOAD_REQUEST_MAX);
        let err = format_upload_request(&long_path, "job.gcode").unwrap_err();
        assert!(matches!(err, ProtocolError::CommandTooLong { limit } if limit == UPLOAD_REQUEST_MAX));
    }
}
