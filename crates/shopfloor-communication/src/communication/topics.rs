//! Bus topic grammar
//!
//! All fleet traffic lives under one domain root (default `cnc`):
//!
//! ```text
//! <root>/machine_<id>/<type>    type ∈ {status, position, address}  (inbound)
//! <root>/machine_<id>/command                                       (outbound)
//! <root>/all/command                                                (broadcast)
//! ```
//!
//! Subscriptions use the two-level wildcard `<root>/+/+` so every machine and
//! every report type is received, including after a reconnect.

/// Report categories a machine publishes about itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Short state text, e.g. "IDLE", "WORKING", "ERROR"
    Status,
    /// `POS:<x>:<y>:<z>` payload, millimeters
    Position,
    /// The machine's own control-endpoint address
    Address,
}

/// A parsed inbound report topic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboundTopic {
    /// Machine id embedded in the machine segment
    pub machine_id: usize,
    /// Report category from the type segment
    pub kind: ReportKind,
}

/// Parse an inbound topic against the grammar
///
/// Returns `None` for foreign roots, malformed machine segments, non-numeric
/// ids and unrecognized type segments. Garbage topics are expected on a
/// shared bus, so there is nothing to report to the caller beyond the drop.
pub fn parse_report_topic(root: &str, topic: &str) -> Option<InboundTopic> {
    let mut segments = topic.split('/');
    if segments.next() != Some(root) {
        return None;
    }

    let machine_id = segments
        .next()?
        .strip_prefix("machine_")?
        .parse::<usize>()
        .ok()?;

    let kind = match segments.next()? {
        "status" => ReportKind::Status,
        "position" => ReportKind::Position,
        "address" => ReportKind::Address,
        _ => return None,
    };

    if segments.next().is_some() {
        return None;
    }

    Some(InboundTopic { machine_id, kind })
}

/// Subscription wildcard covering every machine and every report type
pub fn report_wildcard(root: &str) -> String {
    format!("{root}/+/+")
}

/// Command topic for one machine
pub fn command_topic(root: &str, machine_id: usize) -> String {
    format!("{root}/machine_{machine_id}/command")
}

/// Broadcast command topic addressed to the whole fleet
pub fn broadcast_topic(root: &str) -> String {
    format!("{root}/all/command")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_topics() {
        assert_eq!(
            parse_report_topic("cnc", "cnc/machine_2/status"),
            Some(InboundTopic {
                machine_id: 2,
                kind: ReportKind::Status
            })
        );
        assert_eq!(
            parse_report_topic("cnc", "cnc/machine_10/position").unwrap().kind,
            ReportKind::Position
        );
        assert_eq!(
            parse_report_topic("cnc", "cnc/machine_1/address").unwrap().kind,
            ReportKind::Address
        );
    }

    #[test]
    fn test_parse_rejects_malformed_topics() {
        assert!(parse_report_topic("cnc", "other/machine_1/status").is_none());
        assert!(parse_report_topic("cnc", "cnc/machine_x/status").is_none());
        assert!(parse_report_topic("cnc", "cnc/machine_1/telemetry").is_none());
        assert!(parse_report_topic("cnc", "cnc/machine_1").is_none());
        assert!(parse_report_topic("cnc", "cnc/machine_1/status/extra").is_none());
        assert!(parse_report_topic("cnc", "cnc/press_1/status").is_none());
    }

    #[test]
    fn test_outbound_topics() {
        assert_eq!(command_topic("cnc", 3), "cnc/machine_3/command");
        assert_eq!(broadcast_topic("cnc"), "cnc/all/command");
        assert_eq!(report_wildcard("cnc"), "cnc/+/+");
    }
}
