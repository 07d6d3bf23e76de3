//! FluidNC status report parsing
//!
//! Status reports arrive in two shapes depending on controller configuration:
//! the legacy Grbl form `<Idle|MPos:10.000,20.000,30.000|FS:0,0>` and a
//! structured form where the position hides behind a quoted `"MPos"` key or a
//! bare `pos` key, e.g. `"MPos":[10.00, 20.00, 30.00]`. The parser tries the
//! legacy marker first and only falls back to the structured scan when the
//! legacy form yields nothing; partial results from the two strategies are
//! never mixed.

/// Parse a machine position from a status report
///
/// Returns `(x, y, z)` in millimeters, or `None` when neither strategy finds
/// exactly three numbers.
pub fn parse_mpos(report: &str) -> Option<(f64, f64, f64)> {
    if let Some(idx) = report.find("MPos:") {
        if let Some(pos) = parse_comma_triple(&report[idx + 5..]) {
            return Some(pos);
        }
    }

    let key = report.find("\"MPos\"").or_else(|| report.find("pos"))?;
    let rest = &report[key..];
    let start = rest.find(|c: char| c.is_ascii_digit() || c == '-')?;
    parse_loose_triple(&rest[start..])
}

/// Parse the machine state token from a legacy report, e.g. `Idle` out of
/// `<Idle|MPos:...>`
pub fn parse_machine_state(report: &str) -> Option<&str> {
    let start = report.find('<')? + 1;
    let end = report[start..].find('|')? + start;
    Some(&report[start..end])
}

/// Three floats separated by commas, whitespace tolerated around each value
fn parse_comma_triple(s: &str) -> Option<(f64, f64, f64)> {
    let mut rest = s;
    let x = take_float(&mut rest)?;
    take_separator(&mut rest, true)?;
    let y = take_float(&mut rest)?;
    take_separator(&mut rest, true)?;
    let z = take_float(&mut rest)?;
    Some((x, y, z))
}

/// Three floats separated by comma and/or whitespace
fn parse_loose_triple(s: &str) -> Option<(f64, f64, f64)> {
    let mut rest = s;
    let x = take_float(&mut rest)?;
    take_separator(&mut rest, false)?;
    let y = take_float(&mut rest)?;
    take_separator(&mut rest, false)?;
    let z = take_float(&mut rest)?;
    Some((x, y, z))
}

/// Consume leading whitespace and one float literal from `rest`
fn take_float(rest: &mut &str) -> Option<f64> {
    let s = rest.trim_start();
    let mut end = 0;
    let bytes = s.as_bytes();

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let mut seen_digit = false;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        seen_digit = true;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            seen_digit = true;
        }
    }
    if !seen_digit {
        return None;
    }

    let value = s[..end].parse::<f64>().ok()?;
    *rest = &s[end..];
    Some(value)
}

/// Consume the separator between two values: optional whitespace around a
/// comma. When `comma_required` is false, whitespace alone also separates.
fn take_separator(rest: &mut &str, comma_required: bool) -> Option<()> {
    let before = rest.len();
    let s = rest.trim_start();
    if let Some(stripped) = s.strip_prefix(',') {
        *rest = stripped;
        return Some(());
    }
    if !comma_required && s.len() < before {
        *rest = s;
        return Some(());
    }
    None
}
