use crate::engine::types::Statistics;

/// Parse an ffmpeg progress line
///
/// Example line: `frame=  150 fps= 30 q=28.0 size=    1024kB time=00:00:05.00 bitrate= 200.0kbits/s speed=1.50x`
pub fn parse_statistics(line: &str) -> Option<Statistics> {
    if !line.contains("time=") || !line.contains("frame=") {
        return None;
    }

    let frame = extract_value(line, "frame=")
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    let fps = extract_value(line, "fps=")
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(0.0);

    let size_bytes = extract_value(line, "size=")
        .and_then(|v| parse_size(&v))
        .unwrap_or(0);

    let time_ms = extract_value(line, "time=")
        .and_then(|v| parse_timestamp_ms(&v))
        .unwrap_or(0);

    let bitrate_kbps = extract_value(line, "bitrate=")
        .and_then(|v| v.trim_end_matches("kbits/s").parse::<f64>().ok())
        .unwrap_or(0.0);

    let speed = extract_value(line, "speed=")
        .and_then(|v| v.trim_end_matches('x').parse::<f64>().ok())
        .unwrap_or(0.0);

    Some(Statistics {
        session_id: 0,
        frame,
        fps,
        time_ms,
        size_bytes,
        bitrate_kbps,
        speed,
        duration_ms: None,
    })
}

/// Parse the `Duration: 00:00:10.00, start: ...` line of an input header
pub fn parse_duration(line: &str) -> Option<i64> {
    let value = extract_value(line.trim_start(), "Duration:")?;
    parse_timestamp_ms(value.trim_end_matches(','))
}

/// Extract a value from an ffmpeg key=value line
fn extract_value(line: &str, key: &str) -> Option<String> {
    let start = line.find(key)? + key.len();
    let trimmed = line[start..].trim_start();
    let end = trimmed
        .find(|c: char| c.is_whitespace())
        .unwrap_or(trimmed.len());
    let val = &trimmed[..end];
    if val.is_empty() {
        None
    } else {
        Some(val.to_string())
    }
}

/// `HH:MM:SS.xx`, possibly negative, into milliseconds
fn parse_timestamp_ms(s: &str) -> Option<i64> {
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 3 {
        return None;
    }
    let hours: f64 = parts[0].parse().ok()?;
    let mins: f64 = parts[1].parse().ok()?;
    let secs: f64 = parts[2].parse().ok()?;
    let ms = ((hours * 3600.0 + mins * 60.0 + secs) * 1000.0).round() as i64;
    Some(if negative { -ms } else { ms })
}

/// `1024kB` / `1024KiB` / `512B` into bytes
fn parse_size(s: &str) -> Option<u64> {
    let (digits, multiplier) = if let Some(n) = s.strip_suffix("KiB") {
        (n, 1024)
    } else if let Some(n) = s.strip_suffix("kB") {
        (n, 1024)
    } else if let Some(n) = s.strip_suffix("MiB") {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix('B') {
        (n, 1)
    } else {
        (s, 1)
    };
    digits.parse::<u64>().ok().map(|n| n * multiplier)
}
