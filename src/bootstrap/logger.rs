use anstyle::{AnsiColor, Style};
use env_logger::{Builder, Env};
use log::kv::Key;
use std::io::Write;

const DIM: Style = Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::BrightBlack)));
const DURATION: Style = Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::Cyan)));

/// Width of the duration column, plus one separating space.
const DURATION_WIDTH: usize = 10;

/// Reformat a `duration` key-value such as `1.234567ms` to `1.23 ms`.
fn format_duration(raw: &str) -> String {
    if let Some(idx) = raw.find(|c: char| c.is_alphabetic()) {
        let (num, unit) = (&raw[..idx], &raw[idx..]);
        if let Ok(val) = num.parse::<f32>() {
            return format!("{:.2} {}", val, unit);
        }
    }
    raw.to_string()
}

/// Initialize the logger. `RUST_LOG` overrides the default `info` filter.
pub fn initialize_logger() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = buf.timestamp();
            let level_style = buf.default_level_style(record.level());

            let dur_raw = record
                .key_values()
                .get(Key::from("duration"))
                .map(|v| format_duration(&v.to_string()))
                .unwrap_or_default();

            let dur = if dur_raw.is_empty() {
                " ".repeat(DURATION_WIDTH)
            } else {
                format!(
                    "{}{:>width$}{}",
                    DURATION.render(),
                    dur_raw,
                    DURATION.render_reset(),
                    width = DURATION_WIDTH
                )
            };

            writeln!(
                buf,
                "{}{}{} {}{}{} {}{}{}",
                DIM.render(),
                ts,
                DIM.render_reset(),
                level_style.render(),
                record.level(),
                level_style.render_reset(),
                DIM.render(),
                record.target(),
                DIM.render_reset()
            )?;

            let message = format!("{}", record.args());
            let subsequent_indent = " ".repeat(DURATION_WIDTH + 1);
            let mut lines = message.lines();

            if let Some(first_line) = lines.next() {
                writeln!(buf, "{} {}", dur, first_line)?;
            }
            for line in lines {
                writeln!(buf, "{}{}", subsequent_indent, line)?;
            }

            Ok(())
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_are_rounded_with_a_spaced_unit() {
        assert_eq!(format_duration("1.234567ms"), "1.23 ms");
        assert_eq!(format_duration("12s"), "12.00 s");
        assert_eq!(format_duration("unknown"), "unknown");
    }
}
