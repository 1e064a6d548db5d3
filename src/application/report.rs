#[cfg(test)]
#[path = "report_test.rs"]
mod tests;

use strum::IntoEnumIterator;

use crate::domain::models::ModelName;
use crate::domain::models::Output;
use crate::domain::models::OutputMode;
use crate::domain::models::Round;

/// 1 based position of an output within its round.
pub fn position(round: &Round, output_id: &str) -> usize {
    return round
        .outputs
        .iter()
        .position(|e| return e.id == output_id)
        .map(|e| return e + 1)
        .unwrap_or_default();
}

/// File an output is written to, such as `3f2a9c1e-wireframe-2.svg`.
pub fn file_name(round: &Round, n: usize) -> String {
    let prefix = round.id.chars().take(8).collect::<String>();
    let title = round
        .output_mode
        .title(n)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");

    return format!(
        "{prefix}-{title}.{ext}",
        ext = round.output_mode.file_extension()
    );
}

fn model_label(output: &Output) -> String {
    let descriptor = output.model.descriptor();
    return format!("{} {}", descriptor.name, descriptor.version);
}

fn indent(text: &str) -> String {
    return text
        .lines()
        .map(|line| {
            if line.is_empty() {
                return String::new();
            }
            return format!("    {line}");
        })
        .collect::<Vec<_>>()
        .join("\n");
}

pub fn settlement(round: &Round, output: &Output) -> String {
    let n = position(round, &output.id);
    let title = round.output_mode.title(n);
    let secs = output.total_time.unwrap_or_default().as_secs_f64();

    if output.got_error {
        let mut lines = vec![format!("{title} ({}) failed", model_label(output))];
        if let Some(details) = &output.error_details {
            lines.push(format!("  {}: {}", details.title, details.suggestion));
        }
        if let Some(message) = &output.output_data {
            lines.push(indent(message));
        }
        return lines.join("\n");
    }

    let mut lines = vec![format!(
        "{title} ({}) finished in {secs:.1}s",
        model_label(output)
    )];
    if let Some(chunks) = &output.grounding_chunks {
        for chunk in chunks {
            lines.push(format!("  source: {} <{}>", chunk.title, chunk.uri));
        }
    }

    return lines.join("\n");
}

pub fn modes() -> String {
    return OutputMode::iter()
        .map(|mode| {
            return format!(
                "{:<12}{} (.{}, {})",
                mode.to_string(),
                mode.name(),
                mode.file_extension(),
                mode.syntax()
            );
        })
        .collect::<Vec<_>>()
        .join("\n");
}

pub fn models() -> String {
    return ModelName::iter()
        .map(|model| {
            let descriptor = model.descriptor();
            let mut thinking = "off";
            if descriptor.thinking {
                thinking = "on";
            }
            return format!(
                "{:<16}{} {}, {}, thinking {thinking}",
                model.to_string(),
                descriptor.name,
                descriptor.version,
                descriptor.backend_model_id
            );
        })
        .collect::<Vec<_>>()
        .join("\n");
}

pub fn presets(mode: OutputMode) -> String {
    if mode.presets().is_empty() {
        return format!("There are no example prompts for {}.", mode.name());
    }

    return mode
        .presets()
        .iter()
        .map(|preset| {
            if preset.prompt.contains('\n') {
                return format!("- {}:\n{}", preset.label, indent(preset.prompt));
            }
            return format!("- {}: {}", preset.label, preset.prompt);
        })
        .collect::<Vec<_>>()
        .join("\n");
}
