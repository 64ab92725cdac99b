//! UI helper components

use eframe::egui;

use devnet_mint_core::LogEntry;

const ACCENT: egui::Color32 = egui::Color32::from_rgb(0, 212, 170);
const ERROR_RED: egui::Color32 = egui::Color32::from_rgb(230, 90, 90);

/// Styled heading with accent color
pub fn styled_heading(ui: &mut egui::Ui, text: &str) {
    ui.heading(egui::RichText::new(text).size(22.0).color(ACCENT));
}

/// Section header with separator
pub fn section_header(ui: &mut egui::Ui, text: &str) {
    ui.add_space(10.0);
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(text).strong().size(14.0));
    });
    ui.separator();
}

/// Labeled field with copy button
pub fn labeled_field_with_copy(ui: &mut egui::Ui, label: &str, value: &str) -> bool {
    let mut copied = false;
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(format!("{}:", label)).strong());
        ui.label(egui::RichText::new(value).monospace());
        if ui
            .small_button("📋")
            .on_hover_text("Copy to clipboard")
            .clicked()
        {
            copied = true;
        }
    });
    copied
}

pub fn labeled_value(ui: &mut egui::Ui, label: &str, value: &str) {
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(format!("{}:", label)).strong());
        ui.label(egui::RichText::new(value).monospace());
    });
}

/// Copy to clipboard (platform-specific)
#[cfg(not(target_arch = "wasm32"))]
pub fn copy_to_clipboard(text: &str) {
    match arboard::Clipboard::new() {
        Ok(mut clipboard) => {
            if let Err(e) = clipboard.set_text(text) {
                tracing::warn!(error = %e, "clipboard write failed");
            }
        }
        Err(e) => tracing::warn!(error = %e, "clipboard unavailable"),
    }
}

#[cfg(target_arch = "wasm32")]
pub fn copy_to_clipboard(text: &str) {
    if let Some(window) = web_sys::window() {
        let navigator = window.navigator();
        let clipboard = navigator.clipboard();
        let _ = clipboard.write_text(text);
    }
}

/// Activity log, newest line at the bottom. Error lines are tinted.
pub fn log_view(ui: &mut egui::Ui, logs: &[LogEntry]) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        egui::ScrollArea::vertical()
            .id_salt("activity_log")
            .max_height(260.0)
            .auto_shrink([false, true])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                if logs.is_empty() {
                    ui.label(egui::RichText::new("No activity yet").weak());
                }
                for line in logs {
                    let mut text = egui::RichText::new(line.as_str()).monospace();
                    if is_error_line(line) {
                        text = text.color(ERROR_RED);
                    }
                    ui.label(text);
                }
            });
    });
}

fn is_error_line(line: &LogEntry) -> bool {
    line.as_str().starts_with("Error:")
}

/// Footer line: network and build metadata.
pub fn footer_text(cluster: &str, endpoint: &str, git_hash: &str, build_time: &str) -> String {
    let short = git_hash.get(..7).unwrap_or(git_hash);
    format!("network: {cluster} ({endpoint}) · build {short} · {build_time}")
}
