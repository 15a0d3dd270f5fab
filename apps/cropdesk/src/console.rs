//! Terminal rendition of the workflow view.

use std::io::{self, BufRead, Write};

use client_core::{
    status::{is_actionable, presentation},
    CropCell, ManageAction, ManageView, NoticeLevel, Screen, StatusIcon, StatusPresentation, View,
};
use shared::domain::{truncate_filename, ImageRecord, ImageStatus};
use tracing::debug;

const LIST_NAME_CHARS: usize = 40;

fn glyph(icon: StatusIcon) -> &'static str {
    match icon {
        StatusIcon::Pending => "○",
        StatusIcon::Partial => "◐",
        StatusIcon::Done => "✓",
    }
}

pub struct ConsoleView {
    assume_yes: bool,
    show_list: bool,
}

impl ConsoleView {
    /// `assume_yes` answers every confirmation; `show_list` prints image list
    /// renders, which most commands don't need.
    pub fn new(assume_yes: bool, show_list: bool) -> Self {
        Self {
            assume_yes,
            show_list,
        }
    }
}

impl View for ConsoleView {
    fn render_image_list(&self, images: &[ImageRecord], unprocessed_only: bool) {
        if !self.show_list {
            return;
        }
        let shown: Vec<&ImageRecord> = images
            .iter()
            .filter(|image| !unprocessed_only || is_actionable(image, true))
            .collect();
        if shown.is_empty() {
            println!("(no images)");
            return;
        }
        for image in shown {
            println!(
                "{} {:<10} {}  [{}]",
                glyph(presentation(image.status).icon),
                image.status.as_str(),
                truncate_filename(image.display_name(), LIST_NAME_CHARS),
                image.identifier()
            );
        }
    }

    fn show_image(&self, image: &ImageRecord, stage: u8) {
        println!(
            "Now editing {} [{}] at stage {stage}",
            image.display_name(),
            image.identifier()
        );
    }

    fn show_screen(&self, screen: Screen) {
        if screen == Screen::NoImage {
            println!("No image selected.");
        }
    }

    fn update_stage(&self, stage: u8) {
        debug!(stage, "stage updated");
    }

    fn update_item_status(
        &self,
        identifier: &str,
        status: ImageStatus,
        presentation: StatusPresentation,
    ) {
        println!("{} {identifier}: {status}", glyph(presentation.icon));
    }

    fn set_sync_control(&self, syncing: bool) {
        if syncing {
            println!("Syncing...");
        }
    }

    fn set_action_busy(&self, identifier: &str, action: ManageAction, busy: bool) {
        debug!(identifier, ?action, busy, "manage action");
    }

    fn alert(&self, message: &str) {
        println!("{message}");
    }

    fn notify(&self, message: &str, level: NoticeLevel) {
        match level {
            NoticeLevel::Error => eprintln!("error: {message}"),
            NoticeLevel::Info | NoticeLevel::Success => println!("{message}"),
        }
    }

    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        print!("{prompt} [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }

    fn show_manage(&self, _open: bool) {}

    fn render_manage(&self, view: &ManageView) {
        match view {
            ManageView::Loading => debug!("loading manage data"),
            ManageView::Empty => println!("No processed images found"),
            ManageView::Error(message) => eprintln!("{message}"),
            ManageView::Table(rows) => {
                for row in rows {
                    let cell = |crop: Option<&CropCell>| match crop {
                        Some(cell) => format!("{}×{}", cell.width, cell.height),
                        None => "no crop".to_string(),
                    };
                    println!(
                        "{:<27} {:<13} portrait: {:<11} landscape: {:<11} [{}]",
                        row.short_name,
                        row.dimensions,
                        cell(row.portrait.as_ref()),
                        cell(row.landscape.as_ref()),
                        row.identifier
                    );
                }
            }
        }
    }

    fn remove_manage_row(&self, identifier: &str) {
        debug!(identifier, "manage row removed");
    }
}
