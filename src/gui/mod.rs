use egui::{Align2, Color32, RichText};

use crate::gui::state::{AppState, ConfirmAction};
use crate::APP_STATE;

pub mod state;

pub fn ui_main(ctx: &egui::Context) {
    ctx.set_visuals(egui::Visuals::light());

    let mut state = APP_STATE.lock().unwrap();
    if state.authenticated {
        polls_screen(ctx, &mut state);
    } else {
        login_screen(ctx, &mut state);
    }
}

fn login_screen(ctx: &egui::Context, state: &mut AppState) {
    status_bar(ctx, state);

    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(48.0);
            ui.heading("Poll Admin");
            ui.label("Sign in to manage your polls");
            ui.add_space(16.0);

            egui::Grid::new("login_grid").num_columns(2).show(ui, |ui| {
                ui.label("Server:");
                ui.text_edit_singleline(&mut state.server_address);
                ui.end_row();

                ui.label("Email:");
                ui.text_edit_singleline(&mut state.email);
                ui.end_row();

                ui.label("Password:");
                ui.add(egui::TextEdit::singleline(&mut state.password).password(true));
                ui.end_row();
            });

            if !state.login_error.is_empty() {
                ui.add_space(8.0);
                ui.colored_label(ERROR_RED, &state.login_error);
            }

            ui.add_space(12.0);
            if state.logging_in {
                ui.spinner();
            } else {
                let submitted = ui.button("Sign in").clicked()
                    || ui.input(|input| input.key_pressed(egui::Key::Enter));
                if submitted {
                    state.login();
                }
            }
        });
    });
}

fn polls_screen(ctx: &egui::Context, state: &mut AppState) {
    header(ctx, state);
    status_bar(ctx, state);

    egui::SidePanel::left("events_panel")
        .resizable(false)
        .default_width(300.0)
        .show(ctx, |ui| events_panel(ui, state));

    egui::CentralPanel::default().show(ctx, |ui| {
        stats_row(ui, state);
        ui.separator();
        votes_panel(ui, state);
    });

    create_modal(ctx, state);
    confirm_dialog(ctx, state);
}

fn header(ctx: &egui::Context, state: &mut AppState) {
    egui::TopBottomPanel::top("header").show(ctx, |ui| {
        egui::Frame::default()
            .outer_margin(egui::vec2(0.0, 4.0))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.with_layout(egui::Layout::left_to_right(egui::Align::Center), |ui| {
                        ui.heading("Poll Administration");
                    });

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Log out").clicked() {
                            state.logout();
                        }
                        if ui.button("New poll").clicked() {
                            state.open_create_modal();
                        }
                        if ui.button("Refresh").clicked() {
                            state.refresh();
                        }
                    });
                });
            });
    });
}

fn status_bar(ctx: &egui::Context, state: &AppState) {
    egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.with_layout(egui::Layout::left_to_right(egui::Align::Center), |ui| {
                match &state.user {
                    Some(user) => {
                        ui.label(format!("Signed in as {} ({})", user.email, user.role))
                    }
                    None => ui.label("Not signed in"),
                };
            });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(&state.status_message);
            });
        });
    });
}

fn events_panel(ui: &mut egui::Ui, state: &mut AppState) {
    ui.add_space(4.0);
    ui.horizontal(|ui| {
        ui.heading("Events");
        if state.loading_events {
            ui.spinner();
        }
    });
    ui.separator();

    if state.events.is_empty() && !state.loading_events {
        ui.label("No events yet. Create your first poll.");
        return;
    }

    let mut open: Option<String> = None;
    let mut delete: Option<String> = None;

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for event in &state.events {
                ui.group(|ui| {
                    ui.horizontal(|ui| {
                        ui.vertical(|ui| {
                            ui.label(RichText::new(&event.name).strong());
                            if event.vote_count == 1 {
                                ui.label("1 vote");
                            } else {
                                ui.label(format!("{} votes", event.vote_count));
                            }
                            if let Some(last_vote) = &event.last_vote {
                                ui.label(format!("Last vote: {}", format_timestamp(last_vote)));
                            }
                        });

                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Delete").clicked() {
                                delete = Some(event.name.clone());
                            }
                            if ui.button("Open").clicked() {
                                open = Some(event.id.clone());
                            }
                        });
                    });
                });
            }
        });

    if let Some(event_id) = open {
        state.select_event(&event_id);
    }
    if let Some(name) = delete {
        state.request_delete_event(name);
    }
}

fn stats_row(ui: &mut egui::Ui, state: &AppState) {
    let stats = &state.stats;
    ui.horizontal(|ui| {
        stat_card(ui, "Average rating", &stats.average_rating, BLUE);
        stat_card(ui, "Total votes", &stats.total_votes.to_string(), GRAY);
        stat_card(ui, "Positive", &stats.positive_count.to_string(), GREEN);
        stat_card(ui, "Neutral", &stats.neutral_count.to_string(), YELLOW);
        stat_card(ui, "Negative", &stats.negative_count.to_string(), ERROR_RED);
    });
}

fn stat_card(ui: &mut egui::Ui, title: &str, value: &str, color: Color32) {
    ui.group(|ui| {
        ui.vertical(|ui| {
            ui.label(title);
            ui.label(RichText::new(value).size(24.0).strong().color(color));
        });
    });
}

fn votes_panel(ui: &mut egui::Ui, state: &mut AppState) {
    let Some(selected) = state.selected_event.clone() else {
        ui.add_space(48.0);
        ui.vertical_centered(|ui| {
            ui.heading("Select a poll");
            ui.label("Pick a poll on the left to inspect its votes");
        });
        return;
    };

    let mut clear = false;
    ui.horizontal(|ui| {
        ui.heading(format!("Votes for \"{}\"", selected.name));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Show all events").clicked() {
                clear = true;
            }
        });
    });
    if clear {
        state.clear_selection();
        return;
    }

    if state.loading_votes {
        ui.add_space(24.0);
        ui.vertical_centered(|ui| ui.spinner());
        return;
    }
    if state.votes.is_empty() {
        ui.add_space(24.0);
        ui.label(format!("No votes for \"{}\" yet", selected.name));
        return;
    }

    let mut delete: Option<String> = None;

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            egui::Grid::new("votes_grid")
                .num_columns(6)
                .striped(true)
                .spacing(egui::vec2(24.0, 6.0))
                .show(ui, |ui| {
                    ui.label(RichText::new("Voter").strong());
                    ui.label(RichText::new("Phone").strong());
                    ui.label(RichText::new("Rating").strong());
                    ui.label(RichText::new("Feedback").strong());
                    ui.label(RichText::new("Date").strong());
                    ui.label("");
                    ui.end_row();

                    for vote in &state.votes {
                        ui.label(&vote.name);
                        ui.label(&vote.phone);
                        ui.label(
                            RichText::new(vote.rating.to_string())
                                .strong()
                                .color(rating_color(vote.rating)),
                        );
                        ui.label(vote.feedback.as_deref().unwrap_or("-"));
                        ui.label(format_timestamp(&vote.submitted_at));
                        if ui.button("Delete").clicked() {
                            delete = Some(vote.id.clone());
                        }
                        ui.end_row();
                    }
                });
        });

    if let Some(vote_id) = delete {
        state.request_delete_vote(vote_id);
    }
}

fn create_modal(ctx: &egui::Context, state: &mut AppState) {
    if !state.create_modal_open {
        return;
    }

    let mut submit = false;
    let mut close = false;
    egui::Window::new("Create a new poll")
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label("Event name:");
            ui.text_edit_singleline(&mut state.new_event_name);
            if !state.create_error.is_empty() {
                ui.colored_label(ERROR_RED, &state.create_error);
            }
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if state.creating {
                    ui.spinner();
                } else {
                    if ui.button("Create").clicked() {
                        submit = true;
                    }
                    if ui.button("Cancel").clicked() {
                        close = true;
                    }
                }
            });
        });

    if submit {
        state.create_event();
    }
    if close {
        state.create_modal_open = false;
    }
}

fn confirm_dialog(ctx: &egui::Context, state: &mut AppState) {
    let Some(action) = state.pending_confirm.clone() else {
        return;
    };
    let prompt = match &action {
        ConfirmAction::DeleteEvent { name } => {
            format!("Delete the poll \"{name}\" and all of its votes?")
        }
        ConfirmAction::DeleteVote { .. } => "Delete this vote?".to_owned(),
    };

    let mut confirm = false;
    let mut cancel = false;
    egui::Window::new("Confirm deletion")
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(prompt);
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Delete").clicked() {
                    confirm = true;
                }
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });
        });

    if confirm {
        state.confirm_pending();
    }
    if cancel {
        state.cancel_pending();
    }
}

const BLUE: Color32 = Color32::from_rgb(59, 130, 246);
const GRAY: Color32 = Color32::from_rgb(107, 114, 128);
const GREEN: Color32 = Color32::from_rgb(22, 163, 74);
const YELLOW: Color32 = Color32::from_rgb(202, 138, 4);
const ERROR_RED: Color32 = Color32::from_rgb(220, 38, 38);

fn rating_color(rating: i64) -> Color32 {
    if rating >= 8 {
        GREEN
    } else if rating >= 6 {
        BLUE
    } else if rating >= 4 {
        YELLOW
    } else {
        ERROR_RED
    }
}

fn format_timestamp(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|date| date.format("%d %b %Y %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_format_for_display() {
        assert_eq!(
            format_timestamp("2025-05-01T10:05:00Z"),
            "01 May 2025 10:05"
        );
    }

    #[test]
    fn unparseable_timestamps_fall_through_verbatim() {
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }
}
