use crate::artifact;
use crate::event::AppEvent;
use crate::executor::{ExecutionClient, ExecutionRequest};
use crate::lab::{LabKind, ALL_KINDS};
use crate::session::SessionRegistry;
use crate::workspace::drafts::{self, DraftSlot, DraftStore};
use crate::workspace::{self, Workspace};
use eframe::egui::{self, Color32, RichText, ScrollArea};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};

/// Authentication state supplied by the remote collaborator. While loading
/// the lab surface shows a splash; an unauthenticated state means the lab
/// session is not mounted at all.
#[derive(Debug, Clone, Copy)]
struct AuthState {
    loading: bool,
    authenticated: bool,
}

pub struct BitLabApp {
    rx: Receiver<AppEvent>,
    executor: ExecutionClient,
    drafts: Box<dyn DraftStore>,
    auth: AuthState,
    active_kind: LabKind,
    workspace: Workspace,
    sessions: SessionRegistry,
    export_notice: Option<String>,
}

impl BitLabApp {
    pub fn new(
        rx: Receiver<AppEvent>,
        executor: ExecutionClient,
        mut drafts: Box<dyn DraftStore>,
    ) -> Self {
        let active_kind = LabKind::Verilog;
        let workspace = workspace::open_workspace(active_kind, drafts.as_mut());
        let mut sessions = SessionRegistry::default();
        sessions.open(active_kind);

        Self {
            rx,
            executor,
            drafts,
            auth: AuthState {
                loading: true,
                authenticated: false,
            },
            active_kind,
            workspace,
            sessions,
            export_notice: None,
        }
    }

    fn switch_kind(&mut self, kind: LabKind) {
        if kind == self.active_kind {
            return;
        }
        self.active_kind = kind;
        self.workspace = workspace::open_workspace(kind, self.drafts.as_mut());
        self.sessions.open(kind);
        self.export_notice = None;
    }

    /// Submission trigger shared by the Execute button and Ctrl+Enter. Both
    /// routes pass through the session's single-flight guard, so overlapping
    /// triggers while a request is outstanding do nothing.
    fn submit(&mut self) {
        let kind = self.active_kind;
        let Some(session) = self.sessions.get_mut(kind) else {
            return;
        };
        if !session.begin_submission(kind) {
            return;
        }
        self.executor
            .submit(kind, ExecutionRequest::from_workspace(&self.workspace));
    }

    fn drain_events(&mut self, ctx: &egui::Context) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply_event(event, ctx),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent, ctx: &egui::Context) {
        match event {
            AppEvent::AuthStatus { authenticated } => {
                self.auth = AuthState {
                    loading: false,
                    authenticated,
                };
                ctx.request_repaint();
            }
            AppEvent::AuthProbeFailed(message) => {
                log::warn!("auth probe failed: {message}");
                self.auth = AuthState {
                    loading: false,
                    authenticated: false,
                };
                ctx.request_repaint();
            }
            AppEvent::ExecutionFinished { kind, outcome } => {
                // Results route to the session of the kind that submitted
                // them, even if the user has switched workspaces meanwhile.
                if let Some(session) = self.sessions.get_mut(kind) {
                    session.apply_outcome(outcome);
                }
                ctx.request_repaint();
            }
        }
    }

    fn download_dir() -> PathBuf {
        drafts::home_dir().join("Downloads")
    }

    fn export_artifact(&mut self) {
        let Some(bytes) = self
            .sessions
            .get(self.active_kind)
            .and_then(|session| session.artifact.clone())
        else {
            return;
        };

        match artifact::export_as_file(&bytes, &Self::download_dir()) {
            Ok(path) => {
                self.export_notice = Some(format!("Saved {}", path.display()));
            }
            Err(err) => {
                log::warn!("artifact export failed: {err}");
                self.export_notice = Some(format!("Export failed: {err}"));
            }
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        let in_flight = self
            .sessions
            .get(self.active_kind)
            .is_some_and(|session| session.in_flight);

        let mut selected_kind: Option<LabKind> = None;
        let mut execute_clicked = false;

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("BitLab");
                ui.separator();
                for kind in ALL_KINDS {
                    if ui
                        .selectable_label(kind == self.active_kind, kind.title())
                        .clicked()
                    {
                        selected_kind = Some(kind);
                    }
                }
                ui.separator();
                ui.label(
                    RichText::new(format!("mode: {}", self.active_kind.editor_mode()))
                        .color(Color32::GRAY),
                );

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let label = if in_flight { "Processing" } else { "Execute Core" };
                    execute_clicked = ui
                        .add_enabled(!in_flight, egui::Button::new(label))
                        .clicked();
                    ui.label(RichText::new("Ctrl+Enter").color(Color32::DARK_GRAY));
                });
            });
        });

        if let Some(kind) = selected_kind {
            self.switch_kind(kind);
        }
        if execute_clicked {
            self.submit();
        }
    }

    fn render_editors(&mut self, ctx: &egui::Context) {
        let kind = self.active_kind;

        if kind.has_testbench() {
            egui::SidePanel::right("testbench_editor")
                .resizable(true)
                .default_width(420.0)
                .show(ctx, |ui| {
                    ui.label(RichText::new("Simulation Stimulus").color(Color32::GRAY));
                    ui.separator();
                    ScrollArea::vertical().id_salt("tb_editor").show(ui, |ui| {
                        let response = ui.add_sized(
                            ui.available_size(),
                            egui::TextEdit::multiline(&mut self.workspace.testbench_text)
                                .code_editor(),
                        );
                        if response.changed() {
                            let text = self.workspace.testbench_text.clone();
                            workspace::edit_slot(
                                &mut self.workspace,
                                self.drafts.as_mut(),
                                DraftSlot::Testbench,
                                &text,
                            );
                        }
                    });
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            let slot_title = if kind.has_testbench() {
                "Logic Workspace"
            } else {
                "Source Console"
            };
            ui.label(RichText::new(slot_title).color(Color32::GRAY));
            ui.separator();
            ScrollArea::vertical().id_salt("design_editor").show(ui, |ui| {
                let response = ui.add_sized(
                    ui.available_size(),
                    egui::TextEdit::multiline(&mut self.workspace.design_text).code_editor(),
                );
                if response.changed() {
                    let text = self.workspace.design_text.clone();
                    workspace::edit_slot(
                        &mut self.workspace,
                        self.drafts.as_mut(),
                        DraftSlot::Design,
                        &text,
                    );
                }
            });
        });
    }

    fn render_artifact_panel(&mut self, ctx: &egui::Context) {
        let (panel_open, artifact_len) = match self.sessions.get(self.active_kind) {
            Some(session) => (
                session.artifact_panel_open,
                session.artifact.as_ref().map(Vec::len),
            ),
            None => (false, None),
        };
        if !panel_open {
            return;
        }

        let mut download_clicked = false;
        let mut close_clicked = false;

        egui::TopBottomPanel::bottom("artifact_panel")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.strong("Waveform Parse Result");
                    match artifact_len {
                        Some(len) => {
                            ui.label(format!("{len} bytes"));
                            download_clicked = ui.button("Download VCD").clicked();
                        }
                        None => {
                            ui.label("No artifact captured");
                        }
                    }
                    if let Some(notice) = &self.export_notice {
                        ui.label(RichText::new(notice).color(Color32::LIGHT_GREEN));
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        close_clicked = ui.button("Close").clicked();
                    });
                });
            });

        if download_clicked {
            self.export_artifact();
        }
        if close_clicked {
            if let Some(session) = self.sessions.get_mut(self.active_kind) {
                session.toggle_artifact_panel();
            }
        }
    }

    fn render_console(&mut self, ctx: &egui::Context) {
        let Some(session) = self.sessions.get(self.active_kind) else {
            return;
        };
        let console_open = session.console_open;
        let in_flight = session.in_flight;

        let mut header_clicked = false;
        egui::TopBottomPanel::bottom("console_panel")
            .resizable(console_open)
            .default_height(if console_open { 220.0 } else { 28.0 })
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    header_clicked = ui
                        .selectable_label(console_open, "Console Stream")
                        .clicked();
                    if in_flight {
                        ui.label(RichText::new("Processing Logic Vectors...").color(Color32::YELLOW));
                    }
                });

                if console_open {
                    ui.separator();
                    ScrollArea::vertical()
                        .id_salt("console_log")
                        .stick_to_bottom(true)
                        .show(ui, |ui| {
                            let Some(session) = self.sessions.get(self.active_kind) else {
                                return;
                            };
                            for (index, line) in session.logs.iter().enumerate() {
                                ui.monospace(format!("{index:03}  {line}"));
                            }
                        });
                }
            });

        if header_clicked {
            if let Some(session) = self.sessions.get_mut(self.active_kind) {
                session.toggle_console();
            }
        }
    }

    fn render_gate(&self, ctx: &egui::Context, message: &str) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new(message).color(Color32::GRAY));
            });
        });
    }
}

impl eframe::App for BitLabApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events(ctx);

        if self.auth.loading {
            self.render_gate(ctx, "Contacting BitLab auth service...");
            return;
        }
        if !self.auth.authenticated {
            self.render_gate(ctx, "Not authenticated. Sign in from the BitLab portal.");
            return;
        }

        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::Enter)) {
            self.submit();
        }

        self.render_top_bar(ctx);
        self.render_artifact_panel(ctx);
        self.render_console(ctx);
        self.render_editors(ctx);
    }
}
