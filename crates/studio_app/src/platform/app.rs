use std::collections::BTreeSet;
use std::io::{self, Write};
use std::sync::mpsc;
use std::time::Duration;

use anyhow::Context;
use engine_logging::engine_info;
use studio_core::{
    update, AppState, Msg, PipelineSession, PipelineSnapshot, SessionId, StepId, StepStatus,
};
use studio_engine::EngineHandle;

use super::config::Settings;
use super::effects::EffectRunner;
use super::input::{spawn_stdin_reader, Command, HELP};
use super::ui::content::downloadable_newsletter;
use super::ui::render;

/// Render/tick interval; also bounds how long an engine event waits to be folded.
const TICK: Duration = Duration::from_millis(75);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Failed,
    Interrupted,
}

pub fn run_app(
    settings: Settings,
    initial_query: Option<String>,
    interactive: bool,
) -> anyhow::Result<RunOutcome> {
    let engine = EngineHandle::new(settings.stream.clone()).context("failed to start engine")?;
    let runner = EffectRunner::new(engine, settings.output_dir.clone(), settings.timestamped);
    let initial_query = initial_query.filter(|query| !query.trim().is_empty());
    let interactive = interactive || initial_query.is_none();
    let mut app = App::new(runner, io::stdout(), interactive);
    let (cmd_tx, cmd_rx) = mpsc::channel();
    if interactive {
        app.say(HELP)?;
        spawn_stdin_reader(cmd_tx);
    }
    if let Some(query) = initial_query {
        app.dispatch(Msg::QuerySubmitted(query))?;
    }

    'run: loop {
        while let Ok(command) = cmd_rx.try_recv() {
            if app.handle_command(command)? == Flow::Quit {
                break 'run;
            }
        }

        let msg = app.runner.next_msg(TICK).unwrap_or(Msg::Tick);
        app.dispatch(msg)?;

        if app.ready_to_exit() {
            break;
        }
    }

    let outcome = app.outcome();
    app.dispatch(Msg::Shutdown)?;
    engine_info!("Exiting with {:?}", outcome);
    Ok(outcome)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

struct App<W: Write> {
    state: AppState,
    runner: EffectRunner,
    presenter: Presenter,
    out: W,
    interactive: bool,
    input_closed: bool,
}

impl<W: Write> App<W> {
    fn new(runner: EffectRunner, out: W, interactive: bool) -> Self {
        Self {
            state: AppState::new(),
            runner,
            presenter: Presenter::default(),
            out,
            interactive,
            input_closed: false,
        }
    }

    fn handle_command(&mut self, command: Command) -> io::Result<Flow> {
        match command {
            Command::Dispatch(msg) => self.dispatch(msg)?,
            Command::Help => self.say(HELP)?,
            Command::Unknown(line) => self.say(&format!("Unknown command: {line}"))?,
            Command::EndOfInput => self.input_closed = true,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn dispatch(&mut self, msg: Msg) -> io::Result<()> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        self.state = state;
        self.runner.run(effects);

        if was_dirty {
            let view = self.state.view();
            let lines = self.presenter.present(&view);
            for line in lines {
                writeln!(self.out, "{line}")?;
            }
            if let Some(text) = self.presenter.take_newsletter_due(&view) {
                if let Some(path) = self.runner.save_newsletter(&text) {
                    writeln!(self.out, "Saved to {}", path.display())?;
                }
            }
            self.out.flush()?;
        }
        Ok(())
    }

    fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    /// Without more input to wait for, the loop ends once no session is streaming.
    fn ready_to_exit(&self) -> bool {
        let waiting_for_input = self.interactive && !self.input_closed;
        let streaming = self.state.session().is_some_and(PipelineSession::is_loading);
        !waiting_for_input && !streaming
    }

    fn outcome(&self) -> RunOutcome {
        let view = self.state.view();
        if view.error.is_some() {
            RunOutcome::Failed
        } else if view.completed {
            RunOutcome::Completed
        } else {
            RunOutcome::Interrupted
        }
    }
}

/// Tracks what has already been printed for the live session.
#[derive(Debug, Default)]
struct Presenter {
    session: Option<SessionId>,
    progress: String,
    selected: Option<StepId>,
    shown_finished: BTreeSet<StepId>,
    outcome_shown: bool,
    newsletter_saved: bool,
}

impl Presenter {
    fn present(&mut self, view: &PipelineSnapshot) -> Vec<String> {
        let mut lines = Vec::new();
        if view.session != self.session {
            *self = Presenter {
                session: view.session,
                ..Presenter::default()
            };
            lines.extend(render::query_banner(view));
        }

        let progress = render::progress_line(view);
        if progress != self.progress {
            lines.push(progress.clone());
            self.progress = progress;
        }

        if self.selected != Some(view.selected_step) && view.status(view.selected_step).has_started()
        {
            self.selected = Some(view.selected_step);
            if view.status(view.selected_step) == StepStatus::Process
                || self.shown_finished.contains(&view.selected_step)
            {
                lines.extend(render::step_section(view, view.selected_step));
            }
        }

        for step in StepId::ALL {
            if view.status(step) == StepStatus::Finish && self.shown_finished.insert(step) {
                lines.extend(render::step_section(view, step));
            }
        }

        if !view.loading && !self.outcome_shown {
            if let Some(outcome) = render::outcome(view) {
                self.outcome_shown = true;
                lines.push(outcome);
            }
        }
        lines
    }

    /// The newsletter text, once, after the session completes with one.
    fn take_newsletter_due(&mut self, view: &PipelineSnapshot) -> Option<String> {
        if !view.completed || self.newsletter_saved {
            return None;
        }
        let text = downloadable_newsletter(view.payload(StepId::Newsletter))?;
        self.newsletter_saved = true;
        Some(text)
    }
}
