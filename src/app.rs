use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::Rng;
use ratatui::layout::Rect;
use tracing::info;

use crate::engine::Engine;
use crate::input::KeyInput;
use crate::prompt::Problem;
use crate::runtime::TapEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Typing,
    Results,
}

/// What the event loop should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Redraw,
    Quit,
}

#[derive(Debug)]
pub struct App {
    pub engine: Engine,
    pub state: AppState,
    problems: Vec<Problem>,
    current: usize,
}

impl App {
    pub fn new(engine: Engine, problems: Vec<Problem>) -> Self {
        let current = problems
            .iter()
            .position(|p| p.id == engine.prompt().id())
            .unwrap_or(0);
        let mut app = Self {
            engine,
            state: AppState::Typing,
            problems,
            current,
        };
        app.sync_state();
        app
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn on_event(&mut self, event: TapEvent) -> Control {
        match event {
            TapEvent::Key(key) => self.on_key(key),
            TapEvent::Paste(text) => {
                if self.state == AppState::Typing {
                    self.engine.handle(KeyInput::Paste(text));
                }
                Control::Continue
            }
            TapEvent::Resize(width, height) => {
                self.resize(Rect::new(0, 0, width, height));
                Control::Redraw
            }
            TapEvent::Tick => {
                if self.engine.is_animating() {
                    Control::Redraw
                } else {
                    Control::Continue
                }
            }
        }
    }

    /// Fits the engine's prompt area to a terminal of size `area`.
    pub fn resize(&mut self, area: Rect) {
        let prompt = crate::ui::prompt_area(area);
        self.engine.resize(prompt.width, prompt.height);
    }

    fn on_key(&mut self, key: KeyEvent) -> Control {
        // ctrl+c quits from anywhere
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Control::Quit;
        }

        match self.state {
            AppState::Typing => {
                let input = KeyInput::from_key_event(key);
                if input == KeyInput::Ignored {
                    return Control::Continue;
                }
                let transition = self.engine.handle(input);
                let before = self.state;
                self.sync_state();
                // e.g. backspace at the start: nothing to repaint
                let changed = transition.changed(self.engine.prompt().len());
                if changed.is_empty() && self.state == before {
                    return Control::Continue;
                }
            }
            AppState::Results => match key.code {
                KeyCode::Char('r') => {
                    self.engine.reset();
                    self.sync_state();
                }
                KeyCode::Char('n') => self.next_problem(),
                KeyCode::Esc | KeyCode::Char('q') => return Control::Quit,
                _ => return Control::Continue,
            },
        }
        Control::Redraw
    }

    /// Switches to a different problem, chosen at random.
    pub fn next_problem(&mut self) {
        if self.problems.is_empty() {
            return;
        }
        let mut next = self.current;
        if self.problems.len() > 1 {
            let mut rng = rand::thread_rng();
            while next == self.current {
                next = rng.gen_range(0..self.problems.len());
            }
        }
        self.select(next);
    }

    pub fn select(&mut self, index: usize) {
        let Some(problem) = self.problems.get(index) else {
            return;
        };
        info!(problem = %problem.id, "problem selected");
        self.current = index;
        self.engine.load_problem(problem);
        self.sync_state();
    }

    fn sync_state(&mut self) {
        self.state = if self.engine.is_finished() {
            AppState::Results
        } else {
            AppState::Typing
        };
    }
}
